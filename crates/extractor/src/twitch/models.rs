#![allow(unused)]
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwitchResponse {
    pub data: Data,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Data {
    pub user_or_error: Option<UserOrError>,
    pub user: Option<User>,
    pub video: Option<Video>,
}

// From the ChannelShell query
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOrError {
    pub id: Option<String>,
    pub login: Option<String>,
    pub display_name: Option<String>,
    #[serde(rename = "__typename")]
    pub typename: String,
}

// From the StreamMetadata and FilterableVideoTower_Videos queries
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Option<String>,
    #[serde(rename = "profileImageURL")]
    pub profile_image_url: Option<String>,
    pub last_broadcast: Option<LastBroadcast>,
    pub stream: Option<Stream>,
    pub videos: Option<VideoConnection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stream {
    pub id: String,
    pub viewers_count: Option<u64>,
    #[serde(rename = "type")]
    pub stream_type: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastBroadcast {
    pub id: Option<String>,
    pub title: Option<String>,
}

// From the VideoMetadata query and video tower nodes
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub title: Option<String>,
    pub published_at: Option<String>,
    pub length_seconds: Option<u64>,
    pub view_count: Option<u64>,
    pub owner: Option<VideoOwner>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoOwner {
    pub login: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoConnection {
    pub edges: Vec<VideoEdge>,
    pub page_info: Option<PageInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoEdge {
    pub cursor: Option<String>,
    pub node: Video,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_stream_metadata() {
        let body = r#"{
            "data": {
                "user": {
                    "id": "12345",
                    "profileImageURL": "https://static.example/avatar.png",
                    "lastBroadcast": {"id": "b1", "title": "Speedrun night"},
                    "stream": {
                        "id": "s1",
                        "viewersCount": 420,
                        "type": "live",
                        "createdAt": "2021-03-01T20:00:00Z"
                    }
                }
            }
        }"#;

        let response: TwitchResponse = serde_json::from_str(body).unwrap();
        let user = response.data.user.unwrap();
        let stream = user.stream.unwrap();
        assert_eq!(stream.stream_type.as_deref(), Some("live"));
        assert_eq!(stream.viewers_count, Some(420));
        assert_eq!(
            user.last_broadcast.unwrap().title.as_deref(),
            Some("Speedrun night")
        );
    }

    #[test]
    fn test_deserialize_video_tower() {
        let body = r#"{
            "data": {
                "user": {
                    "videos": {
                        "edges": [
                            {
                                "cursor": "opaque",
                                "node": {
                                    "id": "v100",
                                    "title": "First vod",
                                    "publishedAt": "2021-02-28T10:00:00Z",
                                    "lengthSeconds": 3600,
                                    "viewCount": 99,
                                    "owner": {"login": "chan", "displayName": "Chan"}
                                }
                            }
                        ],
                        "pageInfo": {"hasNextPage": false}
                    }
                }
            }
        }"#;

        let response: TwitchResponse = serde_json::from_str(body).unwrap();
        let videos = response.data.user.unwrap().videos.unwrap();
        assert_eq!(videos.edges.len(), 1);
        assert_eq!(videos.edges[0].node.id, "v100");
        assert!(!videos.page_info.unwrap().has_next_page);
    }
}
