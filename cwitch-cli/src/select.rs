//! Free-form selection input: parsing, validation and playlist assembly.
//!
//! One line of input names the displayed items to watch by their 1-based
//! index, whitespace separated, with an optional `x[n]` token asking for more
//! items to be listed. Parsing is all-or-nothing per line; the interactive
//! front end re-prompts on any validation failure.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// The items currently shown to the user, keyed by 1-based display index.
///
/// Rebuilt fresh for every listing screen and discarded after the
/// corresponding selection has been resolved.
#[derive(Debug, Clone, Default)]
pub struct DisplaySet {
    titles: BTreeMap<usize, String>,
}

impl DisplaySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, index: usize, title: impl Into<String>) {
        self.titles.insert(index, title.into());
    }

    pub fn contains(&self, index: usize) -> bool {
        self.titles.contains_key(&index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.titles.iter().map(|(i, t)| (*i, t.as_str()))
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.titles.keys().copied()
    }
}

/// Parsed, validated representation of what the user chose.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub chosen_indices: BTreeSet<usize>,
    pub show_extra: bool,
    pub extra_count: Option<usize>,
}

impl Selection {
    /// How many extra items the user asked to have listed, if any.
    pub fn extra_request(&self, default_count: usize) -> Option<usize> {
        self.show_extra
            .then(|| self.extra_count.unwrap_or(default_count))
    }

    /// Chosen indices as sorted ascending digit tokens joined by spaces.
    /// Reparsing this line against the same display set yields an equal set.
    pub fn to_input_line(&self) -> String {
        self.chosen_indices
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionErrorKind {
    /// A character that is neither a digit, whitespace, nor a well-placed `x`.
    InvalidCharacter { ch: char },
    /// A syntactically valid index that is not on the current screen.
    UnknownIndex { index: usize },
    /// An explicit `x[n]` count too large to represent.
    ExtraCountOutOfRange,
}

/// Validation failure for one input line, with enough position context to
/// place a cursor when re-prompting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionError {
    pub kind: SelectionErrorKind,
    pub token: String,
    /// Byte offset into the raw input line.
    pub position: usize,
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SelectionErrorKind::InvalidCharacter { ch } => write!(
                f,
                "input contains a not allowed character {:?} at position {}",
                ch, self.position
            ),
            SelectionErrorKind::UnknownIndex { .. } => {
                write!(f, "media number {} does not exist", self.token)
            }
            SelectionErrorKind::ExtraCountOutOfRange => {
                write!(f, "extra count in {} is out of range", self.token)
            }
        }
    }
}

impl std::error::Error for SelectionError {}

/// Parse one line of selection input against the currently displayed items.
///
/// Token grammar: a run of digits (a display index) or `x` optionally
/// followed by digits (request for more items). An empty line yields an
/// empty selection. When several `x` tokens are present the last one is
/// authoritative, including its count; this precedence is inherited
/// behavior, not a guarantee worth relying on.
pub fn parse_selection(input: &str, display: &DisplaySet) -> Result<Selection, SelectionError> {
    let mut selection = Selection::default();
    let base = input.as_ptr() as usize;

    for token in input.split_whitespace() {
        // split_whitespace yields subslices of `input`, so the byte offset
        // of each token falls out of pointer arithmetic.
        let token_pos = token.as_ptr() as usize - base;

        if let Some(rest) = token.strip_prefix('x') {
            if let Some((offset, ch)) = rest.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
                return Err(SelectionError {
                    kind: SelectionErrorKind::InvalidCharacter { ch },
                    token: token.to_string(),
                    position: token_pos + 1 + offset,
                });
            }
            selection.show_extra = true;
            selection.extra_count = if rest.is_empty() {
                None
            } else {
                // An explicit count the user typed is never reinterpreted
                // as the default page size.
                match rest.parse() {
                    Ok(count) => Some(count),
                    Err(_) => {
                        return Err(SelectionError {
                            kind: SelectionErrorKind::ExtraCountOutOfRange,
                            token: token.to_string(),
                            position: token_pos,
                        });
                    }
                }
            };
            continue;
        }

        if let Some((offset, ch)) = token.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
            return Err(SelectionError {
                kind: SelectionErrorKind::InvalidCharacter { ch },
                token: token.to_string(),
                position: token_pos + offset,
            });
        }

        let index: usize = token.parse().unwrap_or(usize::MAX);
        if !display.contains(index) {
            return Err(SelectionError {
                kind: SelectionErrorKind::UnknownIndex { index },
                token: token.to_string(),
                position: token_pos,
            });
        }

        selection.chosen_indices.insert(index);
    }

    Ok(selection)
}

/// Filter candidates down to the chosen ones, preserving source order.
///
/// The 1-based position of each candidate in the slice is matched against
/// the selection; the order indices were typed in is deliberately ignored.
pub fn build_playlist<T: Clone>(candidates: &[T], selection: &Selection) -> Vec<T> {
    candidates
        .iter()
        .enumerate()
        .filter(|(i, _)| selection.chosen_indices.contains(&(i + 1)))
        .map(|(_, item)| item.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display(n: usize) -> DisplaySet {
        let mut set = DisplaySet::new();
        for i in 1..=n {
            set.insert(i, format!("title {i}"));
        }
        set
    }

    #[test]
    fn test_parse_plain_indices() {
        let selection = parse_selection("1 3 2", &display(3)).unwrap();
        assert_eq!(
            selection.chosen_indices,
            BTreeSet::from([1, 2, 3])
        );
        assert!(!selection.show_extra);
        assert_eq!(selection.extra_count, None);
    }

    #[test]
    fn test_parse_empty_line() {
        let selection = parse_selection("", &display(3)).unwrap();
        assert!(selection.chosen_indices.is_empty());
        assert!(!selection.show_extra);
    }

    #[test]
    fn test_parse_bare_extra_token() {
        let selection = parse_selection("x", &display(3)).unwrap();
        assert!(selection.show_extra);
        assert_eq!(selection.extra_count, None);
    }

    #[test]
    fn test_parse_extra_token_with_count() {
        let selection = parse_selection("1 x13", &display(3)).unwrap();
        assert_eq!(selection.chosen_indices, BTreeSet::from([1]));
        assert!(selection.show_extra);
        assert_eq!(selection.extra_count, Some(13));
    }

    #[test]
    fn test_last_extra_token_wins() {
        let selection = parse_selection("x2 1 x7", &display(3)).unwrap();
        assert_eq!(selection.extra_count, Some(7));

        // A trailing bare `x` also overrides an earlier explicit count.
        let selection = parse_selection("x2 x", &display(3)).unwrap();
        assert!(selection.show_extra);
        assert_eq!(selection.extra_count, None);
    }

    #[test]
    fn test_overflowing_extra_count_rejected() {
        let err = parse_selection("1 x99999999999999999999", &display(3)).unwrap_err();
        assert_eq!(err.kind, SelectionErrorKind::ExtraCountOutOfRange);
        assert_eq!(err.token, "x99999999999999999999");
        assert_eq!(err.position, 2);
    }

    #[test]
    fn test_invalid_character_position() {
        let err = parse_selection("1 2q 3", &display(3)).unwrap_err();
        assert_eq!(err.kind, SelectionErrorKind::InvalidCharacter { ch: 'q' });
        assert_eq!(err.position, 3);
        assert_eq!(err.token, "2q");
    }

    #[test]
    fn test_invalid_character_inside_extra_token() {
        let err = parse_selection("x1a", &display(3)).unwrap_err();
        assert_eq!(err.kind, SelectionErrorKind::InvalidCharacter { ch: 'a' });
        assert_eq!(err.position, 2);
    }

    #[test]
    fn test_misplaced_x_is_invalid() {
        let err = parse_selection("1x", &display(3)).unwrap_err();
        assert_eq!(err.kind, SelectionErrorKind::InvalidCharacter { ch: 'x' });
        assert_eq!(err.position, 1);
    }

    #[test]
    fn test_unknown_index() {
        let err = parse_selection("1 7", &display(3)).unwrap_err();
        assert_eq!(err.kind, SelectionErrorKind::UnknownIndex { index: 7 });
        assert_eq!(err.position, 2);
        assert_eq!(err.token, "7");
    }

    #[test]
    fn test_rejection_is_all_or_nothing() {
        // The valid tokens before the bad one are not kept anywhere;
        // the whole line is rejected.
        assert!(parse_selection("1 2 99", &display(3)).is_err());
    }

    #[test]
    fn test_playlist_follows_source_order() {
        let candidates = vec!["v1", "v2", "v3"];
        let selection = parse_selection("3 1", &display(3)).unwrap();
        assert_eq!(build_playlist(&candidates, &selection), vec!["v1", "v3"]);
    }

    #[test]
    fn test_empty_selection_builds_empty_playlist() {
        let candidates = vec!["v1", "v2"];
        let selection = Selection::default();
        assert!(build_playlist(&candidates, &selection).is_empty());
    }

    #[test]
    fn test_extra_request_default() {
        let selection = parse_selection("x", &display(1)).unwrap();
        assert_eq!(selection.extra_request(5), Some(5));

        let selection = parse_selection("x3", &display(1)).unwrap();
        assert_eq!(selection.extra_request(5), Some(3));

        let selection = parse_selection("1", &display(1)).unwrap();
        assert_eq!(selection.extra_request(5), None);
    }

    #[test]
    fn test_selection_round_trip() {
        let set = display(9);
        let selection = parse_selection("7 2 5", &set).unwrap();
        let line = selection.to_input_line();
        assert_eq!(line, "2 5 7");

        let reparsed = parse_selection(&line, &set).unwrap();
        assert_eq!(reparsed.chosen_indices, selection.chosen_indices);
    }
}
