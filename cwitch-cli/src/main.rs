mod cli;
mod commands;
mod config;
mod error;
mod output;
mod player;
mod prompt;
mod quality;
mod select;

use crate::{
    cli::{Cli, Command},
    commands::CommandExecutor,
    config::AppConfig,
    error::{CliError, Result},
};
use clap::Parser;
use colored::*;
use std::process;
use tracing::{Level, debug, error};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};
use twitch_extractor::ProxyConfig;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        match e {
            CliError::UserCancelled => {
                // Ctrl-C / Esc at a prompt is a quiet exit.
                process::exit(1);
            }
            e => {
                error!("Application error: {}", e);
                eprintln!("{} {}", "Error:".red().bold(), e);
                process::exit(1);
            }
        }
    }
}

async fn run() -> Result<()> {
    let args = Cli::parse();

    init_logging(args.verbose);

    let config = AppConfig::load(args.config_file.as_deref())?;
    debug!("loaded config: {:?}", config);

    let proxy = args.proxy.map(|url| ProxyConfig {
        url,
        username: args.proxy_username,
        password: args.proxy_password,
    });

    let executor = CommandExecutor::new(config, args.verbose, proxy);

    match args.command {
        Command::Channel {
            channels_ids,
            action,
            quality,
            max_list_length,
            filter,
            sort,
        } => {
            executor
                .channel(
                    channels_ids,
                    action,
                    quality,
                    max_list_length,
                    filter.into(),
                    sort.into(),
                )
                .await?;
        }

        Command::Following {
            online,
            channels_file,
            quality,
        } => {
            executor
                .following(online, channels_file.as_deref(), quality)
                .await?;
        }

        Command::Videos {
            videos_ids,
            quality,
        } => {
            executor.videos(videos_ids, quality).await?;
        }

        Command::Completions { shell } => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(log_filter(verbose))
        .init();
}

fn log_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_levels() {
        assert_eq!(log_filter(true).to_string(), "debug");
        // Without -v the baseline is info, RUST_LOG can still raise it.
        assert!(log_filter(false).to_string().contains("info"));
    }
}
