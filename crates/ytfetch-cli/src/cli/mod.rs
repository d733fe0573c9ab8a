//! CLI for the ytfetch download client.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use ytfetch_core::config::{self, ClientConfig};

use commands::{run_download, run_health, run_info, run_thumbnail};

/// Top-level CLI. Without a subcommand it downloads `URL` to `OUTPUT.mp4`.
#[derive(Debug, Parser)]
#[command(name = "ytfetch")]
#[command(about = "Request a media download from the download service and save it atomically", long_about = None)]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
#[command(after_help = "Environment variables:\n  YT_DLP_SERVER_URL - Server URL (default: http://localhost:8080)")]
pub struct Cli {
    #[command(flatten)]
    pub download: DownloadArgs,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// Video page URL to hand to the service.
    #[arg(required = true)]
    pub url: Option<String>,

    /// Output base name; the file is written as OUTPUT.mp4.
    #[arg(default_value = "video")]
    pub output: PathBuf,

    /// Server-side processing mode (progressive or best).
    #[arg(default_value = "progressive")]
    pub mode: String,

    /// Print the SHA-256 of the downloaded bytes.
    #[arg(long)]
    pub sha256: bool,

    /// Delete the .part file if the download fails.
    #[arg(long)]
    pub cleanup_on_failure: bool,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Print video metadata as JSON.
    Info {
        /// Video page URL.
        url: String,
        /// Keep the (large) formats list in the output.
        #[arg(long)]
        include_formats: bool,
    },

    /// Download the video thumbnail.
    Thumbnail {
        /// Video page URL.
        url: String,
        /// Output base name; the extension follows the image type.
        #[arg(default_value = "thumbnail")]
        output: PathBuf,
    },

    /// Check that the service is reachable.
    Health,
}

/// Config file + environment, in that order of precedence (environment wins).
fn load_config() -> Result<ClientConfig> {
    let cfg = config::load_or_init()?.with_env_overrides(|k| std::env::var(k).ok());
    cfg.validate()?;
    tracing::debug!("loaded config: {:?}", cfg);
    Ok(cfg)
}

impl Cli {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            Some(CliCommand::Info {
                url,
                include_formats,
            }) => run_info(load_config()?, url, include_formats).await?,
            Some(CliCommand::Thumbnail { url, output }) => {
                run_thumbnail(load_config()?, url, output).await?
            }
            Some(CliCommand::Health) => run_health(load_config()?).await?,
            None => run_download(load_config()?, cli.download).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
