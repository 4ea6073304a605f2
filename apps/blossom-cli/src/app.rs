//! Command dispatch.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use blossom_client::{
    BlobDescriptor, BlossomClient, ChannelObserver, UploadEndpoint, UploadProgress, cancellable,
};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "blossom", version)]
#[command(about = "Upload and mirror blobs on a Blossom server", long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Server base URL, overriding the configuration
    #[arg(short = 's', long = "server", value_name = "URL", global = true)]
    pub server: Option<String>,

    /// Authorization header value, overriding the configuration
    #[arg(
        short = 'a',
        long = "auth",
        env = "BLOSSOM_AUTH",
        hide_env_values = true,
        global = true
    )]
    pub auth: Option<String>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Ask the server whether it would accept a file
    Check {
        file: PathBuf,
        /// Target /media instead of /upload
        #[arg(long)]
        media: bool,
    },
    /// Upload a file
    Upload {
        file: PathBuf,
        /// Target /media instead of /upload
        #[arg(long)]
        media: bool,
        /// Skip the HEAD precheck
        #[arg(long)]
        no_check: bool,
    },
    /// Ask the server to copy a blob from another URL
    Mirror { url: String },
}

fn endpoint(media: bool) -> UploadEndpoint {
    if media {
        UploadEndpoint::Media
    } else {
        UploadEndpoint::Upload
    }
}

/// Applies command-line overrides on top of the loaded configuration.
fn apply_overrides(mut config: Config, cli: &Cli) -> Config {
    if let Some(server) = &cli.server {
        config.client.base_url = server.clone();
    }
    if let Some(auth) = &cli.auth {
        config.authorization = Some(auth.clone());
    }
    config
}

/// Runs one command to completion or until Ctrl-C.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = apply_overrides(Config::load(cli.config.as_deref())?, &cli);
    let client =
        BlossomClient::from_config(&config.client).context("invalid client configuration")?;
    let auth = config
        .authorization
        .context("no authorization value: pass --auth or set BLOSSOM_AUTH")?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, cancelling");
                cancel.cancel();
            }
        }
    });

    match cli.command {
        Command::Check { file, media } => {
            let endpoint = endpoint(media);
            let metadata = blossom_transfer::file_metadata(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            cancellable(&cancel, client.precheck(endpoint, &auth, &metadata)).await?;
            info!(file = %file.display(), endpoint = %endpoint, "server accepts file");
        }
        Command::Upload {
            file,
            media,
            no_check,
        } => {
            let endpoint = endpoint(media);
            let (observer, rx) = ChannelObserver::channel(16);
            let done = CancellationToken::new();
            let reporter = tokio::spawn(log_progress(rx, done.clone()));

            let result = cancellable(
                &cancel,
                client.upload_file(endpoint, &auth, &file, !no_check, Some(Arc::new(observer))),
            )
            .await;
            done.cancel();
            let _ = reporter.await;

            print_descriptor(&result?)?;
        }
        Command::Mirror { url } => {
            let descriptor = cancellable(&cancel, client.put_mirror(&auth, &url)).await?;
            print_descriptor(&descriptor)?;
        }
    }

    Ok(())
}

/// Logs snapshots until the channel closes or `done` fires, then logs
/// whatever is still queued. Returns the number of lines logged.
async fn log_progress(mut rx: mpsc::Receiver<UploadProgress>, done: CancellationToken) -> usize {
    let mut logged = 0;
    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Some(progress) => {
                    log_snapshot(progress);
                    logged += 1;
                }
                None => return logged,
            },
            _ = done.cancelled() => break,
        }
    }
    while let Ok(progress) = rx.try_recv() {
        log_snapshot(progress);
        logged += 1;
    }
    logged
}

fn log_snapshot(progress: UploadProgress) {
    info!(
        percent = (progress.fraction() * 100.0).round() as u64,
        transferred = progress.bytes_transferred,
        total = progress.total_bytes,
        "uploading"
    );
}

fn print_descriptor(descriptor: &BlobDescriptor) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(descriptor)?);
    Ok(())
}
