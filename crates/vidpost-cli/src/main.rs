//! vidpost: watch a directory and publish every new video to the content service.
//!
//! Requires FLIC_API_URL and FLIC_TOKEN (environment or `.env`). VIDEOS_DIR
//! defaults to `./videos`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use vidpost_api_client::ApiClient;
use vidpost_cli::{digest_line, init_tracing};
use vidpost_core::{ContentHasher, IngestConfig, LogFormat};
use vidpost_worker::{IngestOutcome, IngestionWorkflow, ProcessSupervisor};

#[derive(Parser)]
#[command(name = "vidpost", about = "Publish new videos from a watched directory")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the videos directory and ingest every new .mp4 file (default)
    Watch {
        /// Directory to watch, overrides VIDEOS_DIR
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Ingest one file right away: upload, create the post, delete it
    Ingest {
        /// Path to the video file
        file: PathBuf,
    },
    /// Print the SHA-256 digest of a file
    Hash {
        /// Path to the file
        file: PathBuf,
    },
}

fn build_workflow(config: &IngestConfig) -> anyhow::Result<IngestionWorkflow> {
    let client = ApiClient::from_config(config)?;
    Ok(IngestionWorkflow::new(Arc::new(client)).with_local_digest(config.log_local_digest))
}

fn load_config() -> anyhow::Result<IngestConfig> {
    IngestConfig::from_env()
        .context("Invalid configuration. Set FLIC_API_URL and FLIC_TOKEN (environment or .env)")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Watch { dir: None }) {
        Commands::Watch { dir } => {
            let config = load_config()?;
            init_tracing(config.log_format);

            let videos_dir = dir.unwrap_or_else(|| config.videos_dir.clone());
            let supervisor = ProcessSupervisor::new(videos_dir, build_workflow(&config)?);
            let stats = supervisor.start()?.run().await;
            tracing::info!(
                completed = stats.completed,
                failed = stats.failed,
                "vidpost stopped"
            );
        }
        Commands::Ingest { file } => {
            let config = load_config()?;
            init_tracing(config.log_format);

            if !file.is_file() {
                anyhow::bail!("Not a file: {}", file.display());
            }
            match build_workflow(&config)?.run(file).await {
                IngestOutcome::Completed { path, post_id } => {
                    let out = serde_json::json!({
                        "path": path.display().to_string(),
                        "status": "completed",
                        "post_id": post_id,
                    });
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&out).context("Serialize result")?
                    );
                }
                IngestOutcome::Failed {
                    path,
                    failed_in,
                    error,
                } => {
                    return Err(anyhow::Error::new(error)
                        .context(format!("Ingestion of {} failed after {}", path.display(), failed_in)));
                }
            }
        }
        Commands::Hash { file } => {
            init_tracing(LogFormat::Text);
            let digest = tokio::task::spawn_blocking({
                let file = file.clone();
                move || ContentHasher::new().digest_file(&file)
            })
            .await
            .context("Hash task failed")?
            .with_context(|| format!("Failed to read {}", file.display()))?;
            println!("{}", digest_line(&digest, &file));
        }
    }

    Ok(())
}
