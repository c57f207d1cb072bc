// Copyright 2025 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.
//
// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

use firecam_storage::storage::{RemotePath, StorageError};
use firecam_storage::{ServiceContext, Settings};

/// Access helpers for wildfire-camera files on the object store and locally
#[derive(Parser)]
#[command(name = "firecam-storage")]
#[command(author, version, long_about = None)]
struct Cli {
    /// Settings file; defaults to the path in OCT_FIRE_SETTINGS
    #[arg(long, global = true, env = "OCT_FIRE_SETTINGS")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a remote (gs://) or local text file
    Cat { path: String },

    /// Copy a local file into a remote (gs://) or local directory
    Copy { src: String, dest_dir: String },

    /// Mirror a remote directory (gs://bucket/dir) into a local directory
    DownloadTree {
        remote_dir: String,
        local_dir: PathBuf,

        /// Files of one directory fetched concurrently
        #[arg(long, default_value_t = 1)]
        parallelism: usize,
    },

    /// Publish a JSON document on the configured topic
    Publish { json: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = match &cli.settings {
        Some(path) => Settings::from_file(&path.to_string_lossy())?,
        None => Settings::default(),
    };
    let context = ServiceContext::new(settings);
    let start = Instant::now();

    match cli.command {
        Commands::Cat { path } => {
            let text = context.unified_io().await?.read_text(&path).await?;
            print!("{}", text);
        }
        Commands::Copy { src, dest_dir } => {
            let copied = context
                .unified_io()
                .await?
                .copy_local_file_to(&src, &dest_dir)
                .await?;
            println!("{}", copied);
        }
        Commands::DownloadTree {
            remote_dir,
            local_dir,
            parallelism,
        } => {
            let remote = RemotePath::parse(&remote_dir).ok_or_else(|| {
                StorageError::InvalidPath(format!("Expected gs://bucket/dir, got {}", remote_dir))
            })?;
            let report = context
                .tree_sync()
                .await?
                .with_parallelism(parallelism)
                .download_tree(&remote.container, &remote.name, &local_dir)
                .await?;
            println!("{}", report);
        }
        Commands::Publish { json } => {
            let value: serde_json::Value = serde_json::from_str(&json)?;
            match context.topic_publisher().await?.publish_json(&value).await? {
                Some(message_id) => println!("{}", message_id),
                None => info!("No topic configured, nothing published"),
            }
        }
    }

    info!("Done in duration_ms={}", start.elapsed().as_millis());
    Ok(())
}
