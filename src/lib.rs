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

//! # Firecam Storage
//!
//! Storage access layer for the wildfire-camera image pipeline.
//!
//! Firecam Storage gives one way to reach camera images, labels and settings
//! wherever they live: a remote object store addressed as `gs://bucket/key`,
//! a Drive-style collaboration backend addressed by folder and file IDs, or
//! the local filesystem.
//!
//! ## Features
//!
//! - **Unified paths**: `gs://` paths go to the object store, anything else is local
//! - **Object storage**: GCS, AWS S3, a local directory or memory, through `object_store`
//! - **Collaboration folders**: paginated search, uniqueness-checked lookups, uploads
//! - **Resilience**: every remote call is retried 5 times with a fixed 5 s delay
//! - **Tree sync**: resumable recursive download of a remote directory
//! - **Messaging**: JSON events published on a configured topic
//!
//! ## Quick Start
//!
//! ### Local Filesystem Example
//!
//! ```rust,no_run
//! use firecam_storage::{StorageConfig, StorageProviderFactory, TreeSync};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! // Containers are sub-directories of the configured path
//! let config = StorageConfig::local()
//!     .with_option("path", "./data");
//! let provider = StorageProviderFactory::from_config(config).await?;
//!
//! // Mirror ./data/fire-images/cams/cam-a into /tmp/cam-a
//! let report = TreeSync::new(provider)
//!     .download_tree("fire-images", "cams/cam-a", Path::new("/tmp/cam-a"))
//!     .await?;
//! println!("{}", report);
//! # Ok(())
//! # }
//! ```
//!
//! ### Settings-driven Example
//!
//! ```rust,no_run
//! use firecam_storage::{ServiceContext, Settings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! // Reads the JSON file named by OCT_FIRE_SETTINGS
//! let context = ServiceContext::new(Settings::from_env()?);
//!
//! let io = context.unified_io().await?;
//! let copied = io
//!     .copy_local_file_to("/tmp/cam-a_2019-06-01.jpg", "gs://fire-images/archive")
//!     .await?;
//!
//! context
//!     .topic_publisher()
//!     .await?
//!     .publish_json(&serde_json::json!({"archived": copied}))
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`storage`] - Object storage abstraction layer and remote path notation
//! - [`drive`] - Collaboration backend access
//! - [`io`] - Path-based access across remote and local files
//! - [`sync`] - Recursive directory download
//! - [`messaging`] - Topic publishing
//! - [`settings`] - Settings file loading
//! - [`context`] - Lazily created service handles
//! - [`util`] - Retry and pagination helpers

pub mod context;
pub mod drive;
pub mod io;
pub mod messaging;
pub mod settings;
pub mod storage;
pub mod sync;
pub mod util;

// Re-export commonly used types
pub use context::ServiceContext;
pub use drive::DriveStore;
pub use io::UnifiedIo;
pub use settings::Settings;
pub use storage::{StorageConfig, StorageError, StorageProvider, StorageProviderFactory, StorageResult};
pub use sync::{SyncReport, TreeSync};
pub use util::RetryPolicy;
