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

//! Object storage abstraction layer
//!
//! This module provides a unified interface over the remote object store
//! (GCS, AWS S3) and its local stand-ins (a directory tree, or memory).
//!
//! The implementation leverages the `object_store` crate's builders, so every
//! backend is served by the same provider and the same retry policy.

pub mod config;
pub mod error;
pub mod factory;
pub mod object_store;
pub mod path;
pub mod provider;

// Public exports
pub use config::{StorageConfig, StorageType};
pub use error::{StorageError, StorageResult};
pub use factory::StorageProviderFactory;
pub use path::RemotePath;
pub use provider::{ListMode, StorageProvider};
