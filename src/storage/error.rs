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

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Object store error: {0}")]
    ObjectStoreError(#[from] object_store::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("UTF-8 error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),

    #[error("Remote service returned status={status}: {body}")]
    RemoteError { status: u16, body: String },

    /// A lookup that must match exactly one remote item matched `found` items.
    #[error("Expected exactly one item named '{name}' in folder {parent_id}, found {found}")]
    NotUnique {
        parent_id: String,
        name: String,
        found: usize,
    },

    /// The operation failed on every attempt allowed by the retry policy.
    #[error("{operation} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        operation: String,
        attempts: usize,
        last_error: String,
    },
}

impl StorageError {
    /// Whether this error marks a transient failure that outlived its retries.
    ///
    /// Callers treat this as "could not complete, continue with best effort",
    /// unlike integrity errors such as [`StorageError::NotUnique`].
    pub fn is_retries_exhausted(&self) -> bool {
        matches!(self, StorageError::RetriesExhausted { .. })
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
