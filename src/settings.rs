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

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use crate::storage::config::StorageConfig;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::path::RemotePath;

/// Environment variable holding the path of the settings file.
pub const SETTINGS_ENV_VAR: &str = "OCT_FIRE_SETTINGS";

/// Deployment settings, read from a JSON file.
///
/// Unknown keys are kept in [`Settings::extra`] so that settings shared with
/// other tools load without error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub gcp_project: Option<String>,
    /// Path of the service-account key used for the object store.
    pub gcp_service_key: Option<String>,
    /// Topic for published events; publishing is disabled when unset.
    pub pubsub_topic: Option<String>,
    /// Bearer token for the collaboration and messaging APIs.
    pub access_token: Option<String>,
    pub drive_api_url: Option<String>,
    pub pubsub_api_url: Option<String>,
    /// Explicit object-store configuration, overriding the GCS default.
    pub storage: Option<StorageConfig>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Settings {
    /// Load the file named by the `OCT_FIRE_SETTINGS` environment variable.
    pub fn from_env() -> StorageResult<Self> {
        Self::from_env_var(SETTINGS_ENV_VAR)
    }

    fn from_env_var(var: &str) -> StorageResult<Self> {
        let path = std::env::var(var).map_err(|_| {
            StorageError::ConfigError(format!("Environment variable {} is not set", var))
        })?;
        Self::from_file(&path)
    }

    /// Load settings from a local JSON file.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * `path` is a remote path (remote settings are not supported)
    /// * The file cannot be read or is not valid JSON
    pub fn from_file(path: &str) -> StorageResult<Self> {
        if RemotePath::is_remote(path) {
            return Err(StorageError::ConfigError(format!(
                "Remote settings files are not supported: {}",
                path
            )));
        }
        let content = std::fs::read_to_string(Path::new(path))?;
        let settings = Self::from_json_str(&content)?;
        info!("Loaded settings from path={}", path);
        Ok(settings)
    }

    pub fn from_json_str(json: &str) -> StorageResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Object-store configuration: the explicit `storage` entry if present,
    /// otherwise GCS authenticated with the service-account key.
    pub fn storage_config(&self) -> StorageConfig {
        match (&self.storage, &self.gcp_service_key) {
            (Some(storage), _) => storage.clone(),
            (None, Some(key_path)) => {
                StorageConfig::gcs().with_option("service_account_key_path", key_path)
            }
            (None, None) => StorageConfig::gcs(),
        }
    }

    /// A string value among the keys not modelled by [`Settings`].
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(|v| v.as_str())
    }

    pub(crate) fn require_access_token(&self) -> StorageResult<&str> {
        self.access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| StorageError::ConfigError("Settings lack 'accessToken'".to_string()))
    }
}
