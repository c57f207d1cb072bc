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

//! Remote path notation (`gs://container/name`).

use regex::Regex;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::LazyLock;

/// Scheme used by the remote path notation.
pub const REMOTE_SCHEME: &str = "gs";

static REMOTE_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^gs://([a-z0-9_.-]+)/(.+)$").expect("remote path pattern is valid")
});

/// A parsed `gs://container/name` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemotePath {
    /// Backend namespace (bucket).
    pub container: String,
    /// Slash-delimited key inside the container, without a trailing slash.
    pub name: String,
}

impl RemotePath {
    /// Parse a remote path.
    ///
    /// Returns `None` when `path` does not use the remote notation, in which case
    /// callers treat it as a local filesystem path. One trailing `/` on the name
    /// is stripped.
    ///
    /// # Examples
    ///
    /// ```
    /// use firecam_storage::storage::RemotePath;
    ///
    /// let parsed = RemotePath::parse("gs://fire-images/cams/a/").unwrap();
    /// assert_eq!(parsed.container, "fire-images");
    /// assert_eq!(parsed.name, "cams/a");
    /// assert!(RemotePath::parse("/tmp/cams").is_none());
    /// ```
    pub fn parse(path: &str) -> Option<Self> {
        let captures = REMOTE_PATH_RE.captures(path)?;
        let container = captures.get(1)?.as_str();
        let name = captures.get(2)?.as_str();
        let name = name.strip_suffix('/').unwrap_or(name);
        Some(Self {
            container: container.to_string(),
            name: name.to_string(),
        })
    }

    /// Package container and name back into the remote notation. No validation
    /// is performed.
    pub fn repack(container: &str, name: &str) -> String {
        format!("{}://{}/{}", REMOTE_SCHEME, container, name)
    }

    /// Whether `path` uses the remote notation.
    pub fn is_remote(path: &str) -> bool {
        Self::parse(path).is_some()
    }

    /// Child of this path, e.g. a file inside a directory-like prefix.
    pub fn join(&self, leaf: &str) -> Self {
        let leaf = leaf.trim_start_matches('/');
        let name = if self.name.is_empty() {
            leaf.to_string()
        } else {
            format!("{}/{}", self.name, leaf)
        };
        Self {
            container: self.container.clone(),
            name,
        }
    }

    /// Last path segment of the name.
    pub fn leaf(&self) -> &str {
        leaf_name(&self.name)
    }
}

impl Display for RemotePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", Self::repack(&self.container, &self.name))
    }
}

/// Last `/`-separated segment of an object key.
pub(crate) fn leaf_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let parsed = RemotePath::parse("gs://bucket/dir/file.jpg").unwrap();
        assert_eq!(parsed.container, "bucket");
        assert_eq!(parsed.name, "dir/file.jpg");
    }

    #[test]
    fn test_parse_strips_trailing_slash() {
        let parsed = RemotePath::parse("gs://c/n/").unwrap();
        assert_eq!(parsed.name, "n");
    }

    #[test]
    fn test_parse_strips_only_one_trailing_slash() {
        let parsed = RemotePath::parse("gs://c/n//").unwrap();
        assert_eq!(parsed.name, "n/");
    }

    #[test]
    fn test_parse_local_paths() {
        assert!(RemotePath::parse("/var/data/file.csv").is_none());
        assert!(RemotePath::parse("relative/file.csv").is_none());
        assert!(RemotePath::parse("s3://bucket/key").is_none());
        assert!(!RemotePath::is_remote("C:/data/file.csv"));
    }

    #[test]
    fn test_parse_requires_name() {
        assert!(RemotePath::parse("gs://bucket").is_none());
        assert!(RemotePath::parse("gs://bucket/").is_none());
    }

    #[test]
    fn test_parse_rejects_invalid_container() {
        assert!(RemotePath::parse("gs://Bucket/key").is_none());
        assert!(RemotePath::parse("gs://my bucket/key").is_none());
        assert!(RemotePath::parse("gs://my_bucket.v2-x/key").is_some());
    }

    #[test]
    fn test_repack() {
        assert_eq!(RemotePath::repack("bucket", "a/b.txt"), "gs://bucket/a/b.txt");
    }

    #[test]
    fn test_round_trip() {
        let cases = [
            ("bucket", "file"),
            ("fire-cams", "2020/01/01/cam_a.jpg"),
            ("b.0_x", "deep/nested/key with spaces"),
        ];
        for (container, name) in cases {
            let packed = RemotePath::repack(container, name);
            let parsed = RemotePath::parse(&packed).unwrap();
            assert_eq!(parsed.container, container);
            assert_eq!(parsed.name, name);
            assert_eq!(parsed.to_string(), packed);
        }
    }

    #[test]
    fn test_join_and_leaf() {
        let dir = RemotePath::parse("gs://bucket/images/").unwrap();
        let file = dir.join("cam.jpg");
        assert_eq!(file.to_string(), "gs://bucket/images/cam.jpg");
        assert_eq!(file.leaf(), "cam.jpg");
    }

    #[test]
    fn test_leaf_name() {
        assert_eq!(leaf_name("a/b/c"), "c");
        assert_eq!(leaf_name("c"), "c");
        assert_eq!(leaf_name("a/"), "");
    }
}
