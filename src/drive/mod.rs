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

//! Collaboration backend access
//!
//! Folders and files of a Drive-style backend are addressed by opaque IDs.
//! [`DriveStore`] layers retries, pagination and uniqueness checks on top of
//! any [`DriveBackend`]; [`DriveHttpBackend`] talks to the Drive v3 REST API.

pub mod backend;
pub mod http;
pub mod query;
pub mod store;

pub use backend::{DriveBackend, RemoteItem};
pub use http::DriveHttpBackend;
pub use query::{NameFilter, SearchFilter, SearchQuery};
pub use store::{ClassLocations, DriveStore, PAGE_TOKEN_INIT};
