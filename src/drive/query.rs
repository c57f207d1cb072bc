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

use chrono::{DateTime, SecondsFormat, Utc};

/// How an item name must relate to the searched value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameFilter {
    /// `name = '<value>'`
    Exact(String),
    /// `name contains '<value>'`
    Contains(String),
}

/// Optional constraints of a folder search. Unset fields add no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub name: Option<NameFilter>,
    /// Items must be modified strictly after this instant.
    pub modified_after: Option<DateTime<Utc>>,
    /// Items must be modified strictly before this instant.
    pub modified_before: Option<DateTime<Utc>>,
}

impl SearchFilter {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(NameFilter::Exact(name.into())),
            ..Default::default()
        }
    }

    pub fn name_contains(fragment: impl Into<String>) -> Self {
        Self {
            name: Some(NameFilter::Contains(fragment.into())),
            ..Default::default()
        }
    }

    pub fn modified_after(mut self, instant: DateTime<Utc>) -> Self {
        self.modified_after = Some(instant);
        self
    }

    pub fn modified_before(mut self, instant: DateTime<Utc>) -> Self {
        self.modified_before = Some(instant);
        self
    }
}

/// A search for non-trashed children of one folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub parent_id: String,
    pub filter: SearchFilter,
}

impl SearchQuery {
    pub fn new(parent_id: impl Into<String>, filter: SearchFilter) -> Self {
        Self {
            parent_id: parent_id.into(),
            filter,
        }
    }

    /// Render the Drive `q` parameter: the conjunction of the parent and
    /// trash constraints with every filter that is set.
    pub fn to_query_string(&self) -> String {
        let mut constraints = vec![
            format!("'{}' in parents", escape(&self.parent_id)),
            "trashed = false".to_string(),
        ];
        if let Some(after) = &self.filter.modified_after {
            constraints.push(format!("modifiedTime > '{}'", format_time(after)));
        }
        if let Some(before) = &self.filter.modified_before {
            constraints.push(format!("modifiedTime < '{}'", format_time(before)));
        }
        match &self.filter.name {
            Some(NameFilter::Exact(name)) => constraints.push(format!("name = '{}'", escape(name))),
            Some(NameFilter::Contains(fragment)) => {
                constraints.push(format!("name contains '{}'", escape(fragment)))
            }
            None => (),
        }
        constraints.join(" and ")
    }
}

fn format_time(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Escape a literal for use inside a single-quoted query string.
fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_query_without_filters() {
        let query = SearchQuery::new("folder-1", SearchFilter::default());
        assert_eq!(
            query.to_query_string(),
            "'folder-1' in parents and trashed = false"
        );
    }

    #[test]
    fn test_query_by_name() {
        let query = SearchQuery::new("root", SearchFilter::by_name("cam-a"));
        assert_eq!(
            query.to_query_string(),
            "'root' in parents and trashed = false and name = 'cam-a'"
        );
    }

    #[test]
    fn test_query_with_all_filters() {
        let after = Utc.with_ymd_and_hms(2019, 6, 1, 0, 0, 0).unwrap();
        let before = Utc.with_ymd_and_hms(2019, 6, 2, 12, 30, 0).unwrap();
        let filter = SearchFilter::name_contains("smoke")
            .modified_after(after)
            .modified_before(before);

        let query = SearchQuery::new("p", filter);
        assert_eq!(
            query.to_query_string(),
            "'p' in parents and trashed = false \
             and modifiedTime > '2019-06-01T00:00:00Z' \
             and modifiedTime < '2019-06-02T12:30:00Z' \
             and name contains 'smoke'"
        );
    }

    #[test]
    fn test_query_escapes_quotes() {
        let query = SearchQuery::new("p", SearchFilter::by_name("o'neil\\x"));
        assert!(
            query
                .to_query_string()
                .ends_with("name = 'o\\'neil\\\\x'")
        );
    }
}
