//! Utility functions shared across the application.

mod secret;

pub use secret::SecretString;

use std::fmt::Display;

/// Builder for URL query parameters.
///
/// Provides a fluent API for constructing query strings with proper URL
/// encoding.
///
/// # Example
/// ```ignore
/// let query = QueryBuilder::new()
///     .param("type", "Media")
///     .param("ids", "1054,2001")
///     .build();
/// // Returns "?type=Media&ids=1054%2C2001"
/// ```
#[derive(Default)]
pub struct QueryBuilder {
    params: Vec<(String, String)>,
}

impl QueryBuilder {
    /// Create a new empty query builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required parameter (always included).
    pub fn param(mut self, key: &str, value: impl Display) -> Self {
        self.params.push((
            key.to_string(),
            urlencoding::encode(&value.to_string()).into_owned(),
        ));
        self
    }

    /// Add an optional parameter (only included if Some).
    pub fn optional<T: Display>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.param(key, v),
            None => self,
        }
    }

    /// Build the query string, including the leading `?`.
    ///
    /// Returns an empty string when no parameters were added.
    pub fn build(self) -> String {
        if self.params.is_empty() {
            return String::new();
        }

        let joined = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        format!("?{}", joined)
    }
}
