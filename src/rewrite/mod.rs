//! Response rewriting
//!
//! The main orchestration point of the crate. Intercepted back-office calls
//! are matched against a declarative [`RouteTable`] and rewritten by the
//! [`RewriteDispatcher`] in two phases:
//!
//! 1. [`RewriteDispatcher::plan`] runs before the underlying call and
//!    decides whether this request needs rewriting at all. Administrators
//!    and users without a restriction configured short-circuit here, before
//!    any work is done on their behalf.
//! 2. [`RewriteDispatcher::apply`] runs on the completed response body and
//!    performs the mutation. Any failure inside it is caught and logged and
//!    the original body is returned: a rewrite failure must never turn a
//!    successful upstream response into an error.
//!
//! Both phases are pure with respect to HTTP plumbing and are exercised
//! directly in tests on raw bodies and query strings.

pub mod dispatcher;
pub mod routes;
pub mod shapes;

pub use dispatcher::{RewriteDispatcher, RewriteOutcome, RewritePlan};
pub use routes::{RewriteRule, RouteTable};

/// Parsed query string of an intercepted request
#[derive(Debug, Default, Clone)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };
        Self(
            url::form_urlencoded::parse(raw.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Case-insensitive value comparison, matching the host's loose casing
    pub fn is(&self, key: &str, value: &str) -> bool {
        self.get(key).is_some_and(|v| v.eq_ignore_ascii_case(value))
    }
}
