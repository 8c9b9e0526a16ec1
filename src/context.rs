use std::collections::HashMap;

use serde_json::Value;

/// Read-only view of request-scoped data.
///
/// The engine only ever reads through this trait; how parameters are
/// physically stored is up to the host pipeline.
pub trait RequestContext: Send + Sync {
    /// Generic parameter lookup, used when no `lookin` bag is configured.
    fn param(&self, name: &str) -> Option<Value>;

    /// Looks up `name` inside the named bag (`query`, `headers`, `session`...).
    fn bag(&self, bag: &str, name: &str) -> Option<Value>;
}

const PARAMS: &str = "params";
const BODY: &str = "body";
const QUERY: &str = "query";

/// A plain in-memory request context.
#[derive(Debug, Default, Clone)]
pub struct Request {
    bags: HashMap<String, HashMap<String, Value>>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a route parameter.
    #[must_use]
    pub fn with_param(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_value(PARAMS, name, value)
    }

    /// Adds a value to an arbitrary bag.
    #[must_use]
    pub fn with_value(
        mut self,
        bag: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.bags
            .entry(bag.into())
            .or_default()
            .insert(name.into(), value.into());
        self
    }
}

impl RequestContext for Request {
    // route params, then body, then query string.
    fn param(&self, name: &str) -> Option<Value> {
        [PARAMS, BODY, QUERY]
            .iter()
            .find_map(|bag| self.bag(bag, name))
    }

    fn bag(&self, bag: &str, name: &str) -> Option<Value> {
        self.bags.get(bag).and_then(|values| values.get(name)).cloned()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn param_lookup_order() {
        let request = Request::new()
            .with_value("query", "id", 3)
            .with_value("body", "id", 2)
            .with_param("id", 1);
        assert_eq!(Some(json!(1)), request.param("id"));

        let request = Request::new()
            .with_value("query", "id", 3)
            .with_value("body", "id", 2);
        assert_eq!(Some(json!(2)), request.param("id"));

        let request = Request::new().with_value("query", "id", 3);
        assert_eq!(Some(json!(3)), request.param("id"));
    }

    #[test]
    fn generic_lookup_ignores_other_bags() {
        let request = Request::new().with_value("session", "user", "alice");
        assert_eq!(None, request.param("user"));
        assert_eq!(Some(json!("alice")), request.bag("session", "user"));
    }

    #[test]
    fn missing_values() {
        let request = Request::new();
        assert_eq!(None, request.param("id"));
        assert_eq!(None, request.bag("headers", "x-user"));
    }
}
