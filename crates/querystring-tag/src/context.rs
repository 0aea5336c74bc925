//! Rendering context: the variables a tag can refer to.

use std::collections::HashMap;

use querystring_core::Value;

/// Looks up template variables for a tag.
pub trait Resolve {
    /// Resolve a possibly dotted variable path.
    fn lookup(&self, path: &str) -> Option<Value>;

    /// Query string of the current request, used when no `source_data` is given.
    fn request_query(&self) -> Option<String> {
        None
    }
}

/// In-memory context backed by a map of variables.
#[derive(Debug, Clone, Default)]
pub struct Context {
    variables: HashMap<String, Value>,
    request_query: Option<String>,
}

impl Context {
    /// Create an empty context with no request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the current request's query string.
    #[must_use]
    pub fn with_request_query(mut self, query: impl Into<String>) -> Self {
        self.request_query = Some(query.into());
        self
    }

    /// Add a variable, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a variable, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Get a top-level variable.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }
}

impl Resolve for Context {
    fn lookup(&self, path: &str) -> Option<Value> {
        let mut segments = path.split('.');
        let root = self.variables.get(segments.next()?)?.clone();
        segments.try_fold(root, |current, segment| attribute(&current, segment))
    }

    fn request_query(&self) -> Option<String> {
        self.request_query.clone()
    }
}

/// One step of a dotted lookup: mapping entries, identifiable fields, sequence indexes.
fn attribute(value: &Value, segment: &str) -> Option<Value> {
    match value {
        Value::Mapping(entries) => entries
            .iter()
            .find(|(key, _)| key == segment)
            .map(|(_, value)| value.clone()),
        Value::Identifiable(object) => object.field_value(segment).map(Value::Str),
        Value::Sequence(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(|index| items.get(index).cloned()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use querystring_core::Record;

    fn context() -> Context {
        Context::new()
            .with("user", Record::new().with_field("pk", 1).with_field("username", "user-one"))
            .with(
                "filters",
                Value::Mapping(vec![("group".to_string(), Value::from("articles"))]),
            )
            .with("letters", vec!["a", "b"])
    }

    #[test]
    fn resolves_top_level_variables() {
        assert!(matches!(context().lookup("letters"), Some(Value::Sequence(_))));
        assert!(context().lookup("missing").is_none());
    }

    #[test]
    fn resolves_dotted_paths() {
        let ctx = context();
        assert!(matches!(ctx.lookup("user.username"), Some(Value::Str(ref s)) if s == "user-one"));
        assert!(matches!(ctx.lookup("filters.group"), Some(Value::Str(ref s)) if s == "articles"));
        assert!(matches!(ctx.lookup("letters.1"), Some(Value::Str(ref s)) if s == "b"));
        assert!(ctx.lookup("user.email").is_none());
        assert!(ctx.lookup("letters.9").is_none());
    }

    #[test]
    fn request_query_defaults_to_none() {
        assert!(Context::new().request_query().is_none());
        assert_eq!(
            Context::new().with_request_query("a=1").request_query().as_deref(),
            Some("a=1")
        );
    }
}
