//! Render options.
//!
//! Options are plain data handed to every render call. Nothing here is
//! global, so two renders with different options never observe each other.

use crate::Error;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Field read from identifiable objects when nothing more specific is configured.
pub const DEFAULT_MODEL_VALUE_FIELD: &str = "pk";

/// Prefix that marks a tracking parameter.
pub const UTM_PREFIX: &str = "utm_";

/// Configuration for a single render call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct RenderOptions {
    /// Drop empty values (and keys left without values) after mutation
    #[serde(default = "default_remove_blank")]
    pub remove_blank: bool,

    /// Drop every `utm_*` parameter after mutation
    #[serde(default = "default_remove_utm")]
    pub remove_utm: bool,

    /// Field read from identifiable objects that declare no override
    #[validate(length(min = 1, max = 128))]
    #[serde(default = "default_model_value_field")]
    pub model_value_field: String,
}

const fn default_remove_blank() -> bool {
    true
}

const fn default_remove_utm() -> bool {
    true
}

fn default_model_value_field() -> String {
    DEFAULT_MODEL_VALUE_FIELD.to_string()
}

impl RenderOptions {
    /// Create options with the library defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            remove_blank: default_remove_blank(),
            remove_utm: default_remove_utm(),
            model_value_field: default_model_value_field(),
        }
    }

    /// Set whether blank values are removed.
    #[must_use]
    pub const fn with_remove_blank(mut self, remove_blank: bool) -> Self {
        self.remove_blank = remove_blank;
        self
    }

    /// Set whether tracking parameters are removed.
    #[must_use]
    pub const fn with_remove_utm(mut self, remove_utm: bool) -> Self {
        self.remove_utm = remove_utm;
        self
    }

    /// Set the field read from identifiable objects.
    #[must_use]
    pub fn with_model_value_field(mut self, field: impl Into<String>) -> Self {
        self.model_value_field = field.into();
        self
    }

    /// Validate the options, returning them unchanged on success.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOptions`] if `model_value_field` is empty or too long.
    pub fn validated(self) -> Result<Self, Error> {
        self.validate()?;
        Ok(self)
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_options_defaults() {
        let options = RenderOptions::default();
        assert!(options.remove_blank);
        assert!(options.remove_utm);
        assert_eq!(options.model_value_field, "pk");
    }

    #[test]
    fn test_render_options_builder() {
        let options = RenderOptions::new()
            .with_remove_blank(false)
            .with_remove_utm(false)
            .with_model_value_field("slug");

        assert!(!options.remove_blank);
        assert!(!options.remove_utm);
        assert_eq!(options.model_value_field, "slug");
    }

    #[test]
    fn test_render_options_validation() {
        assert!(RenderOptions::new().validated().is_ok());

        let err = RenderOptions::new()
            .with_model_value_field("")
            .validated()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidOptions(_)));

        let long = "x".repeat(129);
        assert!(RenderOptions::new()
            .with_model_value_field(long)
            .validated()
            .is_err());
    }

    #[test]
    fn test_render_options_deserialize_fills_defaults() {
        let options: RenderOptions = serde_json::from_str(r#"{"remove_utm": false}"#).unwrap();
        assert!(options.remove_blank);
        assert!(!options.remove_utm);
        assert_eq!(options.model_value_field, "pk");
    }

    #[test]
    fn test_render_options_serialization() {
        let options = RenderOptions::new().with_model_value_field("username");
        let json = serde_json::to_string(&options).unwrap();
        let deserialized: RenderOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(options, deserialized);
    }
}
