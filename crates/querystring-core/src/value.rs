//! Call-site values and the normalizer that turns them into parameter tokens.
//!
//! Values reach this crate already resolved by the host (template variables,
//! request data, model instances). [`normalize`] flattens any of them into
//! the string tokens that end up in the query string.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};

/// An object that is represented in a query string by one of its fields.
///
/// Model instances are the usual example: a `user` value renders as its
/// primary key unless configured otherwise.
pub trait Identifiable: Send + Sync {
    /// Returns the string form of `field`, or `None` when the object has no such field.
    fn field_value(&self, field: &str) -> Option<String>;

    /// Field this object always wants used, taking precedence over the
    /// call-level `model_value_field` option.
    fn value_field_override(&self) -> Option<String> {
        None
    }
}

impl fmt::Debug for dyn Identifiable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identifiable")
            .field("value_field_override", &self.value_field_override())
            .finish_non_exhaustive()
    }
}

/// A plain identifiable object built from named fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
    value_field_override: Option<String>,
}

impl Record {
    /// Create a record with no fields.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        let name = name.into();
        let value = value.to_string();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
        self
    }

    /// Declare the field this record is always represented by.
    #[must_use]
    pub fn with_value_field_override(mut self, field: impl Into<String>) -> Self {
        self.value_field_override = Some(field.into());
        self
    }
}

impl Identifiable for Record {
    fn field_value(&self, field: &str) -> Option<String> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.clone())
    }

    fn value_field_override(&self) -> Option<String> {
        self.value_field_override.clone()
    }
}

/// Date and time values, rendered as ISO-8601.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Temporal {
    /// Calendar date (`2022-01-01`)
    Date(NaiveDate),
    /// Date and time without an offset (`2022-01-01T10:30:00`)
    DateTime(NaiveDateTime),
    /// Date and time with an offset (`2022-01-01T10:30:00+01:00`)
    Zoned(DateTime<FixedOffset>),
    /// Time of day (`10:30:00`)
    Time(NaiveTime),
}

impl Temporal {
    /// ISO-8601 representation. Fractional seconds appear only when non-zero.
    #[must_use]
    pub fn to_iso8601(&self) -> String {
        match self {
            Self::Date(date) => date.format("%Y-%m-%d").to_string(),
            Self::DateTime(datetime) => datetime.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
            Self::Zoned(datetime) => datetime.to_rfc3339_opts(SecondsFormat::AutoSi, false),
            Self::Time(time) => time.format("%H:%M:%S%.f").to_string(),
        }
    }
}

/// A resolved call-site value.
#[derive(Debug, Clone)]
pub enum Value {
    /// Absence of a value; normalizes to the empty string
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// String
    Str(String),
    /// UUID, rendered hyphenated lower-case
    Uuid(Uuid),
    /// Date or time
    Temporal(Temporal),
    /// Object represented by one of its fields
    Identifiable(Arc<dyn Identifiable>),
    /// Several values for the same parameter
    Sequence(Vec<Value>),
    /// Name/value pairs; only meaningful as source data
    Mapping(Vec<(String, Value)>),
}

impl Value {
    /// Wrap an identifiable object.
    pub fn identifiable(object: impl Identifiable + 'static) -> Self {
        Self::Identifiable(Arc::new(object))
    }

    /// Short description of the value's kind, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Uuid(_) => "uuid",
            Self::Temporal(_) => "temporal",
            Self::Identifiable(_) => "identifiable object",
            Self::Sequence(_) => "sequence",
            Self::Mapping(_) => "mapping",
        }
    }

    /// Borrow the string if this is a [`Value::Str`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }
}

/// Convert a value into the parameter tokens it stands for.
///
/// Scalars produce one token. A sequence produces one token per element,
/// in order; its elements must themselves be scalars or identifiable
/// objects. Identifiable objects use their own override field if they
/// declare one, otherwise `model_value_field`.
///
/// # Errors
///
/// Returns [`Error::Normalization`] for mappings, for sequences nested
/// inside sequences, and for identifiable objects lacking the resolved field.
pub fn normalize(value: &Value, model_value_field: &str) -> Result<Vec<String>> {
    match value {
        Value::Sequence(items) => items
            .iter()
            .map(|item| match item {
                Value::Sequence(_) => Err(Error::Normalization(
                    "sequences nested inside sequences are not supported".to_string(),
                )),
                other => normalize_scalar(other, model_value_field),
            })
            .collect(),
        other => Ok(vec![normalize_scalar(other, model_value_field)?]),
    }
}

fn normalize_scalar(value: &Value, model_value_field: &str) -> Result<String> {
    match value {
        Value::Null => Ok(String::new()),
        Value::Bool(flag) => Ok(flag.to_string()),
        Value::Int(number) => Ok(number.to_string()),
        Value::Float(number) => Ok(number.to_string()),
        Value::Str(text) => Ok(text.clone()),
        Value::Uuid(uuid) => Ok(uuid.hyphenated().to_string()),
        Value::Temporal(temporal) => Ok(temporal.to_iso8601()),
        Value::Identifiable(object) => {
            let field = object
                .value_field_override()
                .unwrap_or_else(|| model_value_field.to_string());
            object.field_value(&field).ok_or_else(|| {
                Error::Normalization(format!("identifiable object has no field '{field}'"))
            })
        }
        Value::Sequence(_) | Value::Mapping(_) => Err(Error::Normalization(format!(
            "a {} cannot be used as a parameter value",
            value.kind()
        ))),
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Self::Temporal(Temporal::Date(value))
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Self::Temporal(Temporal::DateTime(value))
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self::Temporal(Temporal::Zoned(value))
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Temporal(Temporal::Zoned(value.fixed_offset()))
    }
}

impl From<NaiveTime> for Value {
    fn from(value: NaiveTime) -> Self {
        Self::Temporal(Temporal::Time(value))
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Self::identifiable(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::Sequence(values.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;

    mock! {
        pub Model {}

        impl Identifiable for Model {
            fn field_value(&self, field: &str) -> Option<String>;
            fn value_field_override(&self) -> Option<String>;
        }
    }

    fn user() -> Record {
        Record::new()
            .with_field("pk", 1)
            .with_field("username", "user-one")
    }

    #[test]
    fn null_is_blank() {
        assert_eq!(normalize(&Value::Null, "pk").unwrap(), vec![String::new()]);
    }

    #[test]
    fn scalars_render_as_strings() {
        assert_eq!(normalize(&true.into(), "pk").unwrap(), vec!["true"]);
        assert_eq!(normalize(&false.into(), "pk").unwrap(), vec!["false"]);
        assert_eq!(normalize(&42.into(), "pk").unwrap(), vec!["42"]);
        assert_eq!(normalize(&(-7i64).into(), "pk").unwrap(), vec!["-7"]);
        assert_eq!(normalize(&1.5.into(), "pk").unwrap(), vec!["1.5"]);
        assert_eq!(normalize(&"text".into(), "pk").unwrap(), vec!["text"]);
    }

    #[test]
    fn uuid_renders_hyphenated() {
        let uuid = Uuid::parse_str("550E8400-E29B-41D4-A716-446655440000").unwrap();
        assert_eq!(
            normalize(&uuid.into(), "pk").unwrap(),
            vec!["550e8400-e29b-41d4-a716-446655440000"]
        );
    }

    #[test]
    fn temporals_render_iso8601() {
        let date = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        assert_eq!(normalize(&date.into(), "pk").unwrap(), vec!["2022-01-01"]);

        let datetime = date.and_hms_opt(10, 30, 0).unwrap();
        assert_eq!(
            normalize(&datetime.into(), "pk").unwrap(),
            vec!["2022-01-01T10:30:00"]
        );

        let millis = date.and_hms_milli_opt(10, 30, 0, 250).unwrap();
        assert_eq!(
            normalize(&millis.into(), "pk").unwrap(),
            vec!["2022-01-01T10:30:00.250"]
        );

        let zoned = DateTime::parse_from_rfc3339("2022-01-01T10:30:00+01:00").unwrap();
        assert_eq!(
            normalize(&zoned.into(), "pk").unwrap(),
            vec!["2022-01-01T10:30:00+01:00"]
        );

        let time = NaiveTime::from_hms_opt(8, 5, 0).unwrap();
        assert_eq!(normalize(&time.into(), "pk").unwrap(), vec!["08:05:00"]);
    }

    #[test]
    fn identifiable_uses_call_level_field() {
        let value = Value::from(user());
        assert_eq!(normalize(&value, "pk").unwrap(), vec!["1"]);
        assert_eq!(normalize(&value, "username").unwrap(), vec!["user-one"]);
    }

    #[test]
    fn identifiable_override_beats_call_level_field() {
        let value = Value::from(user().with_value_field_override("username"));
        assert_eq!(normalize(&value, "pk").unwrap(), vec!["user-one"]);
    }

    #[test]
    fn identifiable_missing_field_fails() {
        let err = normalize(&Value::from(user()), "secret_key").unwrap_err();
        assert_eq!(
            err,
            Error::Normalization("identifiable object has no field 'secret_key'".to_string())
        );
    }

    #[test]
    fn identifiable_is_probed_through_trait() {
        let mut model = MockModel::new();
        model
            .expect_value_field_override()
            .times(1)
            .returning(|| Some("slug".to_string()));
        model
            .expect_field_value()
            .withf(|field| field == "slug")
            .times(1)
            .returning(|_| Some("hello-world".to_string()));

        let value = Value::identifiable(model);
        assert_eq!(normalize(&value, "pk").unwrap(), vec!["hello-world"]);
    }

    #[test]
    fn sequence_expands_in_order() {
        let value = Value::Sequence(vec![
            "a".into(),
            Value::Null,
            3.into(),
            Value::from(user()),
        ]);
        assert_eq!(
            normalize(&value, "pk").unwrap(),
            vec!["a", "", "3", "1"]
        );
    }

    #[test]
    fn empty_sequence_yields_nothing() {
        assert!(normalize(&Value::Sequence(Vec::new()), "pk")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn nested_sequence_fails() {
        let value = Value::Sequence(vec![Value::Sequence(vec!["a".into()])]);
        assert!(matches!(
            normalize(&value, "pk"),
            Err(Error::Normalization(_))
        ));
    }

    #[test]
    fn mapping_is_not_a_parameter_value() {
        let value = Value::Mapping(vec![("a".to_string(), "b".into())]);
        let err = normalize(&value, "pk").unwrap_err();
        assert_eq!(
            err,
            Error::Normalization("a mapping cannot be used as a parameter value".to_string())
        );
    }

    #[test]
    fn option_converts_to_null() {
        assert!(matches!(Value::from(None::<i32>), Value::Null));
        assert!(matches!(Value::from(Some(5)), Value::Int(5)));
    }

    #[test]
    fn record_with_field_replaces_existing() {
        let record = Record::new().with_field("pk", 1).with_field("pk", 2);
        assert_eq!(record.field_value("pk").as_deref(), Some("2"));
    }
}
