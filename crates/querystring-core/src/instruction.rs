//! Instructions and the parser that builds them from call-site arguments.
//!
//! A call looks like
//!
//! ```text
//! [only|discard name...] key=value key+=value key-=value option=value ...
//! ```
//!
//! The host resolves names and values first; [`parse_arguments`] only deals
//! with the shape of the argument list.

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use tracing::trace;

use crate::config::RenderOptions;
use crate::error::{Error, Result};
use crate::store::SourceData;
use crate::value::{normalize, Value};

/// Option names that configure the call instead of modifying parameters.
pub const RESERVED_OPTIONS: [&str; 6] = [
    "source_data",
    "remove_blank",
    "remove_utm",
    "model_value_field",
    "as",
    "asvar",
];

/// Assignment operator of a keyword argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `=` replaces every value
    Set,
    /// `+=` appends values not already present
    Add,
    /// `-=` removes values
    Remove,
}

impl Operator {
    /// All operators, longest symbol first.
    pub const ALL: [Self; 3] = [Self::Add, Self::Remove, Self::Set];

    /// Source form of the operator.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Set => "=",
            Self::Add => "+=",
            Self::Remove => "-=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|operator| operator.symbol() == s)
            .ok_or_else(|| Error::Syntax(format!("unsupported operator '{s}'")))
    }
}

/// Leading scope marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    /// Keep only the named keys
    Only,
    /// Drop the named keys
    Discard,
}

impl Marker {
    /// Source form of the marker.
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Only => "only",
            Self::Discard => "discard",
        }
    }
}

impl FromStr for Marker {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "only" => Ok(Self::Only),
            "discard" => Ok(Self::Discard),
            other => Err(Error::Syntax(format!("unknown marker '{other}'"))),
        }
    }
}

/// One resolved argument from the call site.
#[derive(Debug, Clone)]
pub enum Argument {
    /// `only` or `discard`
    Marker(Marker),
    /// Parameter name listed after a marker
    Name(String),
    /// `key <operator> value`; the key may carry a `+`/`-` suffix instead of a compound operator
    Keyword {
        /// Raw key, possibly suffixed
        key: String,
        /// Raw operator text
        operator: String,
        /// Resolved value
        value: Value,
    },
}

impl Argument {
    /// Build a keyword argument.
    pub fn keyword(key: impl Into<String>, operator: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Keyword {
            key: key.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }

    /// Build a parameter-name argument.
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }
}

/// Discriminant of an [`Instruction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstructionKind {
    /// Replace a key's values
    Set,
    /// Append missing values
    Add,
    /// Remove values
    Remove,
    /// Keep only some keys
    KeepOnly,
    /// Drop some keys
    Discard,
}

/// A single mutation of the parameter store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Replace every value of `key`
    Set {
        /// Target key
        key: String,
        /// Normalized values
        values: Vec<String>,
    },
    /// Append each value to `key` unless already present
    Add {
        /// Target key
        key: String,
        /// Normalized values
        values: Vec<String>,
    },
    /// Remove the first occurrence of each value from `key`
    Remove {
        /// Target key
        key: String,
        /// Normalized values
        values: Vec<String>,
    },
    /// Drop every key not listed
    KeepOnly {
        /// Keys to keep
        keys: Vec<String>,
    },
    /// Drop the listed keys
    Discard {
        /// Keys to drop
        keys: Vec<String>,
    },
}

impl Instruction {
    /// Kind of this instruction.
    #[must_use]
    pub const fn kind(&self) -> InstructionKind {
        match self {
            Self::Set { .. } => InstructionKind::Set,
            Self::Add { .. } => InstructionKind::Add,
            Self::Remove { .. } => InstructionKind::Remove,
            Self::KeepOnly { .. } => InstructionKind::KeepOnly,
            Self::Discard { .. } => InstructionKind::Discard,
        }
    }

    /// Returns true for `KeepOnly` and `Discard`.
    #[must_use]
    pub const fn is_scope(&self) -> bool {
        matches!(self, Self::KeepOnly { .. } | Self::Discard { .. })
    }
}

/// Validated, immutable list of instructions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstructionSet {
    instructions: Vec<Instruction>,
}

impl InstructionSet {
    /// Validate and wrap a list of instructions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Syntax`] if more than one `KeepOnly`/`Discard` is present.
    pub fn new(instructions: Vec<Instruction>) -> Result<Self> {
        let scopes: Vec<InstructionKind> = instructions
            .iter()
            .filter(|instruction| instruction.is_scope())
            .map(Instruction::kind)
            .collect();
        match scopes.as_slice() {
            [] | [_] => Ok(Self { instructions }),
            kinds if kinds.contains(&InstructionKind::KeepOnly)
                && kinds.contains(&InstructionKind::Discard) =>
            {
                Err(Error::Syntax(
                    "'only' and 'discard' cannot be used together".to_string(),
                ))
            }
            _ => Err(Error::Syntax(
                "'only' or 'discard' may only be used once".to_string(),
            )),
        }
    }

    /// An empty instruction set.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

impl Deref for InstructionSet {
    type Target = [Instruction];

    fn deref(&self) -> &Self::Target {
        &self.instructions
    }
}

/// Everything parsed from one call.
#[derive(Debug, Clone, Default)]
pub struct ParsedCall {
    /// Instructions to apply
    pub instructions: InstructionSet,
    /// Options for this call, defaults merged with keyword overrides
    pub options: RenderOptions,
    /// Source data given with `source_data=`
    pub source: Option<SourceData>,
    /// Variable name given with `as=`/`asvar=`
    pub bind_as: Option<String>,
}

/// Parse a resolved argument list into instructions and options.
///
/// Reserved options are read before any instruction value is normalized, so
/// `model_value_field` applies to every keyword in the call wherever it appears.
///
/// # Errors
///
/// Returns [`Error::Syntax`] for misplaced or conflicting markers, unknown
/// operators, empty keys, and operators applied to reserved options.
/// Returns [`Error::Normalization`] if a value cannot be normalized and
/// [`Error::UnsupportedSource`] for unusable `source_data`.
pub fn parse_arguments(arguments: Vec<Argument>, defaults: &RenderOptions) -> Result<ParsedCall> {
    let mut marker: Option<Marker> = None;
    let mut names: Vec<String> = Vec::new();
    let mut keywords: Vec<(String, String, Value)> = Vec::new();

    for argument in arguments {
        match argument {
            Argument::Marker(next) => {
                if let Some(current) = marker {
                    return Err(if current == next {
                        Error::Syntax(format!("'{}' may only be used once", next.keyword()))
                    } else {
                        Error::Syntax("'only' and 'discard' cannot be used together".to_string())
                    });
                }
                if !keywords.is_empty() {
                    return Err(Error::Syntax(format!(
                        "'{}' must come before any keyword arguments",
                        next.keyword()
                    )));
                }
                marker = Some(next);
            }
            Argument::Name(name) => {
                if marker.is_none() || !keywords.is_empty() {
                    return Err(Error::Syntax(format!(
                        "unexpected parameter name '{name}'; names may only follow 'only' or 'discard'"
                    )));
                }
                names.push(name);
            }
            Argument::Keyword {
                key,
                operator,
                value,
            } => keywords.push((key, operator, value)),
        }
    }

    if let Some(marker) = marker {
        if names.is_empty() {
            return Err(Error::Syntax(format!(
                "'{}' must be followed by at least one parameter name",
                marker.keyword()
            )));
        }
    }

    let mut call = ParsedCall {
        options: defaults.clone(),
        ..ParsedCall::default()
    };
    let mut modifiers = Vec::new();
    for (key, operator, value) in keywords {
        let base = key.trim_end_matches(['+', '-']);
        if RESERVED_OPTIONS.contains(&base) {
            if base != key || operator != Operator::Set.symbol() {
                return Err(Error::Syntax(format!(
                    "option '{base}' only accepts '=', not '{key}{operator}'"
                )));
            }
            apply_option(&mut call, base, value)?;
        } else {
            modifiers.push((key, operator, value));
        }
    }
    call.options = call.options.validated()?;

    let mut instructions = Vec::with_capacity(modifiers.len() + 1);
    match marker {
        Some(Marker::Only) => instructions.push(Instruction::KeepOnly { keys: names }),
        Some(Marker::Discard) => instructions.push(Instruction::Discard { keys: names }),
        None => {}
    }
    for (raw_key, operator, value) in modifiers {
        let (key, operator) = split_key_operator(&raw_key, &operator)?;
        let values = normalize(&value, &call.options.model_value_field)?;
        trace!(key = %key, %operator, ?values, "parsed instruction");
        instructions.push(match operator {
            Operator::Set => Instruction::Set { key, values },
            Operator::Add => Instruction::Add { key, values },
            Operator::Remove => Instruction::Remove { key, values },
        });
    }
    call.instructions = InstructionSet::new(instructions)?;
    Ok(call)
}

/// Work out the effective operator from a raw key and operator pair.
///
/// `key+` with `=` means `+=`, `key-` with `=` means `-=`.
fn split_key_operator(raw_key: &str, operator: &str) -> Result<(String, Operator)> {
    let operator: Operator = operator.parse()?;
    let (key, suffixed) = match raw_key.chars().last() {
        Some('+') => (&raw_key[..raw_key.len() - 1], Some(Operator::Add)),
        Some('-') => (&raw_key[..raw_key.len() - 1], Some(Operator::Remove)),
        _ => (raw_key, None),
    };
    if key.is_empty() {
        return Err(Error::Syntax(format!(
            "keyword argument '{raw_key}{operator}' has no parameter name"
        )));
    }
    let effective = match (suffixed, operator) {
        (None, operator) => operator,
        (Some(suffixed), Operator::Set) => suffixed,
        (Some(_), operator) => {
            return Err(Error::Syntax(format!(
                "'{raw_key}{operator}' combines a suffixed key with a compound operator"
            )))
        }
    };
    Ok((key.to_string(), effective))
}

fn apply_option(call: &mut ParsedCall, name: &str, value: Value) -> Result<()> {
    match name {
        "remove_blank" => call.options.remove_blank = parse_flag(name, &value)?,
        "remove_utm" => call.options.remove_utm = parse_flag(name, &value)?,
        "model_value_field" => {
            call.options.model_value_field = non_empty_string(name, value)?;
        }
        "source_data" => call.source = Some(SourceData::try_from(value)?),
        _ => call.bind_as = Some(non_empty_string(name, value)?),
    }
    Ok(())
}

fn parse_flag(name: &str, value: &Value) -> Result<bool> {
    match value {
        Value::Bool(flag) => Ok(*flag),
        Value::Str(text) if text.eq_ignore_ascii_case("true") => Ok(true),
        Value::Str(text) if text.eq_ignore_ascii_case("false") => Ok(false),
        other => Err(Error::Syntax(format!(
            "option '{name}' expects a boolean, got a {}",
            other.kind()
        ))),
    }
}

fn non_empty_string(name: &str, value: Value) -> Result<String> {
    match value {
        Value::Str(text) if !text.is_empty() => Ok(text),
        other => Err(Error::Syntax(format!(
            "option '{name}' expects a non-empty string, got a {}",
            other.kind()
        ))),
    }
}
