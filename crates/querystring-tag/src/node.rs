//! The compiled `{% querystring %}` tag.

use querystring_core::instruction::RESERVED_OPTIONS;
use querystring_core::{
    normalize, render_arguments, Argument, Marker, Operator, RenderOptions, Rendered, SourceData,
    Value,
};
use tracing::debug;

use crate::context::{Context, Resolve};
use crate::error::TemplateError;
use crate::expression::Expression;
use crate::tokenize::tokenize;
use crate::Result;

/// Tag name accepted as the first bit.
pub const TAG_NAME: &str = "querystring";

/// A keyword argument as written in the tag.
#[derive(Debug, Clone)]
struct KeywordBit {
    /// Key exactly as written, before resolution
    token: String,
    key: Expression,
    operator: String,
    value: Expression,
}

/// A bit of the leading `only`/`discard` section.
#[derive(Debug, Clone)]
enum ScopeBit {
    Marker(Marker),
    Name(Expression),
}

/// A parsed tag, ready to render any number of times.
#[derive(Debug, Clone)]
pub struct QuerystringNode {
    scope: Vec<ScopeBit>,
    keywords: Vec<KeywordBit>,
    target_variable: Option<String>,
    defaults: RenderOptions,
}

impl QuerystringNode {
    /// Parse tag contents, with or without the leading tag name.
    ///
    /// # Errors
    ///
    /// Returns a syntax error for a misplaced `as`, stray tokens, or a
    /// keyword argument without a value.
    pub fn parse(source: &str) -> Result<Self> {
        Self::from_bits(tokenize(source))
    }

    /// Build a node from already tokenized bits.
    ///
    /// # Errors
    ///
    /// See [`QuerystringNode::parse`].
    pub fn from_bits(mut bits: Vec<String>) -> Result<Self> {
        if bits.first().map(String::as_str) == Some(TAG_NAME) {
            bits.remove(0);
        }

        let mut target_variable = None;
        if bits.iter().any(|bit| bit == "as") {
            let len = bits.len();
            if len < 2 || bits[len - 2] != "as" {
                return Err(TemplateError::MisplacedAs.into());
            }
            target_variable = bits.pop();
            bits.pop();
        }

        // Everything before the first keyword argument belongs to the
        // scope section, provided it opens with a marker.
        let mut rest = bits.as_slice();
        let mut scope = Vec::new();
        if rest.first().is_some_and(|first| first.parse::<Marker>().is_ok()) {
            while let Some(bit) = rest.first() {
                if rest.get(1).is_some_and(|next| is_operator(next)) {
                    break;
                }
                scope.push(match bit.parse::<Marker>() {
                    Ok(marker) => ScopeBit::Marker(marker),
                    Err(_) => ScopeBit::Name(Expression::compile(bit)),
                });
                rest = &rest[1..];
            }
        }

        Ok(Self {
            scope,
            keywords: group_keywords(rest)?,
            target_variable,
            defaults: RenderOptions::default(),
        })
    }

    /// Use `defaults` for options the tag does not set itself.
    #[must_use]
    pub fn with_defaults(mut self, defaults: RenderOptions) -> Self {
        self.defaults = defaults;
        self
    }

    /// Variable name given with `as`, if any.
    #[must_use]
    pub fn target_variable(&self) -> Option<&str> {
        self.target_variable.as_deref()
    }

    /// Resolve every name and value against `context`.
    ///
    /// # Errors
    ///
    /// Returns an error if a dotted variable is missing or a key does not
    /// resolve to a single string.
    pub fn resolve_arguments(&self, context: &dyn Resolve) -> Result<Vec<Argument>> {
        let values = self
            .keywords
            .iter()
            .map(|keyword| keyword.value.resolve(context))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let model_value_field = self.model_value_field(&values);

        let mut arguments = Vec::with_capacity(self.scope.len() + self.keywords.len() + 1);
        for bit in &self.scope {
            arguments.push(match bit {
                ScopeBit::Marker(marker) => Argument::Marker(*marker),
                ScopeBit::Name(name) => {
                    Argument::Name(resolve_key(name, context, model_value_field)?)
                }
            });
        }
        for (keyword, value) in self.keywords.iter().zip(&values) {
            let key = if is_reserved(&keyword.token) {
                keyword.token.clone()
            } else {
                resolve_key(&keyword.key, context, model_value_field)?
            };
            arguments.push(Argument::Keyword {
                key,
                operator: keyword.operator.clone(),
                value: value.clone(),
            });
        }
        if let Some(name) = &self.target_variable {
            arguments.push(Argument::keyword("as", Operator::Set.symbol(), name.as_str()));
        }
        Ok(arguments)
    }

    /// Field used for identifiable keys: the tag's own option, else the defaults.
    fn model_value_field<'a>(&'a self, values: &'a [Value]) -> &'a str {
        self.keywords
            .iter()
            .zip(values)
            .find_map(|(keyword, value)| match value {
                Value::Str(field) if keyword.token == "model_value_field" && !field.is_empty() => {
                    Some(field.as_str())
                }
                _ => None,
            })
            .unwrap_or(&self.defaults.model_value_field)
    }

    /// Render against any resolver, returning the output and optional binding.
    ///
    /// Without `source_data` the resolver's request query seeds the store.
    ///
    /// # Errors
    ///
    /// Returns resolution, syntax, normalization and source errors.
    pub fn evaluate(&self, context: &dyn Resolve) -> Result<Rendered> {
        let arguments = self.resolve_arguments(context)?;
        let fallback = context
            .request_query()
            .map_or(SourceData::Empty, SourceData::Query);
        render_arguments(arguments, &fallback, &self.defaults)
    }

    /// Render into `context`: returns the query string, or binds it and returns `""`.
    ///
    /// # Errors
    ///
    /// See [`QuerystringNode::evaluate`].
    pub fn render(&self, context: &mut Context) -> Result<String> {
        match self.evaluate(&*context)? {
            Rendered::Inline(output) => Ok(output),
            Rendered::Bound { name, value } => {
                debug!(variable = %name, "bound querystring to context");
                context.insert(name, value);
                Ok(String::new())
            }
        }
    }
}

fn is_operator(bit: &str) -> bool {
    Operator::ALL.iter().any(|operator| operator.symbol() == bit)
}

fn is_reserved(token: &str) -> bool {
    RESERVED_OPTIONS.contains(&token.trim_end_matches(['+', '-']))
}

/// Group the remaining bits into `key operator value` triples.
fn group_keywords(bits: &[String]) -> Result<Vec<KeywordBit>> {
    let mut keywords = Vec::new();
    let mut index = 0;
    while index < bits.len() {
        let token = &bits[index];
        let operator = match bits.get(index + 1) {
            Some(next) if is_operator(next) => next,
            _ => return Err(TemplateError::UnexpectedToken(token.clone()).into()),
        };
        let value = bits
            .get(index + 2)
            .filter(|value| !is_operator(value))
            .ok_or_else(|| TemplateError::MissingValue(format!("{token}{operator}")))?;
        keywords.push(KeywordBit {
            token: token.clone(),
            key: Expression::compile(token),
            operator: operator.clone(),
            value: Expression::compile(value),
        });
        index += 3;
    }
    Ok(keywords)
}

/// Resolve a parameter-name expression to one string.
fn resolve_key(
    expression: &Expression,
    context: &dyn Resolve,
    model_value_field: &str,
) -> Result<String> {
    let value = expression.resolve(context)?;
    match value {
        Value::Str(name) => Ok(name),
        other => match normalize(&other, model_value_field)?.as_slice() {
            [name] => Ok(name.clone()),
            _ => Err(TemplateError::InvalidParameterName(format!("{other:?}")).into()),
        },
    }
}
