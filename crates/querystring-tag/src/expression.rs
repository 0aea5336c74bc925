//! Compiled tag operands.

use tracing::warn;

use querystring_core::Value;

use crate::context::Resolve;
use crate::error::TemplateError;

/// A literal or a variable reference, as written in the tag.
#[derive(Debug, Clone)]
pub enum Expression {
    /// Quoted string, number, `True`, `False` or `None`
    Literal(Value),
    /// Variable path such as `page` or `user.username`
    Variable(String),
}

impl Expression {
    /// Compile a single bit.
    #[must_use]
    pub fn compile(token: &str) -> Self {
        if let Some(text) = unquote(token) {
            return Self::Literal(Value::Str(text));
        }
        match token {
            "None" => return Self::Literal(Value::Null),
            "True" => return Self::Literal(Value::Bool(true)),
            "False" => return Self::Literal(Value::Bool(false)),
            _ => {}
        }
        if let Ok(number) = token.parse::<i64>() {
            return Self::Literal(Value::Int(number));
        }
        if token.contains('.') {
            if let Ok(number) = token.parse::<f64>() {
                return Self::Literal(Value::Float(number));
            }
        }
        Self::Variable(token.to_string())
    }

    /// Resolve against a context.
    ///
    /// An unknown plain identifier stands for its own name, so `page=next`
    /// sets `page` to `"next"` when no `next` variable exists.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::VariableDoesNotExist`] for unknown dotted or filtered paths.
    pub fn resolve(&self, context: &dyn Resolve) -> Result<Value, TemplateError> {
        match self {
            Self::Literal(value) => Ok(value.clone()),
            Self::Variable(path) => match context.lookup(path) {
                Some(value) => Ok(value),
                None if path.contains(['.', '|']) => {
                    Err(TemplateError::VariableDoesNotExist(path.clone()))
                }
                None => {
                    warn!(variable = %path, "unresolved variable used as a literal string");
                    Ok(Value::Str(path.clone()))
                }
            },
        }
    }
}

/// Strip matching quotes, unescaping `\\`, `\'` and `\"`.
fn unquote(token: &str) -> Option<String> {
    let quote = token.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    if token.len() < 2 || !token.ends_with(quote) {
        return None;
    }
    let inner = &token[1..token.len() - 1];
    let mut text = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                text.push(next);
                continue;
            }
        }
        text.push(ch);
    }
    Some(text)
}
