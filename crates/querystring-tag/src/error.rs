//! Errors raised while compiling or resolving a querystring tag.

use thiserror::Error;

use querystring_core::Error as CoreError;

/// Problems specific to the template surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// `as` was not the second-to-last token.
    #[error("'as' must be the last option, followed by a single variable name")]
    MisplacedAs,
    /// A token that is neither a parameter name nor part of a keyword argument.
    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),
    /// A keyword argument with nothing after its operator.
    #[error("keyword argument '{0}' has no value")]
    MissingValue(String),
    /// A dotted or filtered variable that the context cannot resolve.
    #[error("variable '{0}' does not exist")]
    VariableDoesNotExist(String),
    /// A parameter name that did not resolve to exactly one string.
    #[error("'{0}' does not resolve to a single parameter name")]
    InvalidParameterName(String),
}

impl From<TemplateError> for CoreError {
    fn from(err: TemplateError) -> Self {
        match err {
            TemplateError::VariableDoesNotExist(_) => CoreError::Normalization(err.to_string()),
            other => CoreError::Syntax(other.to_string()),
        }
    }
}
