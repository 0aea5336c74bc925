//! Template tag front-end for `querystring-core`.
//!
//! Parses tag source such as
//!
//! ```text
//! {% querystring only 'q' group page=next_page tags+=tag as next_url %}
//! ```
//!
//! resolves its operands against a rendering context, and renders the
//! result inline or binds it to a variable.

#![deny(missing_docs)]

mod context;
mod error;
mod expression;
mod node;
mod tokenize;

pub use context::{Context, Resolve};
pub use error::TemplateError;
pub use expression::Expression;
pub use node::{QuerystringNode, TAG_NAME};
pub use tokenize::tokenize;

/// Convenient result alias that reuses the core error type.
pub type Result<T> = querystring_core::Result<T>;
