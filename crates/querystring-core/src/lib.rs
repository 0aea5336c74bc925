//! # querystring-core
//!
//! Builds state-preserving query strings (pagination, filters, sort
//! toggles) from an existing set of parameters and a short list of
//! declarative modifications.
//!
//! ```text
//! source data -> store -> only/discard -> set/add/remove -> filter -> "?a=1&b=2"
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types and structured error responses
//! - [`config`] - Per-call render options
//! - [`value`] - Call-site values and their normalization to tokens
//! - [`store`] - Ordered multi-value parameter storage and source data
//! - [`instruction`] - Instructions and the argument parser
//! - [`engine`] - Applies instructions to a store
//! - [`filter`] - Blank and tracking-parameter removal
//! - [`serialize`] - Query string output
//! - [`render`] - The end-to-end pipeline

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod instruction;
pub mod render;
pub mod serialize;
pub mod store;
pub mod value;

// Re-export commonly used types
pub use config::RenderOptions;
pub use error::{Error, Result};
pub use instruction::{parse_arguments, Argument, Instruction, InstructionSet, Marker, Operator};
pub use render::{render, render_arguments, Rendered};
pub use store::{MultiValueStore, SourceData};
pub use value::{normalize, Identifiable, Record, Temporal, Value};
