//! Render entry points.
//!
//! [`render`] runs the pipeline on already-built instructions;
//! [`render_arguments`] starts from the call-site argument list and honours
//! `source_data=` and `as=`.

use tracing::debug;

use crate::config::RenderOptions;
use crate::engine::apply;
use crate::error::Result;
use crate::filter::filter;
use crate::instruction::{parse_arguments, Argument, InstructionSet};
use crate::serialize::serialize;
use crate::store::SourceData;

/// Result of a render call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// Output to embed where the call appears
    Inline(String),
    /// Output to bind to a variable; nothing is embedded
    Bound {
        /// Variable name
        name: String,
        /// Rendered query string
        value: String,
    },
}

impl Rendered {
    /// Text to embed at the call site (empty when bound).
    #[must_use]
    pub fn output(&self) -> &str {
        match self {
            Self::Inline(value) => value,
            Self::Bound { .. } => "",
        }
    }

    /// The rendered query string, bound or not.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Inline(value) | Self::Bound { value, .. } => value,
        }
    }
}

/// Seed a store from `source`, apply `instructions`, filter and serialize.
///
/// `source` is copied; it is never modified.
///
/// # Errors
///
/// Returns any normalization or conflict error raised along the way. No
/// partial output is produced.
pub fn render(
    source: &SourceData,
    instructions: &InstructionSet,
    options: &RenderOptions,
) -> Result<String> {
    let store = source.to_store(&options.model_value_field)?;
    debug!(
        source_keys = store.len(),
        instructions = instructions.len(),
        "rendering querystring"
    );
    let store = apply(store, instructions)?;
    let store = filter(store, options);
    let output = serialize(&store);
    debug!(keys = store.len(), length = output.len(), "rendered querystring");
    Ok(output)
}

/// Parse call-site arguments and render them.
///
/// `fallback_source` is used unless the arguments carry `source_data=`;
/// `defaults` is overridden by any option keywords.
///
/// # Errors
///
/// Returns syntax errors from parsing and any error from [`render`].
pub fn render_arguments(
    arguments: Vec<Argument>,
    fallback_source: &SourceData,
    defaults: &RenderOptions,
) -> Result<Rendered> {
    let call = parse_arguments(arguments, defaults)?;
    let source = call.source.as_ref().unwrap_or(fallback_source);
    let value = render(source, &call.instructions, &call.options)?;
    Ok(match call.bind_as {
        Some(name) => Rendered::Bound { name, value },
        None => Rendered::Inline(value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::Marker;
    use crate::store::MultiValueStore;
    use crate::Error;

    #[test]
    fn empty_instructions_equal_filtered_source() {
        let source = SourceData::from("q=test&empty=&utm_source=x&b=1&b=2");
        let output = render(&source, &InstructionSet::empty(), &RenderOptions::default()).unwrap();
        assert_eq!(output, "?q=test&b=1&b=2");
    }

    #[test]
    fn render_arguments_inline() {
        let rendered = render_arguments(
            vec![Argument::keyword("foo", "=", "bar")],
            &SourceData::from("?q=test&baz=1"),
            &RenderOptions::default(),
        )
        .unwrap();
        assert_eq!(rendered, Rendered::Inline("?q=test&baz=1&foo=bar".to_string()));
        assert_eq!(rendered.output(), "?q=test&baz=1&foo=bar");
    }

    #[test]
    fn render_arguments_bound() {
        let rendered = render_arguments(
            vec![
                Argument::Marker(Marker::Discard),
                Argument::name("page"),
                Argument::keyword("as", "=", "first_page"),
            ],
            &SourceData::from("q=x&page=4"),
            &RenderOptions::default(),
        )
        .unwrap();
        assert_eq!(rendered.output(), "");
        assert_eq!(rendered.value(), "?q=x");
        assert!(matches!(rendered, Rendered::Bound { ref name, .. } if name == "first_page"));
    }

    #[test]
    fn source_data_argument_beats_fallback() {
        let rendered = render_arguments(
            vec![Argument::keyword("source_data", "=", "a=1")],
            &SourceData::from("b=2"),
            &RenderOptions::default(),
        )
        .unwrap();
        assert_eq!(rendered.value(), "?a=1");
    }

    #[test]
    fn fallback_store_is_not_mutated() {
        let store: MultiValueStore = [("q", "x")].into_iter().collect();
        let source = SourceData::from(store.clone());
        let first = render_arguments(
            vec![Argument::keyword("page", "=", 2)],
            &source,
            &RenderOptions::default(),
        )
        .unwrap();
        let second = render_arguments(
            vec![Argument::keyword("page", "=", 3)],
            &source,
            &RenderOptions::default(),
        )
        .unwrap();
        assert_eq!(first.value(), "?q=x&page=2");
        assert_eq!(second.value(), "?q=x&page=3");
        assert!(matches!(source, SourceData::Store(ref s) if *s == store));
    }

    #[test]
    fn errors_produce_no_output() {
        let err = render_arguments(
            vec![Argument::keyword("page", "^=", 2)],
            &SourceData::Empty,
            &RenderOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Syntax(_)));
    }
}
