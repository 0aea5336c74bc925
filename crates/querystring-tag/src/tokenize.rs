//! Splits tag source into bits.
//!
//! Spacing around operators is free-form, so `a+=1`, `a += 1`, `a+= 1` and
//! `a +=1` all produce `["a", "+=", "1"]`.

use std::sync::LazyLock;

use querystring_core::Operator;
use regex::Regex;

/// Whitespace-separated tokens, with quoted sections kept whole.
static SMART_SPLIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:[^\s'"]*(?:"(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*')[^\s'"]*)+|\S+"#)
        .expect("smart split pattern is valid")
});

/// `key<operator>value` packed into a single token.
static KWARG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?s)(?P<key>[^-+=\s'"][^=\s'"]*?)(?P<operator>-=|\+=|=)(?P<value>.+)$"#)
        .expect("keyword pattern is valid")
});

/// Split tag contents into bits, separating operators from keys and values.
#[must_use]
pub fn tokenize(source: &str) -> Vec<String> {
    let mut bits = Vec::new();
    for token in SMART_SPLIT.find_iter(source).map(|m| m.as_str()) {
        split_operator(token, &mut bits);
    }
    bits
}

fn split_operator(token: &str, bits: &mut Vec<String>) {
    if Operator::ALL.iter().any(|operator| operator.symbol() == token) {
        bits.push(token.to_string());
        return;
    }

    if let Some(captures) = KWARG.captures(token) {
        bits.extend(
            ["key", "operator", "value"]
                .into_iter()
                .map(|name| captures[name].to_string()),
        );
        return;
    }

    for operator in Operator::ALL.map(|operator| operator.symbol()) {
        if let Some(rest) = token.strip_prefix(operator) {
            bits.push(operator.to_string());
            bits.push(rest.to_string());
            return;
        }
        if let Some(rest) = token.strip_suffix(operator) {
            bits.push(rest.to_string());
            bits.push(operator.to_string());
            return;
        }
    }

    bits.push(token.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(source: &str) -> Vec<String> {
        tokenize(source)
    }

    #[test]
    fn spacing_variations_are_equivalent() {
        for source in ["param+=''", "param += ''", "param+= ''", "param +=''"] {
            assert_eq!(bits(source), vec!["param", "+=", "''"], "source: {source}");
        }
        for source in ["p-=x", "p -= x", "p-= x", "p -=x"] {
            assert_eq!(bits(source), vec!["p", "-=", "x"], "source: {source}");
        }
    }

    #[test]
    fn quoted_values_keep_spaces() {
        assert_eq!(bits(r#"q='a b' t="c d""#), vec!["q", "=", "'a b'", "t", "=", "\"c d\""]);
    }

    #[test]
    fn hyphenated_keys_survive() {
        assert_eq!(bits("sort-by=name"), vec!["sort-by", "=", "name"]);
        assert_eq!(bits("sort-by-=name"), vec!["sort-by", "-=", "name"]);
    }

    #[test]
    fn markers_and_as_are_plain_bits() {
        assert_eq!(
            bits("querystring only 'q' group page=2 as next"),
            vec!["querystring", "only", "'q'", "group", "page", "=", "2", "as", "next"]
        );
    }

    #[test]
    fn trailing_operator_is_split() {
        assert_eq!(bits("foo="), vec!["foo", "="]);
    }

    #[test]
    fn empty_source() {
        assert!(bits("   ").is_empty());
    }
}
