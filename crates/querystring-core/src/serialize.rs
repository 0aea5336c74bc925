//! Query string output.

use url::form_urlencoded;

use crate::store::MultiValueStore;

/// Render `store` as `?key=value&...`, or `""` when it is empty.
///
/// Keys and values are form-urlencoded, so a space becomes `+`. The output
/// is not HTML-escaped.
#[must_use]
pub fn serialize(store: &MultiValueStore) -> String {
    if store.is_empty() {
        return String::new();
    }
    // The `?` is a prefix, not a preceding pair, so no separator follows it.
    let mut serializer = form_urlencoded::Serializer::for_suffix(String::from("?"), 1);
    serializer.extend_pairs(store.pairs());
    serializer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_renders_nothing() {
        assert_eq!(serialize(&MultiValueStore::new()), "");
    }

    #[test]
    fn keeps_key_and_value_order() {
        let store: MultiValueStore = [("b", "2"), ("a", "1"), ("b", "3")].into_iter().collect();
        assert_eq!(serialize(&store), "?b=2&b=3&a=1");
    }

    #[test]
    fn encodes_reserved_characters() {
        let store: MultiValueStore = [("q", "fish & chips"), ("path", "a/b?c=d"), ("name", "Zoë")]
            .into_iter()
            .collect();
        assert_eq!(
            serialize(&store),
            "?q=fish+%26+chips&path=a%2Fb%3Fc%3Dd&name=Zo%C3%AB"
        );
    }

    #[test]
    fn output_parses_back_to_same_store() {
        let store: MultiValueStore = [("q", "a b+c"), ("k y", "100%"), ("flag", "true")]
            .into_iter()
            .collect();
        let rendered = serialize(&store);
        assert_eq!(rendered, "?q=a+b%2Bc&k+y=100%25&flag=true");
        assert_eq!(MultiValueStore::from_query(&rendered), store);
    }

    #[test]
    fn single_pair_has_no_leading_separator() {
        let store: MultiValueStore = [("q", "test")].into_iter().collect();
        assert_eq!(serialize(&store), "?q=test");
    }

    #[test]
    fn blank_values_render_with_equals() {
        let store: MultiValueStore = [("a", ""), ("b", "1")].into_iter().collect();
        assert_eq!(serialize(&store), "?a=&b=1");
    }
}
