//! Decoder — `tag=value` tokenizer
//!
//! Wire format: tokens separated by `|`; the SOH control character is
//! accepted as an alternate separator and normalized to `|` first. Each token
//! is split on its first `=`. Tokens without `=` are skipped. There is no
//! escaping, so a value can never contain a separator.

use std::borrow::Cow;

use fix_types::record::{FieldMap, OrderedFields};

/// Standard FIX field delimiter (ASCII 0x01).
pub const SOH: char = '\u{1}';

/// Visible separator used after normalization.
pub const FIELD_SEPARATOR: char = '|';

/// Replace SOH delimiters with `|`. Borrows when there is nothing to replace.
pub fn normalize(raw: &str) -> Cow<'_, str> {
    if raw.contains(SOH) {
        Cow::Owned(raw.replace(SOH, "|"))
    } else {
        Cow::Borrowed(raw)
    }
}

fn tokens(normalized: &str) -> impl Iterator<Item = (&str, &str)> {
    normalized
        .split(FIELD_SEPARATOR)
        .filter_map(|token| token.split_once('='))
}

/// Decode one record into its fields; a repeated tag keeps the last value.
pub fn decode(raw: &str) -> FieldMap {
    let normalized = normalize(raw);
    let mut fields = FieldMap::new();
    for (tag, value) in tokens(&normalized) {
        fields.insert(tag, value);
    }
    fields
}

/// Decode one record keeping the order in which tags first appear.
pub fn decode_ordered(raw: &str) -> OrderedFields {
    let normalized = normalize(raw);
    let mut fields = OrderedFields::new();
    for (tag, value) in tokens(&normalized) {
        fields.insert(tag, value);
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const NEW_ORDER: &str = "8=FIX.4.4|35=D|55=AAPL|54=1|38=100|44=150.25|10=999";

    #[test]
    fn test_decode_new_order_single() {
        let fields = decode(NEW_ORDER);
        assert_eq!(fields.len(), 7);
        assert_eq!(fields.get("8"), Some("FIX.4.4"));
        assert_eq!(fields.get("35"), Some("D"));
        assert_eq!(fields.get("55"), Some("AAPL"));
        assert_eq!(fields.get("54"), Some("1"));
        assert_eq!(fields.get("38"), Some("100"));
        assert_eq!(fields.get("44"), Some("150.25"));
        assert_eq!(fields.get("10"), Some("999"));
    }

    #[test]
    fn test_decode_soh_delimited() {
        let raw = NEW_ORDER.replace('|', "\u{1}");
        assert_eq!(decode(&raw), decode(NEW_ORDER));
    }

    #[test]
    fn test_decode_mixed_delimiters() {
        let fields = decode("35=D\u{1}55=IBM|54=2");
        assert_eq!(fields.get("55"), Some("IBM"));
        assert_eq!(fields.get("54"), Some("2"));
    }

    #[test]
    fn test_tokens_without_equals_are_skipped() {
        let fields = decode("35=D|garbage||55=MSFT|");
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get("35"), Some("D"));
        assert_eq!(fields.get("55"), Some("MSFT"));
    }

    #[test]
    fn test_split_on_first_equals_only() {
        let fields = decode("58=a=b=c");
        assert_eq!(fields.get("58"), Some("a=b=c"));
    }

    #[test]
    fn test_duplicate_tag_last_wins() {
        let fields = decode("55=AAPL|55=MSFT");
        assert_eq!(fields.get("55"), Some("MSFT"));
    }

    #[test]
    fn test_empty_input() {
        assert!(decode("").is_empty());
    }

    #[test]
    fn test_normalize_borrows_when_clean() {
        assert!(matches!(normalize("35=D|55=X"), Cow::Borrowed(_)));
        assert_eq!(normalize("35=D\u{1}55=X"), "35=D|55=X");
    }

    #[test]
    fn test_decode_ordered_follows_message() {
        let fields = decode_ordered("8=FIX.4.4|55=AAPL|35=D|55=MSFT");
        let tags: Vec<_> = fields.iter().map(|(t, _)| t).collect();
        assert_eq!(tags, vec!["8", "55", "35"]);
        assert_eq!(fields.get("55"), Some("MSFT"));
    }

    fn tag_strategy() -> impl Strategy<Value = String> {
        "[1-9][0-9]{0,3}"
    }

    fn value_strategy() -> impl Strategy<Value = String> {
        "[A-Za-z0-9.=]{0,12}"
    }

    proptest! {
        #[test]
        fn prop_decode_recovers_every_tag_last_wins(
            pairs in proptest::collection::vec((tag_strategy(), value_strategy()), 0..20),
            use_soh in any::<bool>(),
        ) {
            let sep = if use_soh { "\u{1}" } else { "|" };
            let raw = pairs
                .iter()
                .map(|(t, v)| format!("{}={}", t, v))
                .collect::<Vec<_>>()
                .join(sep);

            let fields = decode(&raw);

            let mut expected = std::collections::HashMap::new();
            for (t, v) in &pairs {
                expected.insert(t.clone(), v.clone());
            }
            prop_assert_eq!(fields.len(), expected.len());
            for (t, v) in &expected {
                prop_assert_eq!(fields.get(t), Some(v.as_str()));
            }
        }

        #[test]
        fn prop_decode_never_panics(raw in ".*") {
            let _ = decode(&raw);
            let _ = decode_ordered(&raw);
        }
    }
}
