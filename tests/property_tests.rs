/// Property-based tests using proptest
/// Tests invariants of the fiscal code validator and the dedup utility that
/// should hold for all inputs
use proptest::prelude::*;
use rust_fiscal_api::fiscal_code::{self, FiscalCodeError};
use rust_fiscal_api::resolver::dedupe_by_key;

// Property: validation should never panic
proptest! {
    #[test]
    fn validate_never_panics(input in "\\PC*") {
        let _ = fiscal_code::validate(&input);
    }

    #[test]
    fn is_searchable_never_panics(input in "\\PC*") {
        let _ = fiscal_code::is_searchable(&input);
    }

    #[test]
    fn format_never_panics(input in "\\PC*") {
        let _ = fiscal_code::format(&input);
    }
}

// Property: length errors for any cleaned input that is not 16 characters
proptest! {
    #[test]
    fn short_alphanumeric_input_fails_with_length(input in "[A-Z0-9]{1,15}") {
        let expected = input.len();
        prop_assert_eq!(
            fiscal_code::validate(&input),
            Err(FiscalCodeError::Length(expected))
        );
    }

    #[test]
    fn long_alphanumeric_input_fails_with_length(input in "[A-Z0-9]{17,40}") {
        let expected = input.len();
        prop_assert_eq!(
            fiscal_code::validate(&input),
            Err(FiscalCodeError::Length(expected))
        );
    }

    #[test]
    fn whitespace_is_ignored_for_length(body in "[A-Z0-9]{1,15}") {
        // Pad with blanks; the cleaned length decides the error
        let padded = format!("  {}  ", body);
        prop_assert_eq!(
            fiscal_code::validate(&padded),
            Err(FiscalCodeError::Length(body.len()))
        );
    }
}

// Property: structurally valid codes validate and normalize
proptest! {
    #[test]
    fn structurally_valid_codes_pass(
        code in "[A-Z]{6}[0-9]{2}[A-Z][0-9]{2}[A-Z][0-9]{3}[A-Z]"
    ) {
        prop_assert_eq!(fiscal_code::validate(&code), Ok(code.clone()));

        // The lowercase rendering validates to the same canonical form
        let lower = code.to_lowercase();
        prop_assert_eq!(fiscal_code::validate(&lower), Ok(code));
    }

    #[test]
    fn all_digit_input_of_right_length_fails_format(code in "[0-9]{16}") {
        prop_assert_eq!(fiscal_code::validate(&code), Err(FiscalCodeError::Format));
    }

    #[test]
    fn all_letter_input_of_right_length_fails_format(code in "[A-Z]{16}") {
        prop_assert_eq!(fiscal_code::validate(&code), Err(FiscalCodeError::Format));
    }
}

// Property: display formatting is idempotent and preserves content
proptest! {
    #[test]
    fn format_is_idempotent(input in "[A-Za-z0-9 ]{0,40}") {
        let once = fiscal_code::format(&input);
        let twice = fiscal_code::format(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn format_preserves_characters(code in "[A-Z]{6}[0-9]{2}[A-Z][0-9]{2}[A-Z][0-9]{3}[A-Z]") {
        let formatted = fiscal_code::format(&code);
        let stripped: String = formatted.chars().filter(|c| !c.is_whitespace()).collect();
        prop_assert_eq!(stripped, code);
    }
}

// Property: the searchable gate sits exactly at 3 cleaned characters
proptest! {
    #[test]
    fn searchable_boundary(input in "[A-Za-z0-9]{0,10}") {
        prop_assert_eq!(fiscal_code::is_searchable(&input), input.len() >= 3);
    }
}

// Property: dedup by natural key
proptest! {
    #[test]
    fn dedupe_is_idempotent(items in proptest::collection::vec((0u8..20, any::<u32>()), 0..50)) {
        let once = dedupe_by_key(items, |(k, _)| *k);
        let twice = dedupe_by_key(once.clone(), |(k, _)| *k);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn dedupe_yields_unique_keys(items in proptest::collection::vec((0u8..20, any::<u32>()), 0..50)) {
        let deduped = dedupe_by_key(items, |(k, _)| *k);
        let mut keys: Vec<u8> = deduped.iter().map(|(k, _)| *k).collect();
        let before = keys.len();
        keys.sort_unstable();
        keys.dedup();
        prop_assert_eq!(before, keys.len());
    }

    #[test]
    fn dedupe_never_grows_the_list(items in proptest::collection::vec((0u8..20, any::<u32>()), 0..50)) {
        let len_before = items.len();
        let deduped = dedupe_by_key(items, |(k, _)| *k);
        prop_assert!(deduped.len() <= len_before);
    }
}
