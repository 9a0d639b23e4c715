use fwdoc_migrate::model::Action;
use fwdoc_migrate::parser::{normalize_name, synthetic_rule_name, tokenize};
use proptest::prelude::*;

proptest! {
    #[test]
    fn normalized_names_fit_term_grammar(raw in "\\PC{0,40}") {
        let name = normalize_name(&raw);
        prop_assert!(name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-'));
        prop_assert!(!name.starts_with('-'));
        prop_assert!(!name.ends_with('-'));
        prop_assert!(!name.contains("--"));
    }

    #[test]
    fn normalization_is_idempotent(raw in "\\PC{0,40}") {
        let once = normalize_name(&raw);
        prop_assert_eq!(normalize_name(&once), once);
    }

    #[test]
    fn synthetic_names_are_stable_and_hex(cells in prop::collection::vec("[ -~]{0,12}", 0..6)) {
        let first = synthetic_rule_name(&cells);
        prop_assert_eq!(&first, &synthetic_rule_name(&cells.clone()));
        prop_assert!(first.starts_with("rule-"));
        let suffix = &first["rule-".len()..];
        prop_assert_eq!(suffix.len(), 8);
        prop_assert!(suffix.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn tokens_are_never_empty_or_contain_separators(raw in "[a-z0-9./:, ;\\t-]{0,60}") {
        for token in tokenize(&raw) {
            prop_assert!(!token.is_empty());
            prop_assert!(!token.contains([',', ';', ' ', '\t']));
        }
    }

    #[test]
    fn any_action_text_maps_without_panicking(raw in "\\PC{0,16}") {
        let action = Action::from_text(&raw);
        let lowered = raw.trim().to_ascii_lowercase();
        if !matches!(lowered.as_str(), "deny" | "drop" | "reject") {
            prop_assert_eq!(action, Action::Accept);
        }
    }
}
