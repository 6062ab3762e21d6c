// Property-based tests for the tokeniser and the gate parser: structural
// invariants that should hold across many generated inputs, rather than
// a fixed set of examples.

use hdlschem::gate::{build_gate, collect_leaves};
use hdlschem::lexer::tokenize_text;
use proptest::prelude::*;

fn ident() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,5}".prop_map(|s| s)
}

proptest! {
    /// With no whitespace in the input, the tokeniser partitions every
    /// character into exactly one token (delimiters as one-char tokens,
    /// everything else glued into words) — concatenating the tokens back
    /// together must reproduce the original string exactly.
    #[test]
    fn tokenize_is_a_lossless_partition_when_whitespace_free(
        body in "[a-zA-Z0-9_()~]{1,20}",
        delim in prop::sample::select(vec![',', ':', '?', ';', '&', '|', '+', '-', '*', '=', '.']),
    ) {
        let input = format!("{body}{delim}{body}");
        let tokens = tokenize_text(&input);
        prop_assert_eq!(tokens.concat(), input);
    }

    /// A chain of identifiers joined by one single operator (no mixing)
    /// always parses without error, and `collect_leaves` recovers every
    /// identifier in source order.
    #[test]
    fn single_operator_chain_round_trips_through_collect_leaves(
        names in prop::collection::vec(ident(), 2..6),
        op in prop::sample::select(vec!['&', '|']),
    ) {
        let rhs = names.join(&op.to_string());
        let tokens = tokenize_text(&rhs);
        let gate = build_gate(&tokens).expect("single-operator chain must parse");
        prop_assert_eq!(collect_leaves(&gate), names);
    }

    /// Wrapping a single-operator chain in `~( ... )` always parses, and
    /// the leaf set is unchanged by the negation.
    #[test]
    fn negated_chain_preserves_leaf_set(
        names in prop::collection::vec(ident(), 2..5),
        op in prop::sample::select(vec!['&', '|']),
    ) {
        let rhs = format!("~({})", names.join(&op.to_string()));
        let tokens = tokenize_text(&rhs);
        let gate = build_gate(&tokens).expect("negated single-operator chain must parse");
        prop_assert_eq!(collect_leaves(&gate), names);
    }
}
