mod common;

use proptest::prelude::*;

use classguide::catalog::PageParser;
use classguide::error::QueryError;
use classguide::model::Phase;
use classguide::phase::resolve_phase;

fn phase_strategy() -> impl Strategy<Value = Phase> {
    prop::sample::select(Phase::ALL.to_vec())
}

proptest! {
    /// Arbitrary text never panics the parser.
    #[test]
    fn parser_rejects_garbage_without_panicking(markup in ".{0,400}") {
        let _ = PageParser::new(common::WIKI_BASE).parse(&markup);
    }

    /// Markup fragments in random order never panic the parser.
    #[test]
    fn parser_survives_shuffled_structure(
        parts in prop::collection::vec(
            prop::sample::select(vec![
                "<div class=\"mw-parser-output\">",
                "<h2>Pre-Boss</h2>",
                "<h2>Endgame</h2>",
                "<h2>Notes</h2>",
                "<h3>Magic</h3>",
                "<h3>Ranged</h3>",
                "<h4>Buffs</h4>",
                "<dt>Weapons</dt>",
                "<li><a href=\"/wiki/Zenith\">Zenith</a></li>",
                "<li><a href=\"mailto:x\">x</a></li>",
                "<li>no link</li>",
                "</div>",
            ]),
            0..40,
        )
    ) {
        let markup = parts.concat();
        let _ = PageParser::new(common::WIKI_BASE).parse(&markup);
    }

    /// Any prefix of the sample page parses or fails cleanly.
    #[test]
    fn truncated_page_never_panics(cut in 0usize..30_000) {
        let markup = common::fixture_markup();
        let mut end = cut.min(markup.len());
        while !markup.is_char_boundary(end) {
            end -= 1;
        }
        let _ = PageParser::new(common::WIKI_BASE).parse(&markup[..end]);
    }

    /// Canonical names resolve regardless of case and separators.
    #[test]
    fn canonical_names_resolve(
        phase in phase_strategy(),
        upper in any::<bool>(),
        sep in prop::sample::select(vec!["-", " ", "_", "  "]),
    ) {
        let name = phase.name().replace('-', sep);
        let name = if upper { name.to_uppercase() } else { name.to_lowercase() };
        prop_assert_eq!(resolve_phase(&name).unwrap(), phase);
    }

    /// Resolution either succeeds or names the input back.
    #[test]
    fn resolve_reports_input(input in "\\PC{0,24}") {
        match resolve_phase(&input) {
            Ok(_) => {}
            Err(QueryError::UnknownPhase { input: echoed, .. }) => prop_assert_eq!(echoed, input),
            Err(other) => prop_assert!(false, "unexpected error {other:?}"),
        }
    }
}
