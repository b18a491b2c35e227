//! Free-form phase input from admins.

use crate::error::QueryError;
use crate::model::{Phase, fold_name};

/// Similarity at or above which a near-miss is accepted as that phase.
/// Typos score well above it; "post boss" against "pre boss" stays below.
const ACCEPT_SIMILARITY: f64 = 0.75;

/// Similarity at or above which a rejected input gets a suggestion.
const SUGGEST_SIMILARITY: f64 = 0.4;

/// Resolves admin input to a [`Phase`].
///
/// Exact names and aliases win. Otherwise the input is compared against
/// every folded name with normalized Levenshtein similarity: a close
/// enough match is accepted, a weaker one is returned as a suggestion.
///
/// # Errors
///
/// Returns `QueryError::UnknownPhase` when nothing is close enough.
pub fn resolve_phase(input: &str) -> Result<Phase, QueryError> {
    if let Some(phase) = Phase::from_name(input) {
        return Ok(phase);
    }

    let key = fold_name(input);
    let key = key.as_str();
    let best = Phase::ALL
        .into_iter()
        .flat_map(|phase| {
            phase
                .folded_names()
                .map(move |name| (phase, strsim::normalized_levenshtein(key, &name)))
        })
        .max_by(|a, b| a.1.total_cmp(&b.1));

    match best {
        Some((phase, score)) if score >= ACCEPT_SIMILARITY => {
            tracing::debug!(input, phase = %phase, score, "fuzzy phase match");
            Ok(phase)
        }
        Some((phase, score)) if score >= SUGGEST_SIMILARITY => Err(QueryError::UnknownPhase {
            input: input.to_string(),
            suggestion: Some(phase),
        }),
        _ => Err(QueryError::UnknownPhase {
            input: input.to_string(),
            suggestion: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_names_resolve() {
        for phase in Phase::ALL {
            assert_eq!(resolve_phase(phase.name()).unwrap(), phase);
        }
        assert_eq!(resolve_phase("Pre-Mech Bosses").unwrap(), Phase::PreMech);
    }

    #[test]
    fn near_misses_resolve() {
        assert_eq!(resolve_phase("pre mechs").unwrap(), Phase::PreMech);
        assert_eq!(resolve_phase("endgam").unwrap(), Phase::Endgame);
        assert_eq!(resolve_phase("Pre-Plantra").unwrap(), Phase::PrePlantera);
    }

    #[test]
    fn weak_match_suggests() {
        let err = resolve_phase("moon").unwrap_err();
        assert!(
            matches!(
                err,
                QueryError::UnknownPhase {
                    suggestion: Some(Phase::Endgame),
                    ..
                }
            ),
            "got {err:?}"
        );
    }

    #[test]
    fn different_words_only_suggest() {
        for (input, closest) in [
            ("pre hardmode", Phase::PreMech),
            ("post boss", Phase::PreBoss),
            ("post moon", Phase::PrePlantera),
        ] {
            let err = resolve_phase(input).unwrap_err();
            assert!(
                matches!(err, QueryError::UnknownPhase { suggestion: Some(p), .. } if p == closest),
                "{input}: got {err:?}"
            );
        }
    }

    #[test]
    fn typos_of_aliases_resolve() {
        assert_eq!(resolve_phase("pre golme").unwrap(), Phase::PreGolem);
        assert_eq!(resolve_phase("early hardmod").unwrap(), Phase::PreMech);
        assert_eq!(resolve_phase("lategame").unwrap(), Phase::Endgame);
    }

    #[test]
    fn garbage_has_no_suggestion() {
        let err = resolve_phase("xyz").unwrap_err();
        assert!(matches!(err, QueryError::UnknownPhase { suggestion: None, .. }));
        assert!(resolve_phase("").is_err());
    }
}
