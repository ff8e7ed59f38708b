//! Ranking score arithmetic.

use tracing::instrument;

use crate::db::OutcomeCounts;

/// Ranking score for a user's outcome counts: `5*wins + 3*wins + 1*losses`.
///
/// Draws do not contribute and wins are counted twice over. This is the
/// published scoring rule; it is kept exactly as stated until the product
/// owner decides otherwise.
#[instrument]
#[allow(clippy::identity_op)]
pub fn ranking_score(counts: &OutcomeCounts) -> i32 {
    5 * counts.wins() + 3 * counts.wins() + 1 * counts.losses()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formula_is_literal() {
        // 5*2 + 3*2 + 1*1, the draw is ignored.
        assert_eq!(ranking_score(&OutcomeCounts::new(2, 1, 1)), 17);
        assert_eq!(ranking_score(&OutcomeCounts::new(0, 0, 3)), 3);
    }

    #[test]
    fn test_draws_do_not_score() {
        assert_eq!(ranking_score(&OutcomeCounts::new(0, 10, 0)), 0);
    }

    #[test]
    fn test_no_games_scores_zero() {
        assert_eq!(ranking_score(&OutcomeCounts::default()), 0);
    }
}
