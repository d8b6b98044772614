use crate::config::settings::RatingSettings;

use super::types::RatingUpdate;

/// Rating-difference scale: 400 points of rating means 10:1 expected odds.
const RATING_SCALE: f64 = 400.0;

/// Probability that the first player beats the second, given their ratings.
fn expected_score(rating_a: i32, rating_b: i32) -> f64 {
    let exponent = f64::from(rating_b - rating_a) / RATING_SCALE;
    1.0 / (1.0 + 10f64.powf(exponent))
}

/// Standard Elo update for a finished match.
///
/// `score_a`/`score_b` are the match-level result: sets won for multi-set
/// matches, raw points for manually entered results. The higher score counts
/// as the win; equal scores count as a non-win for both sides, so a drawn
/// manual entry costs both players their expected-score share.
pub fn calculate_new_ratings(
    rating_a: i32,
    rating_b: i32,
    score_a: i32,
    score_b: i32,
    settings: &RatingSettings,
) -> RatingUpdate {
    let actual_a = if score_a > score_b { 1.0 } else { 0.0 };
    let actual_b = if score_b > score_a { 1.0 } else { 0.0 };

    let expected_a = expected_score(rating_a, rating_b);
    let expected_b = expected_score(rating_b, rating_a);

    let change_a = (settings.k_factor * (actual_a - expected_a)).round() as i32;
    let change_b = (settings.k_factor * (actual_b - expected_b)).round() as i32;

    RatingUpdate {
        new_rating_a: rating_a + change_a,
        new_rating_b: rating_b + change_b,
        change_a,
        change_b,
    }
}
