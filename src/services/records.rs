use anyhow::{Result, anyhow, bail};
use chrono::NaiveDateTime;

use crate::config::settings::RatingSettings;
use crate::database::{self, DbConn, MatchRecord, PlayerStats};
use crate::errors::player_missing;
use crate::rating;
use crate::scoring::MatchMode;

/// Record an already-played match directly, without live scoring.
///
/// Ratings update from the raw scores. No set history exists for a manual
/// entry, so the record carries an empty one.
#[allow(clippy::too_many_arguments)]
pub fn record_manual_match(
    conn: &mut DbConn,
    rating_settings: &RatingSettings,
    player_a_id: i32,
    player_b_id: i32,
    score_a: i32,
    score_b: i32,
    date: NaiveDateTime,
    notes: Option<&str>,
) -> Result<MatchRecord> {
    if player_a_id == player_b_id {
        bail!("A match needs two different players");
    }
    if score_a < 0 || score_b < 0 {
        bail!("Scores cannot be negative");
    }

    let player_a = database::players::find_by_id(conn, player_a_id)?
        .ok_or_else(|| anyhow!(player_missing(player_a_id)))?;
    let player_b = database::players::find_by_id(conn, player_b_id)?
        .ok_or_else(|| anyhow!(player_missing(player_b_id)))?;

    let update = rating::calculate_new_ratings(
        player_a.elo_rating,
        player_b.elo_rating,
        score_a,
        score_b,
        rating_settings,
    );
    database::players::update_rating(conn, player_a.id, update.new_rating_a)?;
    database::players::update_rating(conn, player_b.id, update.new_rating_b)?;

    database::matches::insert_match(
        conn,
        player_a_id,
        player_b_id,
        score_a,
        score_b,
        date,
        notes,
        update.change_a,
        update.change_b,
        0,
        MatchMode::BestOf1,
        &[],
        false,
        None,
    )
}

/// Delete a stored match. Ratings are deliberately left alone; rating
/// history is not reversible through deletion.
pub fn delete_match(conn: &mut DbConn, id: i32) -> Result<bool> {
    database::matches::delete_match(conn, id)
}

pub fn player_stats(conn: &mut DbConn, player_id: i32) -> Result<PlayerStats> {
    database::matches::player_stats(conn, player_id)
}
