use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::params;
use rusqlite::types::Type;

use super::connection::DbConn;
use super::models::{MatchRecord, MatchWithNames, PlayerStats};
use crate::errors::db_context;
use crate::scoring::{MatchMode, SetResult};

const MATCH_COLUMNS: &str = "id, player_a_id, player_b_id, score_a, score_b, date, notes, \
     elo_change_a, elo_change_b, duration_secs, match_mode, set_scores, abandoned, \
     abandon_reason, created_at";

#[allow(clippy::too_many_arguments)]
pub fn insert_match(
    conn: &mut DbConn,
    player_a_id: i32,
    player_b_id: i32,
    score_a: i32,
    score_b: i32,
    date: NaiveDateTime,
    notes: Option<&str>,
    elo_change_a: i32,
    elo_change_b: i32,
    duration_secs: i64,
    match_mode: MatchMode,
    set_scores: &[SetResult],
    abandoned: bool,
    abandon_reason: Option<&str>,
) -> Result<MatchRecord> {
    let sql = format!(
        "INSERT INTO matches (player_a_id, player_b_id, score_a, score_b, date, notes, \
         elo_change_a, elo_change_b, duration_secs, match_mode, set_scores, abandoned, \
         abandon_reason) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13) \
         RETURNING {MATCH_COLUMNS}"
    );

    let set_scores_json =
        serde_json::to_string(set_scores).with_context(|| db_context("encode", "set scores"))?;

    conn.query_row(
        &sql,
        params![
            player_a_id,
            player_b_id,
            score_a,
            score_b,
            date,
            notes,
            elo_change_a,
            elo_change_b,
            duration_secs,
            match_mode.as_str(),
            set_scores_json,
            abandoned,
            abandon_reason
        ],
        parse_match_row,
    )
    .with_context(|| db_context("insert", "match"))
}

// Names fall back to a placeholder so history survives player deletion.
pub fn list_all(conn: &mut DbConn) -> Result<Vec<MatchWithNames>> {
    let sql = format!(
        "SELECT {}, COALESCE(pa.name, 'deleted player'), COALESCE(pb.name, 'deleted player') \
         FROM matches m \
         LEFT JOIN players pa ON m.player_a_id = pa.id \
         LEFT JOIN players pb ON m.player_b_id = pb.id \
         ORDER BY m.date DESC",
        prefixed_match_columns()
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], parse_match_with_names_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

pub fn list_by_player(conn: &mut DbConn, player_id: i32) -> Result<Vec<MatchWithNames>> {
    let sql = format!(
        "SELECT {}, COALESCE(pa.name, 'deleted player'), COALESCE(pb.name, 'deleted player') \
         FROM matches m \
         LEFT JOIN players pa ON m.player_a_id = pa.id \
         LEFT JOIN players pb ON m.player_b_id = pb.id \
         WHERE m.player_a_id = ?1 OR m.player_b_id = ?1 \
         ORDER BY m.date DESC",
        prefixed_match_columns()
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![player_id], parse_match_with_names_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

pub fn delete_match(conn: &mut DbConn, id: i32) -> Result<bool> {
    let sql = "DELETE FROM matches WHERE id = ?1";

    let deleted = conn
        .execute(sql, params![id])
        .with_context(|| db_context("delete", "match"))?;

    Ok(deleted == 1)
}

/// Win/loss tally for a player over stored records. Abandoned matches are
/// recorded but never counted.
pub fn player_stats(conn: &mut DbConn, player_id: i32) -> Result<PlayerStats> {
    let sql = "
        SELECT
            COUNT(*),
            COALESCE(SUM(CASE WHEN (player_a_id = ?1 AND score_a > score_b)
                               OR (player_b_id = ?1 AND score_b > score_a)
                              THEN 1 ELSE 0 END), 0)
        FROM matches
        WHERE (player_a_id = ?1 OR player_b_id = ?1) AND abandoned = 0
    ";

    let (matches_played, wins): (i32, i32) = conn
        .query_row(sql, params![player_id], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .with_context(|| db_context("aggregate", "player stats"))?;

    Ok(PlayerStats {
        matches_played,
        wins,
        losses: matches_played - wins,
    })
}

fn prefixed_match_columns() -> String {
    MATCH_COLUMNS
        .split(", ")
        .map(|col| format!("m.{}", col.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_match_row(row: &rusqlite::Row) -> rusqlite::Result<MatchRecord> {
    let mode_tag: String = row.get(10)?;
    let set_scores_json: String = row.get(11)?;

    let set_scores: Vec<SetResult> = serde_json::from_str(&set_scores_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(11, Type::Text, Box::new(e)))?;

    Ok(MatchRecord {
        id: row.get(0)?,
        player_a_id: row.get(1)?,
        player_b_id: row.get(2)?,
        score_a: row.get(3)?,
        score_b: row.get(4)?,
        date: row.get(5)?,
        notes: row.get(6)?,
        elo_change_a: row.get(7)?,
        elo_change_b: row.get(8)?,
        duration_secs: row.get(9)?,
        match_mode: MatchMode::from_str(&mode_tag).unwrap_or_default(),
        set_scores,
        abandoned: row.get(12)?,
        abandon_reason: row.get(13)?,
        created_at: row.get(14)?,
    })
}

fn parse_match_with_names_row(row: &rusqlite::Row) -> rusqlite::Result<MatchWithNames> {
    Ok(MatchWithNames {
        record: parse_match_row(row)?,
        player_a_name: row.get(15)?,
        player_b_name: row.get(16)?,
    })
}
