use anyhow::{Context, Result};
use rusqlite::{OptionalExtension, params};

use super::connection::DbConn;
use super::models::Player;
use crate::errors::db_context;

const PLAYER_COLUMNS: &str = "id, name, avatar, elo_rating, created_at";

pub fn insert_player(
    conn: &mut DbConn,
    name: &str,
    avatar: Option<&[u8]>,
    starter_rating: i32,
) -> Result<Player> {
    let sql = format!(
        "INSERT INTO players (name, avatar, elo_rating) VALUES (?1, ?2, ?3) RETURNING {PLAYER_COLUMNS}"
    );

    conn.query_row(&sql, params![name, avatar, starter_rating], parse_player_row)
        .with_context(|| db_context("insert", "player"))
}

pub fn find_by_id(conn: &mut DbConn, id: i32) -> Result<Option<Player>> {
    let sql = format!("SELECT {PLAYER_COLUMNS} FROM players WHERE id = ?1");

    conn.query_row(&sql, params![id], parse_player_row)
        .optional()
        .with_context(|| db_context("query", "player by id"))
}

pub fn find_by_name(conn: &mut DbConn, name: &str) -> Result<Option<Player>> {
    let sql = format!("SELECT {PLAYER_COLUMNS} FROM players WHERE name = ?1");

    conn.query_row(&sql, params![name], parse_player_row)
        .optional()
        .with_context(|| db_context("query", "player by name"))
}

pub fn list_all(conn: &mut DbConn) -> Result<Vec<Player>> {
    let sql = format!("SELECT {PLAYER_COLUMNS} FROM players ORDER BY elo_rating DESC, name ASC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], parse_player_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

pub fn update_rating(conn: &mut DbConn, id: i32, elo_rating: i32) -> Result<()> {
    let sql = "UPDATE players SET elo_rating = ?1 WHERE id = ?2";

    let updated = conn
        .execute(sql, params![elo_rating, id])
        .with_context(|| db_context("update", "player rating"))?;
    anyhow::ensure!(updated == 1, crate::errors::player_missing(id));

    Ok(())
}

pub fn delete_player(conn: &mut DbConn, id: i32) -> Result<bool> {
    let sql = "DELETE FROM players WHERE id = ?1";

    let deleted = conn
        .execute(sql, params![id])
        .with_context(|| db_context("delete", "player"))?;

    Ok(deleted == 1)
}

fn parse_player_row(row: &rusqlite::Row) -> rusqlite::Result<Player> {
    Ok(Player {
        id: row.get(0)?,
        name: row.get(1)?,
        avatar: row.get(2)?,
        elo_rating: row.get(3)?,
        created_at: row.get(4)?,
    })
}
