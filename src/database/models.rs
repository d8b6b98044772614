use chrono::NaiveDateTime;

use crate::scoring::{MatchMode, SetResult};

#[derive(Debug, Clone)]
pub struct Player {
    pub id: i32,
    pub name: String,
    pub avatar: Option<Vec<u8>>,
    pub elo_rating: i32,
    pub created_at: Option<NaiveDateTime>,
}

/// A finished match as stored. Immutable once written, except deletion;
/// deleting a record never rolls ratings back.
#[derive(Debug, Clone)]
pub struct MatchRecord {
    pub id: i32,
    pub player_a_id: i32,
    pub player_b_id: i32,
    pub score_a: i32,
    pub score_b: i32,
    pub date: NaiveDateTime,
    pub notes: Option<String>,
    pub elo_change_a: i32,
    pub elo_change_b: i32,
    pub duration_secs: i64,
    pub match_mode: MatchMode,
    pub set_scores: Vec<SetResult>,
    pub abandoned: bool,
    pub abandon_reason: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerStats {
    pub matches_played: i32,
    pub wins: i32,
    pub losses: i32,
}

impl PlayerStats {
    pub fn win_rate(&self) -> f64 {
        if self.matches_played == 0 {
            return 0.0;
        }
        f64::from(self.wins) / f64::from(self.matches_played) * 100.0
    }
}

// DTO for history listings
#[derive(Debug, Clone)]
pub struct MatchWithNames {
    pub record: MatchRecord,
    pub player_a_name: String,
    pub player_b_name: String,
}
