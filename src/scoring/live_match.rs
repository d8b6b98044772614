use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::settings::MatchSettings;

/// One of the two players in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerSide {
    A,
    B,
}

impl PlayerSide {
    pub fn opponent(self) -> Self {
        match self {
            PlayerSide::A => PlayerSide::B,
            PlayerSide::B => PlayerSide::A,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlayerSide::A => "A",
            PlayerSide::B => "B",
        }
    }
}

/// Score state recorded before a point is applied. The snapshot trail is
/// what makes undo possible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSnapshot {
    pub score_a: i32,
    pub score_b: i32,
    pub timestamp: DateTime<Utc>,
}

impl PointSnapshot {
    pub fn now(score_a: i32, score_b: i32) -> Self {
        Self {
            score_a,
            score_b,
            timestamp: Utc::now(),
        }
    }
}

/// A finished set, including its full point-by-point history from 0-0
/// through the final score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetResult {
    pub set_number: i32,
    pub score_a: i32,
    pub score_b: i32,
    pub winner: PlayerSide,
    pub point_history: Vec<PointSnapshot>,
}

/// The in-progress match aggregate.
///
/// Holds the current set's scores and undo history plus the accumulated set
/// results. All transitions are synchronous, in-memory mutations; callers
/// decide when a set is over (via [`MatchSettings::set_outcome`]) and when
/// to persist. Serializes losslessly so an interrupted match resumes exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveMatch {
    pub player_a_id: i32,
    pub player_b_id: i32,
    pub player_a_name: String,
    pub player_b_name: String,
    pub score_a: i32,
    pub score_b: i32,
    pub start_date: DateTime<Utc>,
    pub settings: MatchSettings,
    pub score_history: Vec<PointSnapshot>,
    pub sets_won_a: i32,
    pub sets_won_b: i32,
    pub completed_sets: Vec<SetResult>,
    pub current_set_number: i32,
}

impl LiveMatch {
    pub fn new(
        player_a_id: i32,
        player_a_name: impl Into<String>,
        player_b_id: i32,
        player_b_name: impl Into<String>,
        settings: MatchSettings,
    ) -> Self {
        Self {
            player_a_id,
            player_b_id,
            player_a_name: player_a_name.into(),
            player_b_name: player_b_name.into(),
            score_a: 0,
            score_b: 0,
            start_date: Utc::now(),
            settings,
            score_history: Vec::new(),
            sets_won_a: 0,
            sets_won_b: 0,
            completed_sets: Vec::new(),
            current_set_number: 1,
        }
    }

    /// Record a point for one side. The pre-point score is pushed onto the
    /// undo history first, then the score increments by exactly one. Scores
    /// are unbounded; deuce play runs past the target until the set outcome
    /// rule says otherwise.
    pub fn add_point(&mut self, side: PlayerSide) {
        self.score_history
            .push(PointSnapshot::now(self.score_a, self.score_b));
        match side {
            PlayerSide::A => self.score_a += 1,
            PlayerSide::B => self.score_b += 1,
        }
    }

    /// Revert the most recent point of the current set. A no-op when no
    /// points have been played; undo never reaches across a completed set
    /// boundary because the history is cleared at each set end.
    pub fn undo_last_point(&mut self) {
        if let Some(last) = self.score_history.pop() {
            self.score_a = last.score_a;
            self.score_b = last.score_b;
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.score_history.is_empty()
    }

    /// Close out the current set for `winner` and open the next one.
    ///
    /// The stored point history starts at 0-0, carries every pre-point
    /// snapshot, and ends with the final score so replays cover the whole
    /// set. Scores reset to 0-0 and the undo history clears.
    pub fn complete_set(&mut self, winner: PlayerSide) {
        let mut point_history = Vec::with_capacity(self.score_history.len() + 2);
        point_history.push(PointSnapshot::now(0, 0));

        point_history.extend(self.score_history.iter().cloned());

        let needs_final = point_history
            .last()
            .map(|last| last.score_a != self.score_a || last.score_b != self.score_b)
            .unwrap_or(true);
        if needs_final {
            point_history.push(PointSnapshot::now(self.score_a, self.score_b));
        }

        self.completed_sets.push(SetResult {
            set_number: self.current_set_number,
            score_a: self.score_a,
            score_b: self.score_b,
            winner,
            point_history,
        });

        match winner {
            PlayerSide::A => self.sets_won_a += 1,
            PlayerSide::B => self.sets_won_b += 1,
        }

        self.score_a = 0;
        self.score_b = 0;
        self.score_history.clear();
        self.current_set_number += 1;
    }

    /// First side to reach the mode's sets-to-win threshold, if any.
    pub fn match_winner(&self) -> Option<PlayerSide> {
        let needed = self.settings.match_mode.sets_to_win();
        if self.sets_won_a >= needed {
            Some(PlayerSide::A)
        } else if self.sets_won_b >= needed {
            Some(PlayerSide::B)
        } else {
            None
        }
    }

    pub fn is_complete(&self) -> bool {
        self.match_winner().is_some()
    }

    pub fn player_id(&self, side: PlayerSide) -> i32 {
        match side {
            PlayerSide::A => self.player_a_id,
            PlayerSide::B => self.player_b_id,
        }
    }

    pub fn player_name(&self, side: PlayerSide) -> &str {
        match side {
            PlayerSide::A => &self.player_a_name,
            PlayerSide::B => &self.player_b_name,
        }
    }

    pub fn sets_won(&self, side: PlayerSide) -> i32 {
        match side {
            PlayerSide::A => self.sets_won_a,
            PlayerSide::B => self.sets_won_b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::settings::MatchMode;

    fn match_with_mode(mode: MatchMode) -> LiveMatch {
        let settings = MatchSettings {
            match_mode: mode,
            ..Default::default()
        };
        LiveMatch::new(1, "Alice", 2, "Bob", settings)
    }

    #[test]
    fn add_point_records_pre_point_score() {
        let mut m = match_with_mode(MatchMode::BestOf1);

        m.add_point(PlayerSide::A);
        m.add_point(PlayerSide::B);

        assert_eq!((m.score_a, m.score_b), (1, 1));
        assert_eq!(m.score_history.len(), 2);
        assert_eq!(
            (m.score_history[0].score_a, m.score_history[0].score_b),
            (0, 0)
        );
        assert_eq!(
            (m.score_history[1].score_a, m.score_history[1].score_b),
            (1, 0)
        );
    }

    #[test]
    fn undo_restores_previous_score_exactly() {
        let mut m = match_with_mode(MatchMode::BestOf1);

        m.add_point(PlayerSide::A);
        m.undo_last_point();

        assert_eq!((m.score_a, m.score_b), (0, 0));
        assert!(m.score_history.is_empty());
        assert!(!m.can_undo());
    }

    #[test]
    fn undo_with_empty_history_is_a_no_op() {
        let mut m = match_with_mode(MatchMode::BestOf1);

        m.undo_last_point();

        assert_eq!((m.score_a, m.score_b), (0, 0));
    }

    #[test]
    fn complete_set_resets_scores_and_advances_set_number() {
        let mut m = match_with_mode(MatchMode::BestOf3);
        for _ in 0..11 {
            m.add_point(PlayerSide::B);
        }

        m.complete_set(PlayerSide::B);

        assert_eq!((m.score_a, m.score_b), (0, 0));
        assert!(m.score_history.is_empty());
        assert_eq!(m.current_set_number, 2);
        assert_eq!(m.sets_won_b, 1);
        assert_eq!(m.completed_sets.len(), 1);
    }

    #[test]
    fn set_point_history_spans_zero_to_final() {
        let mut m = match_with_mode(MatchMode::BestOf1);
        for _ in 0..11 {
            m.add_point(PlayerSide::A);
        }

        m.complete_set(PlayerSide::A);

        let history = &m.completed_sets[0].point_history;
        let first = history.first().unwrap();
        let last = history.last().unwrap();
        assert_eq!((first.score_a, first.score_b), (0, 0));
        assert_eq!((last.score_a, last.score_b), (11, 0));
    }

    #[test]
    fn sets_won_always_matches_completed_set_count() {
        let mut m = match_with_mode(MatchMode::BestOf5);

        m.complete_set(PlayerSide::A);
        m.complete_set(PlayerSide::B);
        m.complete_set(PlayerSide::A);

        assert_eq!(
            m.sets_won_a + m.sets_won_b,
            m.completed_sets.len() as i32
        );
    }

    #[test]
    fn best_of_three_needs_two_sets() {
        let mut m = match_with_mode(MatchMode::BestOf3);
        assert_eq!(m.match_winner(), None);

        m.complete_set(PlayerSide::A);
        assert_eq!(m.match_winner(), None);

        m.complete_set(PlayerSide::B);
        assert_eq!(m.match_winner(), None);

        m.complete_set(PlayerSide::A);
        assert_eq!(m.match_winner(), Some(PlayerSide::A));
        assert!(m.is_complete());
    }

    #[test]
    fn best_of_one_completes_after_single_set() {
        let mut m = match_with_mode(MatchMode::BestOf1);

        m.complete_set(PlayerSide::B);

        assert_eq!(m.match_winner(), Some(PlayerSide::B));
    }

    #[test]
    fn snapshot_round_trips_mid_match() {
        let mut m = match_with_mode(MatchMode::BestOf5);

        // Two finished sets plus an in-progress third.
        for _ in 0..11 {
            m.add_point(PlayerSide::A);
        }
        m.complete_set(PlayerSide::A);
        for _ in 0..11 {
            m.add_point(PlayerSide::B);
        }
        m.complete_set(PlayerSide::B);
        m.add_point(PlayerSide::A);
        m.add_point(PlayerSide::B);
        m.add_point(PlayerSide::A);

        let json = serde_json::to_string(&m).unwrap();
        let restored: LiveMatch = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, m);
    }
}
