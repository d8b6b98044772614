use std::sync::mpsc::Receiver;

use anyhow::{Result, anyhow, bail};
use chrono::Utc;
use log::warn;

use crate::cache::Cache;
use crate::config::AppConfig;
use crate::database::{self, DbConn, MatchRecord, Player};
use crate::errors::player_missing;
use crate::rating;
use crate::scoring::{EventBus, LiveMatch, MatchEvent, MatchSettings, PlayerSide};

/// Snapshot-store key the in-progress match lives under.
pub const ACTIVE_MATCH_KEY: &str = "active_match";

/// Orchestrates the one active match: starting, point-by-point scoring with
/// set/match completion, undo, finalization into a stored record, and
/// resume after a restart.
///
/// Every mutation is followed by a snapshot write before the next one is
/// accepted, so a crash loses at most the latest event. Snapshot failures
/// are logged and swallowed; the match continues in memory.
pub struct MatchSession {
    config: AppConfig,
    cache: Cache,
    events: EventBus,
    active: Option<LiveMatch>,
}

impl MatchSession {
    /// Build a session, restoring any persisted match snapshot. The winner
    /// check re-runs once on the restored state so a match interrupted with
    /// a winning score on the board completes the moment it is reloaded.
    pub fn new(config: AppConfig) -> Result<Self> {
        let cache = Cache::new(&config.storage.cache_dir)?;

        let active = match cache.load(ACTIVE_MATCH_KEY) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Discarding unreadable match snapshot: {e:#}");
                None
            }
        };

        let mut session = Self {
            config,
            cache,
            events: EventBus::new(),
            active,
        };
        session.resume_check();
        Ok(session)
    }

    pub fn active(&self) -> Option<&LiveMatch> {
        self.active.as_ref()
    }

    /// Receive [`MatchEvent`]s for every transition published by this
    /// session.
    pub fn subscribe(&mut self) -> Receiver<MatchEvent> {
        self.events.subscribe()
    }

    /// Begin a fresh match between two registered players.
    pub fn start(
        &mut self,
        player_a: &Player,
        player_b: &Player,
        settings: MatchSettings,
    ) -> Result<()> {
        if player_a.id == player_b.id {
            bail!("A match needs two different players");
        }

        let live = LiveMatch::new(
            player_a.id,
            player_a.name.clone(),
            player_b.id,
            player_b.name.clone(),
            settings,
        );
        self.adopt(live)
    }

    /// Install an already-built match (a rematch) as the active one.
    pub fn adopt(&mut self, live: LiveMatch) -> Result<()> {
        if self.active.is_some() {
            bail!("A match is already in progress; finish or abandon it first");
        }

        self.active = Some(live);
        self.save_snapshot();
        Ok(())
    }

    /// Score one point and run the progression rules: set completion, then
    /// match completion. Refused once the match has a winner.
    pub fn score_point(&mut self, side: PlayerSide) -> Result<()> {
        let mut pending = Vec::new();

        {
            let m = self
                .active
                .as_mut()
                .ok_or_else(|| anyhow!("No match in progress"))?;
            if m.is_complete() {
                bail!("The match is already decided; finish or abandon it");
            }

            m.add_point(side);
            pending.push(MatchEvent::PointScored {
                side,
                score_a: m.score_a,
                score_b: m.score_b,
            });

            if let Some(winner) = m.settings.set_outcome(m.score_a, m.score_b) {
                let set_number = m.current_set_number;
                let (final_a, final_b) = (m.score_a, m.score_b);
                m.complete_set(winner);
                pending.push(MatchEvent::SetCompleted {
                    set_number,
                    winner,
                    score_a: final_a,
                    score_b: final_b,
                });

                if let Some(champion) = m.match_winner() {
                    pending.push(MatchEvent::MatchCompleted { winner: champion });
                }
            }
        }

        self.save_snapshot();
        for event in pending {
            self.events.publish(event);
        }
        Ok(())
    }

    /// Revert the last point of the current set. Silently does nothing when
    /// no points have been played this set.
    pub fn undo(&mut self) -> Result<()> {
        let mut undone = None;

        {
            let m = self
                .active
                .as_mut()
                .ok_or_else(|| anyhow!("No match in progress"))?;
            if m.can_undo() {
                m.undo_last_point();
                undone = Some(MatchEvent::PointUndone {
                    score_a: m.score_a,
                    score_b: m.score_b,
                });
            }
        }

        if let Some(event) = undone {
            self.save_snapshot();
            self.events.publish(event);
        }
        Ok(())
    }

    /// Save the decided match: apply Elo to both players, write the record
    /// with its full set history, and clear the session.
    pub fn finish(&mut self, conn: &mut DbConn, notes: Option<&str>) -> Result<MatchRecord> {
        let m = self
            .active
            .as_ref()
            .ok_or_else(|| anyhow!("No match in progress"))?;
        if m.match_winner().is_none() {
            bail!("The match has no winner yet; keep playing or abandon it");
        }

        let record = self.write_record(conn, m, notes, false, None)?;
        self.clear_active();
        Ok(record)
    }

    /// End the match without a result. The record is kept for the books with
    /// the abandoned flag set; ratings stay untouched.
    pub fn abandon(&mut self, conn: &mut DbConn, reason: Option<&str>) -> Result<MatchRecord> {
        let m = self
            .active
            .as_ref()
            .ok_or_else(|| anyhow!("No match in progress"))?;

        let record = self.write_record(conn, m, None, true, reason)?;
        self.clear_active();
        Ok(record)
    }

    /// Derive a fresh match with the same players and settings. The active
    /// match is untouched; callers finish it first, then [`adopt`] this one.
    ///
    /// [`adopt`]: MatchSession::adopt
    pub fn rematch(&self) -> Result<LiveMatch> {
        let m = self
            .active
            .as_ref()
            .ok_or_else(|| anyhow!("No match in progress"))?;

        Ok(LiveMatch::new(
            m.player_a_id,
            m.player_a_name.clone(),
            m.player_b_id,
            m.player_b_name.clone(),
            m.settings,
        ))
    }

    fn write_record(
        &self,
        conn: &mut DbConn,
        m: &LiveMatch,
        notes: Option<&str>,
        abandoned: bool,
        abandon_reason: Option<&str>,
    ) -> Result<MatchRecord> {
        let duration_secs = (Utc::now() - m.start_date).num_seconds().max(0);

        let (elo_change_a, elo_change_b) = if abandoned {
            (0, 0)
        } else {
            let player_a = database::players::find_by_id(conn, m.player_a_id)?
                .ok_or_else(|| anyhow!(player_missing(m.player_a_id)))?;
            let player_b = database::players::find_by_id(conn, m.player_b_id)?
                .ok_or_else(|| anyhow!(player_missing(m.player_b_id)))?;

            let update = rating::calculate_new_ratings(
                player_a.elo_rating,
                player_b.elo_rating,
                m.sets_won_a,
                m.sets_won_b,
                &self.config.rating,
            );
            database::players::update_rating(conn, player_a.id, update.new_rating_a)?;
            database::players::update_rating(conn, player_b.id, update.new_rating_b)?;
            (update.change_a, update.change_b)
        };

        database::matches::insert_match(
            conn,
            m.player_a_id,
            m.player_b_id,
            m.sets_won_a,
            m.sets_won_b,
            m.start_date.naive_utc(),
            notes,
            elo_change_a,
            elo_change_b,
            duration_secs,
            m.settings.match_mode,
            &m.completed_sets,
            abandoned,
            abandon_reason,
        )
    }

    fn resume_check(&mut self) {
        let mut changed = false;

        if let Some(m) = self.active.as_mut() {
            if !m.is_complete() {
                if let Some(winner) = m.settings.set_outcome(m.score_a, m.score_b) {
                    m.complete_set(winner);
                    changed = true;
                }
            }
        }

        if changed {
            self.save_snapshot();
        }
    }

    fn save_snapshot(&self) {
        if let Some(m) = &self.active {
            if let Err(e) = self.cache.save(ACTIVE_MATCH_KEY, m) {
                warn!("Failed to persist match snapshot: {e:#}");
            }
        }
    }

    fn clear_active(&mut self) {
        self.active = None;
        if let Err(e) = self.cache.remove(ACTIVE_MATCH_KEY) {
            warn!("Failed to remove match snapshot: {e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::{RatingSettings, StorageSettings};
    use crate::database::{create_pool, get_connection, players, setup};
    use crate::scoring::MatchMode;

    struct Fixture {
        session: MatchSession,
        conn: DbConn,
        db_path: std::path::PathBuf,
        cache_dir: std::path::PathBuf,
    }

    fn config_for(name: &str) -> (AppConfig, std::path::PathBuf, std::path::PathBuf) {
        let db_path = std::env::temp_dir().join(format!("courtscore_test_session_{name}.db"));
        let cache_dir = std::env::temp_dir().join(format!("courtscore_test_session_{name}"));
        let config = AppConfig {
            rating: RatingSettings::default(),
            storage: StorageSettings {
                database_path: db_path.to_string_lossy().into_owned(),
                cache_dir: cache_dir.to_string_lossy().into_owned(),
            },
        };
        (config, db_path, cache_dir)
    }

    fn fixture(name: &str) -> Fixture {
        let (config, db_path, cache_dir) = config_for(name);
        let _ = std::fs::remove_file(&db_path);
        let _ = std::fs::remove_dir_all(&cache_dir);

        let pool = create_pool(&config.storage.database_path).unwrap();
        let mut conn = get_connection(&pool).unwrap();
        setup::init_database(&mut conn).unwrap();

        Fixture {
            session: MatchSession::new(config).unwrap(),
            conn,
            db_path,
            cache_dir,
        }
    }

    impl Fixture {
        fn add_players(&mut self) -> (Player, Player) {
            let a = players::insert_player(&mut self.conn, "Alice", None, 1200).unwrap();
            let b = players::insert_player(&mut self.conn, "Bob", None, 1200).unwrap();
            (a, b)
        }

        fn cleanup(self) {
            drop(self.session);
            drop(self.conn);
            let _ = std::fs::remove_file(&self.db_path);
            let _ = std::fs::remove_dir_all(&self.cache_dir);
        }
    }

    fn best_of(mode: MatchMode) -> MatchSettings {
        MatchSettings {
            match_mode: mode,
            ..Default::default()
        }
    }

    #[test]
    fn best_of_one_flow_finishes_and_rates() {
        let mut fx = fixture("bo1_flow");
        let (a, b) = fx.add_players();

        fx.session.start(&a, &b, best_of(MatchMode::BestOf1)).unwrap();
        let events = fx.session.subscribe();

        for _ in 0..11 {
            fx.session.score_point(PlayerSide::A).unwrap();
        }

        let received: Vec<_> = events.try_iter().collect();
        assert!(received.contains(&MatchEvent::SetCompleted {
            set_number: 1,
            winner: PlayerSide::A,
            score_a: 11,
            score_b: 0,
        }));
        assert!(received.contains(&MatchEvent::MatchCompleted {
            winner: PlayerSide::A
        }));

        let record = fx.session.finish(&mut fx.conn, Some("club night")).unwrap();
        assert_eq!((record.score_a, record.score_b), (1, 0));
        assert_eq!(record.elo_change_a, 16);
        assert_eq!(record.elo_change_b, -16);
        assert_eq!(record.set_scores.len(), 1);
        assert_eq!(record.notes.as_deref(), Some("club night"));

        let a = players::find_by_id(&mut fx.conn, a.id).unwrap().unwrap();
        let b = players::find_by_id(&mut fx.conn, b.id).unwrap().unwrap();
        assert_eq!(a.elo_rating, 1216);
        assert_eq!(b.elo_rating, 1184);

        assert!(fx.session.active().is_none());
        fx.cleanup();
    }

    #[test]
    fn decided_match_refuses_more_points() {
        let mut fx = fixture("refuse_points");
        let (a, b) = fx.add_players();

        fx.session.start(&a, &b, best_of(MatchMode::BestOf1)).unwrap();
        for _ in 0..11 {
            fx.session.score_point(PlayerSide::B).unwrap();
        }

        assert!(fx.session.score_point(PlayerSide::B).is_err());
        fx.cleanup();
    }

    #[test]
    fn abandon_leaves_ratings_untouched() {
        let mut fx = fixture("abandon");
        let (a, b) = fx.add_players();

        fx.session.start(&a, &b, best_of(MatchMode::BestOf3)).unwrap();
        fx.session.score_point(PlayerSide::A).unwrap();
        fx.session.score_point(PlayerSide::B).unwrap();

        let record = fx
            .session
            .abandon(&mut fx.conn, Some("rain stopped play"))
            .unwrap();
        assert!(record.abandoned);
        assert_eq!(record.abandon_reason.as_deref(), Some("rain stopped play"));
        assert_eq!((record.elo_change_a, record.elo_change_b), (0, 0));

        let a = players::find_by_id(&mut fx.conn, a.id).unwrap().unwrap();
        let b = players::find_by_id(&mut fx.conn, b.id).unwrap().unwrap();
        assert_eq!(a.elo_rating, 1200);
        assert_eq!(b.elo_rating, 1200);

        assert!(fx.session.active().is_none());
        fx.cleanup();
    }

    #[test]
    fn finish_requires_a_winner() {
        let mut fx = fixture("finish_early");
        let (a, b) = fx.add_players();

        fx.session.start(&a, &b, best_of(MatchMode::BestOf3)).unwrap();
        fx.session.score_point(PlayerSide::A).unwrap();

        assert!(fx.session.finish(&mut fx.conn, None).is_err());
        fx.cleanup();
    }

    #[test]
    fn only_one_match_at_a_time() {
        let mut fx = fixture("single_match");
        let (a, b) = fx.add_players();

        fx.session.start(&a, &b, best_of(MatchMode::BestOf1)).unwrap();
        assert!(fx.session.start(&a, &b, best_of(MatchMode::BestOf1)).is_err());
        assert!(fx.session.start(&a, &a, best_of(MatchMode::BestOf1)).is_err());
        fx.cleanup();
    }

    #[test]
    fn undo_restores_score_and_publishes() {
        let mut fx = fixture("undo");
        let (a, b) = fx.add_players();

        fx.session.start(&a, &b, best_of(MatchMode::BestOf1)).unwrap();
        let events = fx.session.subscribe();

        fx.session.score_point(PlayerSide::A).unwrap();
        fx.session.undo().unwrap();

        let m = fx.session.active().unwrap();
        assert_eq!((m.score_a, m.score_b), (0, 0));
        assert!(
            events
                .try_iter()
                .any(|e| matches!(e, MatchEvent::PointUndone { .. }))
        );

        // Nothing left to undo; still not an error.
        fx.session.undo().unwrap();
        fx.cleanup();
    }

    #[test]
    fn session_resumes_from_snapshot() {
        let (config, db_path, cache_dir) = config_for("resume");
        let _ = std::fs::remove_file(&db_path);
        let _ = std::fs::remove_dir_all(&cache_dir);

        let pool = create_pool(&config.storage.database_path).unwrap();
        let mut conn = get_connection(&pool).unwrap();
        setup::init_database(&mut conn).unwrap();
        let a = players::insert_player(&mut conn, "Alice", None, 1200).unwrap();
        let b = players::insert_player(&mut conn, "Bob", None, 1200).unwrap();

        {
            let mut session = MatchSession::new(config).unwrap();
            session.start(&a, &b, best_of(MatchMode::BestOf3)).unwrap();
            session.score_point(PlayerSide::A).unwrap();
            session.score_point(PlayerSide::A).unwrap();
            session.score_point(PlayerSide::B).unwrap();
        }

        let (config, _, _) = config_for("resume");
        let session = MatchSession::new(config).unwrap();
        let m = session.active().unwrap();
        assert_eq!((m.score_a, m.score_b), (2, 1));
        assert_eq!(m.score_history.len(), 3);

        let _ = std::fs::remove_file(&db_path);
        let _ = std::fs::remove_dir_all(&cache_dir);
    }

    #[test]
    fn resume_completes_a_winner_already_on_the_board() {
        let (config, db_path, cache_dir) = config_for("resume_winner");
        let _ = std::fs::remove_file(&db_path);
        let _ = std::fs::remove_dir_all(&cache_dir);

        // Snapshot written with a winning score that was never run through
        // the progression rules.
        let mut stale = LiveMatch::new(1, "Alice", 2, "Bob", best_of(MatchMode::BestOf1));
        for _ in 0..11 {
            stale.add_point(PlayerSide::A);
        }
        let cache = Cache::new(&cache_dir).unwrap();
        cache.save(ACTIVE_MATCH_KEY, &stale).unwrap();

        let session = MatchSession::new(config).unwrap();
        let m = session.active().unwrap();
        assert_eq!(m.completed_sets.len(), 1);
        assert_eq!(m.match_winner(), Some(PlayerSide::A));

        let _ = std::fs::remove_file(&db_path);
        let _ = std::fs::remove_dir_all(&cache_dir);
    }

    #[test]
    fn rematch_reuses_players_and_settings_only() {
        let mut fx = fixture("rematch");
        let (a, b) = fx.add_players();

        let settings = MatchSettings {
            match_mode: MatchMode::BestOf3,
            target_score: 9,
            ..Default::default()
        };
        fx.session.start(&a, &b, settings).unwrap();
        fx.session.score_point(PlayerSide::A).unwrap();

        let next = fx.session.rematch().unwrap();
        assert_eq!(next.player_a_id, a.id);
        assert_eq!(next.player_b_id, b.id);
        assert_eq!(next.settings, settings);
        assert_eq!((next.score_a, next.score_b), (0, 0));
        assert!(next.completed_sets.is_empty());

        // Active match still holds its score; adopting is refused until it
        // is finalized.
        assert_eq!(fx.session.active().unwrap().score_a, 1);
        assert!(fx.session.adopt(next).is_err());
        fx.cleanup();
    }
}
