use std::sync::mpsc::{Receiver, Sender, channel};

use super::live_match::PlayerSide;

/// Notification emitted by the session manager after each state transition.
///
/// The state machine itself knows nothing about observers; the session
/// publishes these after its mutations so frontends can react (scoreboard
/// refresh, set banners, winner screens) without polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchEvent {
    PointScored {
        side: PlayerSide,
        score_a: i32,
        score_b: i32,
    },
    PointUndone {
        score_a: i32,
        score_b: i32,
    },
    SetCompleted {
        set_number: i32,
        winner: PlayerSide,
        score_a: i32,
        score_b: i32,
    },
    MatchCompleted {
        winner: PlayerSide,
    },
}

/// Fan-out channel for [`MatchEvent`]s.
///
/// Subscribers that dropped their receiver are pruned on the next publish.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Sender<MatchEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<MatchEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn publish(&mut self, event: MatchEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
