use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(author, version, about = "courtscore - squash score tracking and Elo ratings")]
pub struct Cli {
    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Register a new player
    AddPlayer {
        name: String,
    },
    /// List players with ratings and win/loss records
    Players,
    /// Remove a player; their recorded matches stay in the books
    DeletePlayer {
        name: String,
    },
    /// Start a live match between two registered players
    Start {
        player_a: String,
        player_b: String,
        /// Sets the match runs over (1, 3 or 5)
        #[arg(long, default_value_t = 1)]
        best_of: u8,
        /// Points needed to win a set
        #[arg(long, default_value_t = 11)]
        target: i32,
        /// Let a single-point lead win a set
        #[arg(long)]
        no_win_by_two: bool,
        /// Play every set to 15 regardless of target
        #[arg(long)]
        tie_break: bool,
    },
    /// Score a point in the live match (side: a or b)
    Point {
        side: String,
    },
    /// Undo the last point of the current set
    Undo,
    /// Show the live-match scoreboard
    Status,
    /// Save the decided match and update both ratings
    Finish {
        /// Free-form note stored with the match
        #[arg(long)]
        notes: Option<String>,
    },
    /// End the live match without a result; ratings stay untouched
    Abandon {
        #[arg(long)]
        reason: Option<String>,
    },
    /// Save the decided match and immediately start another with the same players
    Rematch,
    /// List recorded matches, newest first
    History {
        /// Only matches involving this player
        #[arg(long)]
        player: Option<String>,
    },
    /// Record an already-played match without live scoring
    Record {
        player_a: String,
        player_b: String,
        score_a: i32,
        score_b: i32,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a recorded match by id (ratings are not recalculated)
    DeleteMatch {
        id: i32,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}
