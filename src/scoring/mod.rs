pub mod events;
pub mod live_match;
pub mod settings;

pub use events::{EventBus, MatchEvent};
pub use live_match::{LiveMatch, PlayerSide, PointSnapshot, SetResult};
pub use settings::{MatchMode, MatchSettings};
