pub mod elo;
pub mod types;

pub use elo::calculate_new_ratings;
pub use types::RatingUpdate;
