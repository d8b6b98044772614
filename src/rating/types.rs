/// Outcome of an Elo update for one match.
///
/// `change_a` and `change_b` are rounded independently, so they are close to
/// but not guaranteed to be exact negatives of each other. Consumers store
/// both rather than deriving one from the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingUpdate {
    pub new_rating_a: i32,
    pub new_rating_b: i32,
    pub change_a: i32,
    pub change_b: i32,
}
