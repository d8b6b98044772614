/// Context message for snapshot-store failures
pub fn cache_context(operation: &str, key: &str) -> String {
    format!("Failed to {} snapshot for key: {}", operation, key)
}

/// Context message for database failures
pub fn db_context(operation: &str, entity: &str) -> String {
    format!("Failed to {} {}", operation, entity)
}

/// Message for a referenced player that no longer exists
pub fn player_missing(player_id: i32) -> String {
    format!("Player {} not found", player_id)
}
