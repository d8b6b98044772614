pub struct RatingSettings {
    pub k_factor: f64,
    pub starter_rating: i32,
}

impl Default for RatingSettings {
    fn default() -> Self {
        Self {
            k_factor: 32.0,
            starter_rating: 1200,
        }
    }
}

pub struct StorageSettings {
    pub database_path: String,
    pub cache_dir: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "courtscore.db".to_string()),
            cache_dir: std::env::var("CACHE_DIR").unwrap_or_else(|_| "cache".to_string()),
        }
    }
}

pub struct AppConfig {
    pub rating: RatingSettings,
    pub storage: StorageSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            rating: RatingSettings::default(),
            storage: StorageSettings::default(),
        }
    }
}

// Passed explicitly (dependency injection) rather than held as a global,
// so tests can point storage at throwaway directories.
