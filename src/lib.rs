//! NFL player statistics ETL
//!
//! Two import pipelines feeding local SQLite stores: a bulk CSV importer for
//! the nflverse data releases and a roster-driven page scraper for
//! pro-football-reference.com.

pub mod data;
pub mod pipeline;
pub mod transform;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Source of player data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    Nflverse,
    Pfr,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Nflverse => write!(f, "nflverse"),
            DataSource::Pfr => write!(f, "pro-football-reference"),
        }
    }
}

/// Inclusive range of season years accepted by either pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonBounds {
    pub min_year: i32,
    pub max_year: i32,
}

impl SeasonBounds {
    pub fn contains(&self, year: i32) -> bool {
        year >= self.min_year && year <= self.max_year
    }
}

/// A player row in the nflverse store, built from the most recent roster entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub player_id: String,
    pub name: Option<String>,
    pub position: Option<String>,
    pub college: Option<String>,
    pub latest_team: Option<String>,
}

/// One merged player-season row for the nflverse store.
///
/// `team_abbr` and `position` come from the roster join and stay NULL when no
/// roster entry matched. `passer_rating` and the defense columns are not
/// present in the seasonal dataset and are always NULL; they exist so the
/// schema covers every stat category the store models.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonRecord {
    pub player_id: String,
    pub season: i32,
    pub team_abbr: Option<String>,
    pub position: Option<String>,
    // Passing
    pub completions: Option<i64>,
    pub attempts: Option<i64>,
    pub passing_yards: Option<i64>,
    pub passing_tds: Option<i64>,
    pub interceptions: Option<i64>,
    pub passer_rating: Option<f64>,
    pub sacks: Option<i64>,
    pub sack_yards: Option<i64>,
    // Rushing
    pub rushing_attempts: Option<i64>,
    pub rushing_yards: Option<i64>,
    pub rushing_tds: Option<i64>,
    // Receiving
    pub targets: Option<i64>,
    pub receptions: Option<i64>,
    pub receiving_yards: Option<i64>,
    pub receiving_tds: Option<i64>,
    // Fumbles, combined across the rushing/receiving/sack buckets
    pub fumbles: i64,
    pub fumbles_lost: i64,
    // Defense
    pub solo_tackles: Option<i64>,
    pub assists: Option<i64>,
    pub sacks_def: Option<f64>,
    pub interceptions_def: Option<i64>,
    // Misc
    pub games: Option<i64>,
    pub games_started: Option<i64>,
}

/// A player row in the pro-football-reference store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PfrPlayerRecord {
    pub player_id: String,
    pub name: Option<String>,
    pub position: Option<String>,
    pub college: Option<String>,
    pub url: String,
}

/// One typed passing season scraped from a player page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PassingSeasonRecord {
    pub player_id: String,
    pub year: i32,
    pub age: Option<i64>,
    pub team: Option<String>,
    pub lg: Option<String>,
    pub pos: Option<String>,
    pub g: Option<i64>,
    pub gs: Option<i64>,
    pub qbrec: Option<String>,
    pub cmp: Option<i64>,
    pub att: Option<i64>,
    pub cmp_pct: Option<f64>,
    pub yds: Option<i64>,
    pub td: Option<i64>,
    pub td_pct: Option<f64>,
    pub int: Option<i64>,
    pub int_pct: Option<f64>,
    pub first_down: Option<i64>,
    pub succ_pct: Option<f64>,
    pub long: Option<i64>,
    pub y_per_att: Option<f64>,
    pub ay_per_att: Option<f64>,
    pub y_per_cmp: Option<f64>,
    pub y_per_g: Option<f64>,
    pub rate: Option<f64>,
    pub qbr: Option<f64>,
    pub sacks: Option<i64>,
    pub sack_yds: Option<i64>,
    pub sack_pct: Option<f64>,
    pub ny_per_att: Option<f64>,
    pub any_per_att: Option<f64>,
    pub four_q_comebacks: Option<i64>,
    pub gwd: Option<i64>,
    pub av: Option<i64>,
}

/// One season row for the flexible rushing/receiving and defense/fumbles
/// tables, carrying the full cell map as JSON. Team and position fall back
/// to empty strings so the composite key stays comparable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatRowRecord {
    pub player_id: String,
    pub year: i32,
    pub team: String,
    pub pos: String,
    pub row: serde_json::Map<String, serde_json::Value>,
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum GridironError {
    #[error("Import from {data_source} failed: {message}")]
    Source {
        data_source: DataSource,
        message: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, GridironError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub seasons: SeasonBounds,
    pub nflverse: NflverseConfig,
    pub pfr: PfrConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub nflverse_db_path: String,
    pub pfr_db_path: String,
}

/// nflverse release asset URLs; `{year}` is substituted per season
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NflverseConfig {
    pub roster_url: String,
    pub seasonal_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PfrConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Pause between player page requests, in milliseconds
    pub delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data: DataConfig {
                nflverse_db_path: "data/nfl.sqlite".to_string(),
                pfr_db_path: "data/pfr.sqlite".to_string(),
            },
            seasons: SeasonBounds {
                min_year: 2000,
                max_year: 2024,
            },
            nflverse: NflverseConfig {
                roster_url:
                    "https://github.com/nflverse/nflverse-data/releases/download/rosters/roster_{year}.csv"
                        .to_string(),
                seasonal_url:
                    "https://github.com/nflverse/nflverse-data/releases/download/stats_player/stats_player_reg_{year}.csv"
                        .to_string(),
            },
            pfr: PfrConfig {
                base_url: "https://www.pro-football-reference.com".to_string(),
                user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                             AppleWebKit/537.36 (KHTML, like Gecko) \
                             Chrome/123.0.0.0 Safari/537.36"
                    .to_string(),
                delay_ms: 1000,
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GridironError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| GridironError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| GridironError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
