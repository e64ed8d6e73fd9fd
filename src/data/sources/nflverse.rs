//! nflverse CSV client for rosters and seasonal player stats
//!
//! Downloads one release asset per season and parses it into raw rows.
//! Supports caching CSV files for offline use and reduced load.

use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};

use crate::{DataSource, GridironError, NflverseConfig, Result, SeasonBounds};

use super::cache_file_name;

/// One row of a yearly roster CSV
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRosterRow {
    #[serde(default)]
    pub season: Option<i32>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default, rename = "gsis_id")]
    pub player_id: Option<String>,
    #[serde(default, rename = "full_name")]
    pub player_name: Option<String>,
    #[serde(default)]
    pub college: Option<String>,
}

/// One row of a seasonal stats CSV. Team attribution is not taken from this
/// file; it comes from the roster join.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSeasonalRow {
    #[serde(default)]
    pub player_id: Option<String>,
    #[serde(default, rename = "player_display_name")]
    pub player_name: Option<String>,
    #[serde(default)]
    pub season: Option<i32>,
    #[serde(default, deserialize_with = "de_stat")]
    pub completions: Option<f64>,
    #[serde(default, deserialize_with = "de_stat")]
    pub attempts: Option<f64>,
    #[serde(default, deserialize_with = "de_stat")]
    pub passing_yards: Option<f64>,
    #[serde(default, deserialize_with = "de_stat")]
    pub passing_tds: Option<f64>,
    #[serde(default, deserialize_with = "de_stat")]
    pub interceptions: Option<f64>,
    #[serde(default, deserialize_with = "de_stat")]
    pub sacks: Option<f64>,
    #[serde(default, deserialize_with = "de_stat")]
    pub sack_yards: Option<f64>,
    #[serde(default, deserialize_with = "de_stat")]
    pub carries: Option<f64>,
    #[serde(default, deserialize_with = "de_stat")]
    pub rushing_yards: Option<f64>,
    #[serde(default, deserialize_with = "de_stat")]
    pub rushing_tds: Option<f64>,
    #[serde(default, deserialize_with = "de_stat")]
    pub targets: Option<f64>,
    #[serde(default, deserialize_with = "de_stat")]
    pub receptions: Option<f64>,
    #[serde(default, deserialize_with = "de_stat")]
    pub receiving_yards: Option<f64>,
    #[serde(default, deserialize_with = "de_stat")]
    pub receiving_tds: Option<f64>,
    #[serde(default, deserialize_with = "de_stat")]
    pub rushing_fumbles: Option<f64>,
    #[serde(default, deserialize_with = "de_stat")]
    pub rushing_fumbles_lost: Option<f64>,
    #[serde(default, deserialize_with = "de_stat")]
    pub receiving_fumbles: Option<f64>,
    #[serde(default, deserialize_with = "de_stat")]
    pub receiving_fumbles_lost: Option<f64>,
    #[serde(default, deserialize_with = "de_stat")]
    pub sack_fumbles: Option<f64>,
    #[serde(default, deserialize_with = "de_stat")]
    pub sack_fumbles_lost: Option<f64>,
    #[serde(default, deserialize_with = "de_stat")]
    pub games: Option<f64>,
    #[serde(default, deserialize_with = "de_stat")]
    pub games_started: Option<f64>,
}

/// Deserialize a stat cell that may be empty, "NA", or a float-formatted count
fn de_stat<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.trim().parse().ok()))
}

/// Client for nflverse release CSV assets
pub struct NflverseClient {
    client: reqwest::blocking::Client,
    roster_url: String,
    seasonal_url: String,
    /// Optional cache directory for offline CSV files
    cache_dir: Option<PathBuf>,
    /// If true, only use cache (no network requests)
    offline_only: bool,
}

impl NflverseClient {
    pub fn new(config: &NflverseConfig) -> Self {
        let client = reqwest::blocking::Client::builder()
            .user_agent("gridiron/0.1")
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        NflverseClient {
            client,
            roster_url: config.roster_url.clone(),
            seasonal_url: config.seasonal_url.clone(),
            cache_dir: None,
            offline_only: false,
        }
    }

    /// Create client with a cache directory
    pub fn with_cache<P: AsRef<Path>>(mut self, cache_dir: P) -> Self {
        self.cache_dir = Some(cache_dir.as_ref().to_path_buf());
        self
    }

    /// Set offline-only mode (no network requests, cache must exist)
    pub fn offline_only(mut self, offline: bool) -> Self {
        self.offline_only = offline;
        self
    }

    /// Fetch roster rows for every season in the bounds
    pub fn fetch_rosters(&self, bounds: &SeasonBounds) -> Result<Vec<RawRosterRow>> {
        let mut all_rows = Vec::new();

        for year in bounds.min_year..=bounds.max_year {
            let url = url_for_year(&self.roster_url, year);
            log::info!("Fetching {} rosters...", year);
            match self.fetch_csv(&url) {
                Ok(body) => {
                    let rows = parse_roster_csv(body.as_bytes())?;
                    log::info!("  Found {} roster rows", rows.len());
                    all_rows.extend(rows);
                }
                Err(e) => log::warn!("Failed to fetch {} rosters: {}", year, e),
            }
        }

        Ok(all_rows)
    }

    /// Fetch seasonal stat rows for every season in the bounds
    pub fn fetch_seasonal(&self, bounds: &SeasonBounds) -> Result<Vec<RawSeasonalRow>> {
        let mut all_rows = Vec::new();

        for year in bounds.min_year..=bounds.max_year {
            let url = url_for_year(&self.seasonal_url, year);
            log::info!("Fetching {} player stats...", year);
            match self.fetch_csv(&url) {
                Ok(body) => {
                    let rows = parse_seasonal_csv(body.as_bytes())?;
                    log::info!("  Found {} stat rows", rows.len());
                    all_rows.extend(rows);
                }
                Err(e) => log::warn!("Failed to fetch {} player stats: {}", year, e),
            }
        }

        Ok(all_rows)
    }

    /// Get the cache file path for a URL
    fn cache_path(&self, url: &str) -> Option<PathBuf> {
        self.cache_dir
            .as_ref()
            .map(|dir| cache_file_name(dir, url, ".csv"))
    }

    /// Load CSV text from cache if available
    fn load_from_cache(&self, url: &str) -> Option<String> {
        let path = self.cache_path(url)?;
        if path.exists() {
            log::debug!("Loading from cache: {}", path.display());
            std::fs::read_to_string(&path).ok()
        } else {
            None
        }
    }

    /// Save CSV text to cache
    fn save_to_cache(&self, url: &str, body: &str) -> Result<()> {
        if let Some(path) = self.cache_path(url) {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, body)?;
            log::debug!("Saved to cache: {}", path.display());
        }
        Ok(())
    }

    /// Fetch a CSV body (uses cache if available)
    fn fetch_csv(&self, url: &str) -> Result<String> {
        if let Some(body) = self.load_from_cache(url) {
            return Ok(body);
        }

        if self.offline_only {
            return Err(GridironError::Source {
                data_source: DataSource::Nflverse,
                message: format!("No cached data for {} (offline mode)", url),
            });
        }

        log::debug!("Fetching {}", url);

        let response = self.client.get(url).send()?;

        if !response.status().is_success() {
            return Err(GridironError::Source {
                data_source: DataSource::Nflverse,
                message: format!("HTTP {}: {}", response.status(), url),
            });
        }

        let body = response.text()?;

        if let Err(e) = self.save_to_cache(url, &body) {
            log::warn!("Failed to cache {}: {}", url, e);
        }

        Ok(body)
    }
}

/// Substitute the season into a URL template
fn url_for_year(template: &str, year: i32) -> String {
    template.replace("{year}", &year.to_string())
}

/// Parse roster CSV rows, skipping any that fail to deserialize
pub fn parse_roster_csv<R: Read>(reader: R) -> Result<Vec<RawRosterRow>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();

    for result in csv_reader.deserialize() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => log::warn!("Skipping malformed roster row: {}", e),
        }
    }

    Ok(rows)
}

/// Parse seasonal stats CSV rows, skipping any that fail to deserialize
pub fn parse_seasonal_csv<R: Read>(reader: R) -> Result<Vec<RawSeasonalRow>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();

    for result in csv_reader.deserialize() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => log::warn!("Skipping malformed stat row: {}", e),
        }
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roster_csv() {
        let data = "season,team,position,full_name,college,gsis_id\n\
                    2013,DEN,QB,Peyton Manning,Tennessee,00-0010346\n\
                    2013,DEN,WR,Demaryius Thomas,Georgia Tech,00-0027874\n";
        let rows = parse_roster_csv(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].season, Some(2013));
        assert_eq!(rows[0].team.as_deref(), Some("DEN"));
        assert_eq!(rows[0].player_name.as_deref(), Some("Peyton Manning"));
        assert_eq!(rows[0].college.as_deref(), Some("Tennessee"));
        assert_eq!(rows[0].player_id.as_deref(), Some("00-0010346"));
    }

    #[test]
    fn test_parse_roster_csv_empty_id() {
        let data = "season,team,position,full_name,college,gsis_id\n\
                    2013,DEN,QB,Practice Guy,,\n";
        let rows = parse_roster_csv(data.as_bytes()).unwrap();
        assert_eq!(rows[0].player_id, None);
        assert_eq!(rows[0].college, None);
    }

    #[test]
    fn test_parse_seasonal_csv() {
        let data = "player_id,player_display_name,season,completions,attempts,passing_yards,carries,extra_col\n\
                    00-0010346,Peyton Manning,2013,450,659,5477.0,32,ignored\n";
        let rows = parse_seasonal_csv(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].player_id.as_deref(), Some("00-0010346"));
        assert_eq!(rows[0].season, Some(2013));
        assert_eq!(rows[0].completions, Some(450.0));
        assert_eq!(rows[0].passing_yards, Some(5477.0));
        assert_eq!(rows[0].carries, Some(32.0));
    }

    #[test]
    fn test_parse_seasonal_csv_na_and_missing() {
        let data = "player_id,player_display_name,season,completions,targets\n\
                    00-0027874,Demaryius Thomas,2013,NA,142\n";
        let rows = parse_seasonal_csv(data.as_bytes()).unwrap();
        assert_eq!(rows[0].completions, None);
        assert_eq!(rows[0].targets, Some(142.0));
        // games_started column absent entirely
        assert_eq!(rows[0].games_started, None);
    }

    #[test]
    fn test_parse_roster_csv_skips_malformed_row() {
        let data = "season,team,position,full_name,college,gsis_id\n\
                    2013,DEN,QB,Peyton Manning,Tennessee,00-0010346\n\
                    2013,DEN\n";
        let rows = parse_roster_csv(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_url_for_year() {
        assert_eq!(
            url_for_year("https://example.com/roster_{year}.csv", 2013),
            "https://example.com/roster_2013.csv"
        );
    }
}
