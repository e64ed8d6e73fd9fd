//! pro-football-reference.com scraper
//!
//! Fetches team roster pages and player pages, recovering the stat tables
//! the site ships inside HTML comments. Supports caching HTML files for
//! offline use and reduced load.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use regex::Regex;
use scraper::{Html, Node, Selector};

use crate::{DataSource, GridironError, PfrConfig, Result};

use super::cache_file_name;

/// A player profile link taken from a team roster page
#[derive(Debug, Clone)]
pub struct RosterLink {
    pub name: String,
    pub url: String,
}

/// Header fields and raw stat tables from one player page. Rows are kept
/// exactly as extracted, keyed by `data-stat`; season filtering happens
/// downstream.
#[derive(Debug, Clone, Default)]
pub struct PlayerPage {
    pub name: Option<String>,
    pub position: Option<String>,
    pub college: Option<String>,
    pub passing: Vec<BTreeMap<String, String>>,
    pub rush_recv: Vec<BTreeMap<String, String>>,
    pub defense: Vec<BTreeMap<String, String>>,
    pub fumbles: Vec<BTreeMap<String, String>>,
}

/// Scraper for pro-football-reference pages
pub struct PfrScraper {
    client: reqwest::blocking::Client,
    base_url: String,
    /// Optional cache directory for offline HTML files
    cache_dir: Option<PathBuf>,
    /// If true, only use cache (no network requests)
    offline_only: bool,
}

impl PfrScraper {
    pub fn new(config: &PfrConfig) -> Self {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        PfrScraper {
            client,
            base_url: config.base_url.clone(),
            cache_dir: None,
            offline_only: false,
        }
    }

    /// Create scraper with a cache directory
    pub fn with_cache<P: AsRef<Path>>(mut self, cache_dir: P) -> Self {
        self.cache_dir = Some(cache_dir.as_ref().to_path_buf());
        self
    }

    /// Set offline-only mode (no network requests, cache must exist)
    pub fn offline_only(mut self, offline: bool) -> Self {
        self.offline_only = offline;
        self
    }

    /// Build the roster page URL for a team slug and season
    pub fn roster_url(&self, slug: &str, year: i32) -> String {
        format!("{}/teams/{}/{}_roster.htm", self.base_url, slug, year)
    }

    /// Fetch a roster page and extract player profile links
    pub fn roster_player_links(&self, url: &str) -> Result<Vec<RosterLink>> {
        let html = self.fetch_html(url)?;
        parse_roster_links(&html, url)
    }

    /// Fetch and parse a player profile page
    pub fn fetch_player_page(&self, url: &str) -> Result<PlayerPage> {
        let html = self.fetch_html(url)?;
        Ok(parse_player_page(&html))
    }

    /// Get the cache file path for a URL
    fn cache_path(&self, url: &str) -> Option<PathBuf> {
        self.cache_dir
            .as_ref()
            .map(|dir| cache_file_name(dir, url, ".html"))
    }

    /// Load HTML from cache if available
    fn load_from_cache(&self, url: &str) -> Option<String> {
        let path = self.cache_path(url)?;
        if path.exists() {
            log::debug!("Loading from cache: {}", path.display());
            std::fs::read_to_string(&path).ok()
        } else {
            None
        }
    }

    /// Save HTML to cache
    fn save_to_cache(&self, url: &str, html: &str) -> Result<()> {
        if let Some(path) = self.cache_path(url) {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, html)?;
            log::debug!("Saved to cache: {}", path.display());
        }
        Ok(())
    }

    /// Fetch a page body (uses cache if available)
    fn fetch_html(&self, url: &str) -> Result<String> {
        if let Some(html) = self.load_from_cache(url) {
            return Ok(html);
        }

        if self.offline_only {
            return Err(GridironError::Source {
                data_source: DataSource::Pfr,
                message: format!("No cached data for {} (offline mode)", url),
            });
        }

        log::debug!("Fetching {}", url);

        let response = self.client.get(url).send()?;

        if !response.status().is_success() {
            return Err(GridironError::Source {
                data_source: DataSource::Pfr,
                message: format!("HTTP {}: {}", response.status(), url),
            });
        }

        let html = response.text()?;

        if let Err(e) = self.save_to_cache(url, &html) {
            log::warn!("Failed to cache {}: {}", url, e);
        }

        Ok(html)
    }
}

/// Collapse a player profile URL into the site's short id, e.g.
/// `/players/M/MannPe00.htm` becomes `M/MannPe00`. URLs that do not match
/// the pattern are kept whole.
pub fn normalize_player_id(url: &str) -> String {
    let re = Regex::new(r"/players/([A-Z])/([A-Za-z0-9]+)\.htm$").unwrap();
    match re.captures(url) {
        Some(captures) => format!("{}/{}", &captures[1], &captures[2]),
        None => url.to_string(),
    }
}

/// Parse a player page into header fields and raw stat tables
pub fn parse_player_page(html: &str) -> PlayerPage {
    let document = Html::parse_document(html);
    let (name, position, college) = parse_meta(&document);

    PlayerPage {
        name,
        position,
        college,
        passing: extract_table_rows(&document, "passing"),
        rush_recv: extract_table_rows(&document, "rushing_and_receiving"),
        defense: extract_table_rows(&document, "defense"),
        fumbles: extract_table_rows(&document, "fumbles"),
    }
}

/// Extract player links from roster page HTML
fn parse_roster_links(html: &str, page_url: &str) -> Result<Vec<RosterLink>> {
    let document = Html::parse_document(html);

    let table_html = find_table(&document, "roster").ok_or_else(|| GridironError::Source {
        data_source: DataSource::Pfr,
        message: format!("Could not find roster table at {}", page_url),
    })?;

    let fragment = Html::parse_fragment(&table_html);
    let link_selector = Selector::parse("tbody tr th[data-stat='player'] a").unwrap();

    let mut links = Vec::new();
    for anchor in fragment.select(&link_selector) {
        let name = anchor.text().collect::<String>().trim().to_string();
        let href = match anchor.value().attr("href") {
            Some(href) => href,
            None => continue,
        };
        if name.is_empty() {
            continue;
        }
        links.push(RosterLink {
            name,
            url: resolve_href(page_url, href),
        });
    }

    Ok(links)
}

/// Resolve a possibly-relative href against the page it came from
fn resolve_href(page_url: &str, href: &str) -> String {
    match reqwest::Url::parse(page_url).and_then(|base| base.join(href)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => href.to_string(),
    }
}

/// Locate a table by id. pro-football-reference ships most stat tables
/// inside an HTML comment under a `div#all_<id>` wrapper, so when the table
/// is not in the visible tree the wrapper's comment children are parsed and
/// searched too.
fn find_table(document: &Html, table_id: &str) -> Option<String> {
    let table_selector = Selector::parse(&format!("table#{}", table_id)).unwrap();
    if let Some(table) = document.select(&table_selector).next() {
        return Some(table.html());
    }

    let wrapper_selector = Selector::parse(&format!("div#all_{}", table_id)).unwrap();
    let wrapper = document.select(&wrapper_selector).next()?;

    for child in wrapper.children() {
        if let Node::Comment(comment) = child.value() {
            let fragment = Html::parse_fragment(comment);
            if let Some(table) = fragment.select(&table_selector).next() {
                return Some(table.html());
            }
        }
    }

    None
}

/// Pull the rows out of one named table, wherever it lives
fn extract_table_rows(document: &Html, table_id: &str) -> Vec<BTreeMap<String, String>> {
    match find_table(document, table_id) {
        Some(table_html) => table_rows(&table_html),
        None => Vec::new(),
    }
}

/// Extract tbody rows keyed by `data-stat`, skipping repeated header rows
fn table_rows(table_html: &str) -> Vec<BTreeMap<String, String>> {
    let fragment = Html::parse_fragment(table_html);
    let row_selector = Selector::parse("tbody tr").unwrap();
    let cell_selector = Selector::parse("th, td").unwrap();

    let mut rows = Vec::new();
    for tr in fragment.select(&row_selector) {
        if tr.value().classes().any(|c| c == "thead") {
            continue;
        }

        let mut row = BTreeMap::new();
        for cell in tr.select(&cell_selector) {
            if let Some(stat) = cell.value().attr("data-stat") {
                let value = cell.text().collect::<String>().trim().to_string();
                row.insert(stat.to_string(), value);
            }
        }

        if !row.is_empty() {
            rows.push(row);
        }
    }

    rows
}

/// Extract name, position, and college from the page header
fn parse_meta(document: &Html) -> (Option<String>, Option<String>, Option<String>) {
    let name_selector = Selector::parse("h1[itemprop='name']").unwrap();
    let name = document
        .select(&name_selector)
        .next()
        .map(|h1| h1.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty());

    let paragraph_selector = Selector::parse("div#meta p").unwrap();
    let anchor_selector = Selector::parse("a").unwrap();
    let position_re = Regex::new(r"Position\s*:\s*([A-Za-z/\-]+)").unwrap();

    let mut position = None;
    let mut college = None;

    for paragraph in document.select(&paragraph_selector) {
        let text = paragraph.text().collect::<String>();

        if position.is_none() {
            if let Some(captures) = position_re.captures(&text) {
                position = Some(captures[1].to_string());
            }
        }

        if college.is_none() && text.contains("College") {
            college = paragraph
                .select(&anchor_selector)
                .next()
                .map(|a| a.text().collect::<String>().trim().to_string())
                .filter(|s| !s.is_empty());
        }
    }

    (name, position, college)
}
