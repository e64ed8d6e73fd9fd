//! pro-football-reference import pipeline: walk a roster, scrape each player

use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;

use crate::data::sources::pfr::{normalize_player_id, PfrScraper, PlayerPage, RosterLink};
use crate::data::PfrDb;
use crate::transform::field_map::{bag_rows, coerce_passing_row, season_year};
use crate::{PassingSeasonRecord, PfrPlayerRecord, Result, SeasonBounds};

/// What happened for one roster entry
#[derive(Debug)]
pub enum ScrapeOutcome {
    /// Page fetched and at least one table held an in-bounds season row
    Scraped(PlayerPage),
    /// Page fetched but no in-bounds season rows anywhere
    NoSeasonData(PlayerPage),
    /// Page could not be fetched
    FetchFailed(String),
}

/// Counts from one pipeline run
#[derive(Debug, Clone, Default)]
pub struct PfrReport {
    pub players_scraped: usize,
    pub players_without_data: usize,
    pub players_failed: usize,
    pub passing_rows: usize,
    pub rush_recv_rows: usize,
    pub def_fum_rows: usize,
}

/// Fetch one player page and classify the result
pub fn scrape_player(
    scraper: &PfrScraper,
    link: &RosterLink,
    bounds: &SeasonBounds,
) -> ScrapeOutcome {
    let page = match scraper.fetch_player_page(&link.url) {
        Ok(page) => page,
        Err(e) => return ScrapeOutcome::FetchFailed(e.to_string()),
    };

    if page_has_season_rows(&page, bounds) {
        ScrapeOutcome::Scraped(page)
    } else {
        ScrapeOutcome::NoSeasonData(page)
    }
}

fn page_has_season_rows(page: &PlayerPage, bounds: &SeasonBounds) -> bool {
    page.passing
        .iter()
        .chain(&page.rush_recv)
        .chain(&page.defense)
        .chain(&page.fumbles)
        .any(|row| season_year(row, bounds).is_some())
}

/// Walk the roster links, scrape each player, and store the results. A
/// fetch failure skips that player; a store failure aborts the run. The
/// delay runs after every player, failures included.
pub fn run(
    db: &mut PfrDb,
    scraper: &PfrScraper,
    links: &[RosterLink],
    bounds: &SeasonBounds,
    delay: Duration,
    max_players: Option<usize>,
) -> Result<PfrReport> {
    let limit = max_players.unwrap_or(links.len()).min(links.len());
    let links = &links[..limit];

    println!("Found {} players.", links.len());

    let mut report = PfrReport::default();

    for (i, link) in links.iter().enumerate() {
        let player_id = normalize_player_id(&link.url);
        println!("[{}/{}] {} -> {}", i + 1, links.len(), link.name, player_id);

        match scrape_player(scraper, link, bounds) {
            ScrapeOutcome::Scraped(page) => {
                store_page(db, &player_id, link, &page, bounds, &mut report)?;
                report.players_scraped += 1;
            }
            ScrapeOutcome::NoSeasonData(page) => {
                store_page(db, &player_id, link, &page, bounds, &mut report)?;
                report.players_without_data += 1;
            }
            ScrapeOutcome::FetchFailed(reason) => {
                log::warn!("  Skipping {}: {}", link.name, reason);
                report.players_failed += 1;
            }
        }

        thread::sleep(delay);
    }

    Ok(report)
}

fn store_page(
    db: &mut PfrDb,
    player_id: &str,
    link: &RosterLink,
    page: &PlayerPage,
    bounds: &SeasonBounds,
    report: &mut PfrReport,
) -> Result<()> {
    let player = PfrPlayerRecord {
        player_id: player_id.to_string(),
        // Prefer the page header name; fall back to the roster name
        name: page.name.clone().or_else(|| Some(link.name.clone())),
        position: page.position.clone(),
        college: page.college.clone(),
        url: link.url.clone(),
    };

    let passing = passing_records(player_id, &page.passing, bounds);
    let rush_recv = bag_rows(player_id, &page.rush_recv, bounds, None);
    let mut def_fum = bag_rows(player_id, &page.defense, bounds, None);
    def_fum.extend(bag_rows(player_id, &page.fumbles, bounds, Some("fumbles")));

    db.store_player_page(&player, &passing, &rush_recv, &def_fum)?;

    report.passing_rows += passing.len();
    report.rush_recv_rows += rush_recv.len();
    report.def_fum_rows += def_fum.len();
    Ok(())
}

fn passing_records(
    player_id: &str,
    rows: &[BTreeMap<String, String>],
    bounds: &SeasonBounds,
) -> Vec<PassingSeasonRecord> {
    let mut records = Vec::new();
    for row in rows {
        let year = match season_year(row, bounds) {
            Some(year) => year,
            None => continue,
        };
        records.push(coerce_passing_row(player_id, year, row));
    }
    records
}
