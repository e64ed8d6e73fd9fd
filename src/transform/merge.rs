//! Roster and seasonal row merging for the nflverse pipeline

use std::collections::{BTreeMap, HashMap};

use crate::data::sources::nflverse::{RawRosterRow, RawSeasonalRow};
use crate::{PlayerRecord, SeasonBounds, SeasonRecord};

use super::teams::{remap_team, CANONICAL_TEAMS};

/// Normalize legacy team codes on roster rows to current abbreviations.
/// The seasonal rows carry no team column, so only rosters need this.
pub fn remap_roster_teams(mut rosters: Vec<RawRosterRow>) -> Vec<RawRosterRow> {
    for row in &mut rosters {
        row.team = row.team.take().map(|team| remap_team(&team).to_string());
    }
    rosters
}

/// Left-join seasonal stat rows onto roster rows by (player_id, season).
/// Every usable seasonal row survives: one record per matching roster entry,
/// or a single record with no team attribution when the player is missing
/// from the rosters entirely.
pub fn merge_roster_seasonal(
    seasonal: &[RawSeasonalRow],
    rosters: &[RawRosterRow],
    bounds: &SeasonBounds,
) -> Vec<SeasonRecord> {
    let mut roster_index: HashMap<(&str, i32), Vec<&RawRosterRow>> = HashMap::new();
    for roster in rosters {
        let player_id = match roster.player_id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => continue,
        };
        let season = match roster.season {
            Some(season) => season,
            None => continue,
        };
        roster_index
            .entry((player_id, season))
            .or_default()
            .push(roster);
    }

    let mut records = Vec::new();
    for row in seasonal {
        let player_id = match row.player_id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => continue,
        };
        let season = match row.season {
            Some(season) if bounds.contains(season) => season,
            _ => continue,
        };

        match roster_index.get(&(player_id, season)) {
            Some(matches) => {
                for roster in matches {
                    records.push(season_record(
                        row,
                        player_id,
                        season,
                        roster.team.clone(),
                        roster.position.clone(),
                    ));
                }
            }
            None => records.push(season_record(row, player_id, season, None, None)),
        }
    }

    records
}

/// Collapse roster rows into one player record each, keeping the most
/// recent season's entry per player
pub fn dedup_latest_roster(rosters: &[RawRosterRow]) -> Vec<PlayerRecord> {
    let mut rows: Vec<&RawRosterRow> = rosters.iter().collect();
    rows.sort_by(|a, b| (&a.player_id, a.season).cmp(&(&b.player_id, b.season)));

    let mut latest: BTreeMap<String, PlayerRecord> = BTreeMap::new();
    for row in rows {
        let player_id = match row.player_id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => continue,
        };
        latest.insert(
            player_id.clone(),
            PlayerRecord {
                player_id,
                name: row.player_name.clone(),
                position: row.position.clone(),
                college: row.college.clone(),
                latest_team: row.team.clone(),
            },
        );
    }

    latest.into_values().collect()
}

/// Sum the fumble buckets the seasonal dataset splits by play type
pub fn combine_fumbles(row: &RawSeasonalRow) -> (i64, i64) {
    let total = row.rushing_fumbles.unwrap_or(0.0)
        + row.receiving_fumbles.unwrap_or(0.0)
        + row.sack_fumbles.unwrap_or(0.0);
    let lost = row.rushing_fumbles_lost.unwrap_or(0.0)
        + row.receiving_fumbles_lost.unwrap_or(0.0)
        + row.sack_fumbles_lost.unwrap_or(0.0);
    (total as i64, lost as i64)
}

/// Convert one merged row into a stored season record
fn season_record(
    row: &RawSeasonalRow,
    player_id: &str,
    season: i32,
    team: Option<String>,
    position: Option<String>,
) -> SeasonRecord {
    let (fumbles, fumbles_lost) = combine_fumbles(row);

    SeasonRecord {
        player_id: player_id.to_string(),
        season,
        team_abbr: team,
        position,
        completions: count(row.completions),
        attempts: count(row.attempts),
        passing_yards: count(row.passing_yards),
        passing_tds: count(row.passing_tds),
        interceptions: count(row.interceptions),
        passer_rating: None,
        sacks: count(row.sacks),
        sack_yards: count(row.sack_yards),
        rushing_attempts: count(row.carries),
        rushing_yards: count(row.rushing_yards),
        rushing_tds: count(row.rushing_tds),
        targets: count(row.targets),
        receptions: count(row.receptions),
        receiving_yards: count(row.receiving_yards),
        receiving_tds: count(row.receiving_tds),
        fumbles,
        fumbles_lost,
        solo_tackles: None,
        assists: None,
        sacks_def: None,
        interceptions_def: None,
        games: count(row.games),
        games_started: count(row.games_started),
    }
}

fn count(value: Option<f64>) -> Option<i64> {
    value.map(|v| v as i64)
}

/// One presentation bucket of season records sharing a team attribution
#[derive(Debug, Clone)]
pub struct TeamBucket {
    pub team: Option<String>,
    pub records: Vec<SeasonRecord>,
}

/// Group records by team for batched writes: canonical teams in league
/// order, then any other codes, then the records with no team attribution.
/// Every input record lands in exactly one bucket.
pub fn partition_by_team(records: Vec<SeasonRecord>) -> Vec<TeamBucket> {
    let mut by_team: BTreeMap<Option<String>, Vec<SeasonRecord>> = BTreeMap::new();
    for record in records {
        by_team
            .entry(record.team_abbr.clone())
            .or_default()
            .push(record);
    }

    let mut buckets = Vec::new();
    for team in CANONICAL_TEAMS {
        if let Some(records) = by_team.remove(&Some(team.to_string())) {
            buckets.push(TeamBucket {
                team: Some(team.to_string()),
                records,
            });
        }
    }

    let no_team = by_team.remove(&None);

    for (team, records) in by_team {
        buckets.push(TeamBucket { team, records });
    }

    if let Some(records) = no_team {
        buckets.push(TeamBucket { team: None, records });
    }

    buckets
}
