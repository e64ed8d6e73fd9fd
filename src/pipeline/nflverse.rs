//! nflverse import pipeline: merge raw rows, write the store per team

use std::collections::{HashMap, HashSet};

use crate::data::sources::nflverse::{RawRosterRow, RawSeasonalRow};
use crate::data::NflverseDb;
use crate::transform::merge::{
    dedup_latest_roster, merge_roster_seasonal, partition_by_team, remap_roster_teams,
};
use crate::{PlayerRecord, Result, SeasonBounds};

/// Counts from one pipeline run
#[derive(Debug, Clone, Default)]
pub struct NflverseReport {
    pub teams: usize,
    pub players: usize,
    pub placeholder_players: usize,
    pub seasons: usize,
}

/// Merge the raw rows and write them through the store one team batch at a
/// time. Season rows that matched no roster entry land in a final no-team
/// batch instead of being dropped.
pub fn run(
    db: &mut NflverseDb,
    rosters: Vec<RawRosterRow>,
    seasonal: Vec<RawSeasonalRow>,
    bounds: &SeasonBounds,
) -> Result<NflverseReport> {
    let rosters = remap_roster_teams(rosters);
    let records = merge_roster_seasonal(&seasonal, &rosters, bounds);
    log::info!("Merged {} season records", records.len());

    // Names for placeholder players come from the stat rows themselves
    let mut seasonal_names: HashMap<&str, &str> = HashMap::new();
    for row in &seasonal {
        if let (Some(id), Some(name)) = (row.player_id.as_deref(), row.player_name.as_deref()) {
            seasonal_names.entry(id).or_insert(name);
        }
    }

    let mut report = NflverseReport::default();

    for bucket in partition_by_team(records) {
        let label = bucket.team.as_deref().unwrap_or("(no team)");
        println!("Processing {} ...", label);

        let team_rosters: Vec<RawRosterRow> = rosters
            .iter()
            .filter(|r| r.team.as_deref() == bucket.team.as_deref())
            .cloned()
            .collect();
        let players = dedup_latest_roster(&team_rosters);

        // Ids that appear in the stats but not on this roster still need a
        // players row for the foreign key; seed them without clobbering
        // anything a real roster entry already wrote.
        let covered: HashSet<&str> = players.iter().map(|p| p.player_id.as_str()).collect();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut placeholders: Vec<PlayerRecord> = Vec::new();
        for record in &bucket.records {
            let id = record.player_id.as_str();
            if covered.contains(id) || !seen.insert(id) {
                continue;
            }
            placeholders.push(PlayerRecord {
                player_id: id.to_string(),
                name: seasonal_names.get(id).map(|n| n.to_string()),
                position: record.position.clone(),
                college: None,
                latest_team: record.team_abbr.clone(),
            });
        }

        db.write_team_batch(&players, &placeholders, &bucket.records)?;

        report.teams += 1;
        report.players += players.len();
        report.placeholder_players += placeholders.len();
        report.seasons += bucket.records.len();
    }

    Ok(report)
}
