// tests/import_e2e.rs
use std::fs;
use std::path::PathBuf;

use gridiron::data::sources::nflverse::NflverseClient;
use gridiron::data::NflverseDb;
use gridiron::pipeline;
use gridiron::{NflverseConfig, SeasonBounds};

fn tmp_dir(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("gridiron_{}", name));
    let _ = fs::remove_dir_all(&p);
    fs::create_dir_all(&p).unwrap();
    p
}

fn cached_config() -> NflverseConfig {
    NflverseConfig {
        roster_url: "https://example.com/nfl/roster_{year}".to_string(),
        seasonal_url: "https://example.com/nfl/stats_{year}".to_string(),
    }
}

const ROSTER_2013: &str = "season,team,position,full_name,college,gsis_id\n\
                           2013,DEN,QB,Peyton Manning,Tennessee,00-0010346\n\
                           2013,DEN,WR,Demaryius Thomas,Georgia Tech,00-0027874\n\
                           2013,OAK,QB,Terrelle Pryor,Ohio State,00-0027700\n";

const STATS_2013: &str = "player_id,player_display_name,season,completions,attempts,passing_yards,carries,targets,receptions,receiving_yards,rushing_fumbles,rushing_fumbles_lost,games\n\
                          00-0010346,Peyton Manning,2013,450,659,5477,32,,,,,,16\n\
                          00-0027700,Terrelle Pryor,2013,156,272,1798,83,,,,2,1,11\n\
                          00-0099999,Ghost Receiver,2013,,,,,5,4,52,,,9\n";

#[test]
fn import_cached_csvs_end_to_end() {
    let dir = tmp_dir("nflverse_import");
    // Cache names mirror the source URL with the scheme stripped and slashes flattened
    fs::write(dir.join("example.com_nfl_roster_2013.csv"), ROSTER_2013).unwrap();
    fs::write(dir.join("example.com_nfl_stats_2013.csv"), STATS_2013).unwrap();

    let bounds = SeasonBounds {
        min_year: 2013,
        max_year: 2013,
    };
    let client = NflverseClient::new(&cached_config())
        .with_cache(&dir)
        .offline_only(true);

    let rosters = client.fetch_rosters(&bounds).unwrap();
    let seasonal = client.fetch_seasonal(&bounds).unwrap();
    assert_eq!(rosters.len(), 3);
    assert_eq!(seasonal.len(), 3);

    let mut db = NflverseDb::open(dir.join("nfl.sqlite")).unwrap();
    let report = pipeline::nflverse::run(&mut db, rosters, seasonal, &bounds).unwrap();

    // DEN, LV (remapped from OAK), and the no-team bucket
    assert_eq!(report.teams, 3);
    assert_eq!(report.players, 3);
    assert_eq!(report.placeholder_players, 1);
    assert_eq!(report.seasons, 3);

    let manning = db.get_season("00-0010346", 2013).unwrap().unwrap();
    assert_eq!(manning.team_abbr.as_deref(), Some("DEN"));
    assert_eq!(manning.completions, Some(450));
    assert_eq!(manning.attempts, Some(659));
    assert_eq!(manning.passing_yards, Some(5477));
    assert_eq!(manning.rushing_attempts, Some(32));
    assert_eq!(manning.games, Some(16));
    assert_eq!(manning.passer_rating, None);

    let pryor = db.get_player("00-0027700").unwrap().unwrap();
    assert_eq!(pryor.latest_team.as_deref(), Some("LV"));
    let pryor_season = db.get_season("00-0027700", 2013).unwrap().unwrap();
    assert_eq!(pryor_season.team_abbr.as_deref(), Some("LV"));
    assert_eq!(pryor_season.fumbles, 2);
    assert_eq!(pryor_season.fumbles_lost, 1);

    // Stats-only player survives with a placeholder row and no team attribution
    let ghost = db.get_player("00-0099999").unwrap().unwrap();
    assert_eq!(ghost.name.as_deref(), Some("Ghost Receiver"));
    assert_eq!(ghost.college, None);
    let ghost_season = db.get_season("00-0099999", 2013).unwrap().unwrap();
    assert_eq!(ghost_season.team_abbr, None);
    assert_eq!(ghost_season.receptions, Some(4));

    let stats = db.get_stats().unwrap();
    assert_eq!(stats.player_count, 4);
    assert_eq!(stats.season_count, 3);
    assert_eq!(stats.min_season, Some(2013));
    assert_eq!(stats.max_season, Some(2013));
}

#[test]
fn fetch_accumulates_all_cached_years() {
    let dir = tmp_dir("nflverse_years");
    fs::write(
        dir.join("example.com_nfl_roster_2012.csv"),
        "season,team,position,full_name,college,gsis_id\n\
         2012,BUF,RB,Some Back,Somewhere State,00-0000002\n",
    )
    .unwrap();
    fs::write(dir.join("example.com_nfl_roster_2013.csv"), ROSTER_2013).unwrap();

    let bounds = SeasonBounds {
        min_year: 2012,
        max_year: 2013,
    };
    let client = NflverseClient::new(&cached_config())
        .with_cache(&dir)
        .offline_only(true);

    let rosters = client.fetch_rosters(&bounds).unwrap();
    assert_eq!(rosters.len(), 4);
}

#[test]
fn offline_without_cache_fetches_nothing() {
    let dir = tmp_dir("nflverse_offline_empty");
    let bounds = SeasonBounds {
        min_year: 2013,
        max_year: 2013,
    };
    let client = NflverseClient::new(&cached_config())
        .with_cache(&dir)
        .offline_only(true);

    // Missing cache files are skipped with a warning, not a hard error
    let rosters = client.fetch_rosters(&bounds).unwrap();
    assert!(rosters.is_empty());
}
