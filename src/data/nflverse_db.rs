//! SQLite store for merged nflverse player-season stats

use crate::{PlayerRecord, Result, SeasonRecord};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Store connection and operations
pub struct NflverseDb {
    conn: Connection,
}

impl NflverseDb {
    /// Open or create the store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = NflverseDb { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = NflverseDb { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS players (
                player_id   TEXT PRIMARY KEY,
                name        TEXT,
                position    TEXT,
                college     TEXT,
                latest_team TEXT
            );

            CREATE TABLE IF NOT EXISTS seasons (
                player_id           TEXT,
                season              INTEGER,
                team_abbr           TEXT,
                position            TEXT,
                completions         INTEGER,
                attempts            INTEGER,
                passing_yards       INTEGER,
                passing_tds         INTEGER,
                interceptions       INTEGER,
                passer_rating       REAL,
                sacks               INTEGER,
                sack_yards          INTEGER,
                rushing_attempts    INTEGER,
                rushing_yards       INTEGER,
                rushing_tds         INTEGER,
                targets             INTEGER,
                receptions          INTEGER,
                receiving_yards     INTEGER,
                receiving_tds       INTEGER,
                fumbles             INTEGER,
                fumbles_lost        INTEGER,
                solo_tackles        INTEGER,
                assists             INTEGER,
                sacks_def           REAL,
                interceptions_def   INTEGER,
                games               INTEGER,
                games_started       INTEGER,
                PRIMARY KEY (player_id, season),
                FOREIGN KEY (player_id) REFERENCES players(player_id)
            );
            "#,
        )?;
        Ok(())
    }

    // ==================== Player Operations ====================

    /// Insert players, updating name, position, college, and latest team
    /// on conflict
    pub fn upsert_players(&self, players: &[PlayerRecord]) -> Result<usize> {
        write_players(&self.conn, players)
    }

    /// Insert placeholder players only where the id is absent, leaving
    /// existing rows untouched
    pub fn ensure_players(&self, players: &[PlayerRecord]) -> Result<usize> {
        seed_players(&self.conn, players)
    }

    /// Get a player by id
    pub fn get_player(&self, player_id: &str) -> Result<Option<PlayerRecord>> {
        let player = self
            .conn
            .query_row(
                "SELECT player_id, name, position, college, latest_team
                 FROM players WHERE player_id = ?1",
                params![player_id],
                |row| {
                    Ok(PlayerRecord {
                        player_id: row.get(0)?,
                        name: row.get(1)?,
                        position: row.get(2)?,
                        college: row.get(3)?,
                        latest_team: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(player)
    }

    // ==================== Season Operations ====================

    /// Replace player-season rows wholesale under the (player_id, season) key
    pub fn replace_seasons(&self, seasons: &[SeasonRecord]) -> Result<usize> {
        write_seasons(&self.conn, seasons)
    }

    /// Write one team's batch atomically: real player rows first, then
    /// placeholder rows for ids only seen in the stats, then the seasons
    pub fn write_team_batch(
        &mut self,
        players: &[PlayerRecord],
        placeholders: &[PlayerRecord],
        seasons: &[SeasonRecord],
    ) -> Result<()> {
        let tx = self.conn.transaction()?;
        write_players(&tx, players)?;
        seed_players(&tx, placeholders)?;
        write_seasons(&tx, seasons)?;
        tx.commit()?;
        Ok(())
    }

    /// Get one player-season row
    pub fn get_season(&self, player_id: &str, season: i32) -> Result<Option<SeasonRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT player_id, season, team_abbr, position,
                        completions, attempts, passing_yards, passing_tds, interceptions,
                        passer_rating, sacks, sack_yards,
                        rushing_attempts, rushing_yards, rushing_tds,
                        targets, receptions, receiving_yards, receiving_tds,
                        fumbles, fumbles_lost,
                        solo_tackles, assists, sacks_def, interceptions_def,
                        games, games_started
                 FROM seasons WHERE player_id = ?1 AND season = ?2",
                params![player_id, season],
                Self::row_to_season,
            )
            .optional()?;
        Ok(record)
    }

    fn row_to_season(row: &rusqlite::Row) -> rusqlite::Result<SeasonRecord> {
        Ok(SeasonRecord {
            player_id: row.get(0)?,
            season: row.get(1)?,
            team_abbr: row.get(2)?,
            position: row.get(3)?,
            completions: row.get(4)?,
            attempts: row.get(5)?,
            passing_yards: row.get(6)?,
            passing_tds: row.get(7)?,
            interceptions: row.get(8)?,
            passer_rating: row.get(9)?,
            sacks: row.get(10)?,
            sack_yards: row.get(11)?,
            rushing_attempts: row.get(12)?,
            rushing_yards: row.get(13)?,
            rushing_tds: row.get(14)?,
            targets: row.get(15)?,
            receptions: row.get(16)?,
            receiving_yards: row.get(17)?,
            receiving_tds: row.get(18)?,
            fumbles: row.get(19)?,
            fumbles_lost: row.get(20)?,
            solo_tackles: row.get(21)?,
            assists: row.get(22)?,
            sacks_def: row.get(23)?,
            interceptions_def: row.get(24)?,
            games: row.get(25)?,
            games_started: row.get(26)?,
        })
    }

    // ==================== Statistics ====================

    /// Get store statistics
    pub fn get_stats(&self) -> Result<NflverseDbStats> {
        let player_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM players", [], |row| row.get(0))?;

        let season_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM seasons", [], |row| row.get(0))?;

        let min_season: Option<i64> = self
            .conn
            .query_row("SELECT MIN(season) FROM seasons", [], |row| row.get(0))
            .optional()?
            .flatten();

        let max_season: Option<i64> = self
            .conn
            .query_row("SELECT MAX(season) FROM seasons", [], |row| row.get(0))
            .optional()?
            .flatten();

        Ok(NflverseDbStats {
            player_count: player_count as usize,
            season_count: season_count as usize,
            min_season: min_season.map(|s| s as i32),
            max_season: max_season.map(|s| s as i32),
        })
    }
}

fn write_players(conn: &Connection, players: &[PlayerRecord]) -> Result<usize> {
    let mut count = 0;
    for player in players {
        conn.execute(
            r#"
            INSERT INTO players (player_id, name, position, college, latest_team)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(player_id) DO UPDATE SET
                name = excluded.name,
                position = excluded.position,
                college = excluded.college,
                latest_team = excluded.latest_team
            "#,
            params![
                player.player_id,
                player.name,
                player.position,
                player.college,
                player.latest_team
            ],
        )?;
        count += 1;
    }
    Ok(count)
}

fn seed_players(conn: &Connection, players: &[PlayerRecord]) -> Result<usize> {
    let mut count = 0;
    for player in players {
        count += conn.execute(
            "INSERT OR IGNORE INTO players (player_id, name, position, college, latest_team)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                player.player_id,
                player.name,
                player.position,
                player.college,
                player.latest_team
            ],
        )?;
    }
    Ok(count)
}

fn write_seasons(conn: &Connection, seasons: &[SeasonRecord]) -> Result<usize> {
    let mut count = 0;
    for season in seasons {
        conn.execute(
            r#"
            INSERT OR REPLACE INTO seasons
            (player_id, season, team_abbr, position,
             completions, attempts, passing_yards, passing_tds, interceptions,
             passer_rating, sacks, sack_yards,
             rushing_attempts, rushing_yards, rushing_tds,
             targets, receptions, receiving_yards, receiving_tds,
             fumbles, fumbles_lost,
             solo_tackles, assists, sacks_def, interceptions_def,
             games, games_started)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                    ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27)
            "#,
            params![
                season.player_id,
                season.season,
                season.team_abbr,
                season.position,
                season.completions,
                season.attempts,
                season.passing_yards,
                season.passing_tds,
                season.interceptions,
                season.passer_rating,
                season.sacks,
                season.sack_yards,
                season.rushing_attempts,
                season.rushing_yards,
                season.rushing_tds,
                season.targets,
                season.receptions,
                season.receiving_yards,
                season.receiving_tds,
                season.fumbles,
                season.fumbles_lost,
                season.solo_tackles,
                season.assists,
                season.sacks_def,
                season.interceptions_def,
                season.games,
                season.games_started,
            ],
        )?;
        count += 1;
    }
    Ok(count)
}

/// Store statistics
#[derive(Debug, Clone)]
pub struct NflverseDbStats {
    pub player_count: usize,
    pub season_count: usize,
    pub min_season: Option<i32>,
    pub max_season: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: &str, name: &str, college: Option<&str>) -> PlayerRecord {
        PlayerRecord {
            player_id: id.to_string(),
            name: Some(name.to_string()),
            position: Some("QB".to_string()),
            college: college.map(str::to_string),
            latest_team: Some("DEN".to_string()),
        }
    }

    fn season(id: &str, year: i32, team: Option<&str>) -> SeasonRecord {
        SeasonRecord {
            player_id: id.to_string(),
            season: year,
            team_abbr: team.map(str::to_string),
            position: Some("QB".to_string()),
            completions: Some(300),
            attempts: Some(480),
            passing_yards: Some(3800),
            passing_tds: Some(28),
            interceptions: Some(9),
            passer_rating: None,
            sacks: Some(22),
            sack_yards: Some(150),
            rushing_attempts: Some(40),
            rushing_yards: Some(120),
            rushing_tds: Some(2),
            targets: None,
            receptions: None,
            receiving_yards: None,
            receiving_tds: None,
            fumbles: 3,
            fumbles_lost: 1,
            solo_tackles: None,
            assists: None,
            sacks_def: None,
            interceptions_def: None,
            games: Some(16),
            games_started: Some(16),
        }
    }

    #[test]
    fn test_create_database() {
        let db = NflverseDb::in_memory().unwrap();
        let stats = db.get_stats().unwrap();
        assert_eq!(stats.player_count, 0);
        assert_eq!(stats.season_count, 0);
        assert_eq!(stats.min_season, None);
        assert_eq!(stats.max_season, None);
    }

    #[test]
    fn test_upsert_players_overwrites() {
        let db = NflverseDb::in_memory().unwrap();
        db.upsert_players(&[player("00-0000001", "Tom Brick", Some("Michigan"))])
            .unwrap();
        db.upsert_players(&[player("00-0000001", "Tom Brick", Some("Ohio State"))])
            .unwrap();

        let stored = db.get_player("00-0000001").unwrap().unwrap();
        assert_eq!(stored.college.as_deref(), Some("Ohio State"));

        let stats = db.get_stats().unwrap();
        assert_eq!(stats.player_count, 1);
    }

    #[test]
    fn test_ensure_players_keeps_existing() {
        let db = NflverseDb::in_memory().unwrap();
        db.upsert_players(&[player("00-0000001", "Tom Brick", Some("Michigan"))])
            .unwrap();

        let placeholder = PlayerRecord {
            player_id: "00-0000001".to_string(),
            name: None,
            position: None,
            college: None,
            latest_team: None,
        };
        db.ensure_players(&[placeholder]).unwrap();

        let stored = db.get_player("00-0000001").unwrap().unwrap();
        assert_eq!(stored.name.as_deref(), Some("Tom Brick"));
    }

    #[test]
    fn test_replace_seasons_overwrites_whole_row() {
        let db = NflverseDb::in_memory().unwrap();
        db.upsert_players(&[player("00-0000001", "Tom Brick", None)])
            .unwrap();
        db.replace_seasons(&[season("00-0000001", 2020, Some("DEN"))])
            .unwrap();

        let mut sparse = season("00-0000001", 2020, Some("DEN"));
        sparse.completions = None;
        sparse.targets = Some(50);
        db.replace_seasons(&[sparse]).unwrap();

        let stored = db.get_season("00-0000001", 2020).unwrap().unwrap();
        assert_eq!(stored.completions, None);
        assert_eq!(stored.targets, Some(50));
        assert_eq!(db.get_stats().unwrap().season_count, 1);
    }

    #[test]
    fn test_season_requires_player() {
        let db = NflverseDb::in_memory().unwrap();
        let result = db.replace_seasons(&[season("ghost", 2020, None)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_write_team_batch_idempotent() {
        let mut db = NflverseDb::in_memory().unwrap();
        let players = vec![player("00-0000001", "Tom Brick", Some("Michigan"))];
        let placeholders = vec![PlayerRecord {
            player_id: "00-0000002".to_string(),
            name: Some("Stats Only".to_string()),
            position: None,
            college: None,
            latest_team: Some("DEN".to_string()),
        }];
        let seasons = vec![
            season("00-0000001", 2019, Some("DEN")),
            season("00-0000002", 2021, Some("DEN")),
        ];

        db.write_team_batch(&players, &placeholders, &seasons).unwrap();
        db.write_team_batch(&players, &placeholders, &seasons).unwrap();

        let stats = db.get_stats().unwrap();
        assert_eq!(stats.player_count, 2);
        assert_eq!(stats.season_count, 2);
        assert_eq!(stats.min_season, Some(2019));
        assert_eq!(stats.max_season, Some(2021));
    }
}
