//! SQLite store for scraped pro-football-reference stats

use crate::{PassingSeasonRecord, PfrPlayerRecord, Result, StatRowRecord};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// The two flexible per-row JSON tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatTable {
    RushRecv,
    DefFum,
}

impl StatTable {
    fn table_name(self) -> &'static str {
        match self {
            StatTable::RushRecv => "seasons_rush_recv",
            StatTable::DefFum => "seasons_def_fum",
        }
    }
}

/// Store connection and operations
pub struct PfrDb {
    conn: Connection,
}

impl PfrDb {
    /// Open or create the store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = PfrDb { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = PfrDb { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS players (
                player_id TEXT PRIMARY KEY,
                name      TEXT,
                position  TEXT,
                college   TEXT,
                url       TEXT
            );

            CREATE TABLE IF NOT EXISTS seasons_passing (
                player_id TEXT,
                year INTEGER,
                age INTEGER,
                team TEXT,
                lg TEXT,
                pos TEXT,
                g INTEGER,
                gs INTEGER,
                qbrec TEXT,
                cmp INTEGER,
                att INTEGER,
                cmp_pct REAL,
                yds INTEGER,
                td INTEGER,
                td_pct REAL,
                int INTEGER,
                int_pct REAL,
                first_down INTEGER,
                succ_pct REAL,
                long INTEGER,
                y_per_att REAL,
                ay_per_att REAL,
                y_per_cmp REAL,
                y_per_g REAL,
                rate REAL,
                qbr REAL,
                sacks INTEGER,
                sack_yds INTEGER,
                sack_pct REAL,
                ny_per_att REAL,
                any_per_att REAL,
                four_q_comebacks INTEGER,
                gwd INTEGER,
                av INTEGER,
                PRIMARY KEY (player_id, year),
                FOREIGN KEY (player_id) REFERENCES players(player_id)
            );

            CREATE TABLE IF NOT EXISTS seasons_rush_recv (
                player_id TEXT,
                year INTEGER,
                team TEXT,
                pos TEXT,
                row_json TEXT NOT NULL,
                PRIMARY KEY (player_id, year, team, pos),
                FOREIGN KEY (player_id) REFERENCES players(player_id)
            );

            CREATE TABLE IF NOT EXISTS seasons_def_fum (
                player_id TEXT,
                year INTEGER,
                team TEXT,
                pos TEXT,
                row_json TEXT NOT NULL,
                PRIMARY KEY (player_id, year, team, pos),
                FOREIGN KEY (player_id) REFERENCES players(player_id)
            );
            "#,
        )?;
        Ok(())
    }

    // ==================== Player Operations ====================

    /// Insert a player, updating name, position, college, and url on conflict
    pub fn upsert_player(&self, player: &PfrPlayerRecord) -> Result<()> {
        write_player(&self.conn, player)
    }

    /// Get a player by id
    pub fn get_player(&self, player_id: &str) -> Result<Option<PfrPlayerRecord>> {
        let player = self
            .conn
            .query_row(
                "SELECT player_id, name, position, college, url
                 FROM players WHERE player_id = ?1",
                params![player_id],
                |row| {
                    Ok(PfrPlayerRecord {
                        player_id: row.get(0)?,
                        name: row.get(1)?,
                        position: row.get(2)?,
                        college: row.get(3)?,
                        url: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(player)
    }

    // ==================== Season Operations ====================

    /// Replace passing rows wholesale under the (player_id, year) key
    pub fn replace_passing(&self, records: &[PassingSeasonRecord]) -> Result<usize> {
        write_passing(&self.conn, records)
    }

    /// Replace flexible stat rows under the (player_id, year, team, pos) key
    pub fn replace_stat_rows(&self, table: StatTable, records: &[StatRowRecord]) -> Result<usize> {
        write_stat_rows(&self.conn, table, records)
    }

    /// Store one player's page atomically: the player row, passing seasons,
    /// rushing/receiving rows, then defense/fumbles rows. The def_fum slice
    /// carries defense rows first so a marked fumbles row wins any key
    /// collision.
    pub fn store_player_page(
        &mut self,
        player: &PfrPlayerRecord,
        passing: &[PassingSeasonRecord],
        rush_recv: &[StatRowRecord],
        def_fum: &[StatRowRecord],
    ) -> Result<()> {
        let tx = self.conn.transaction()?;
        write_player(&tx, player)?;
        write_passing(&tx, passing)?;
        write_stat_rows(&tx, StatTable::RushRecv, rush_recv)?;
        write_stat_rows(&tx, StatTable::DefFum, def_fum)?;
        tx.commit()?;
        Ok(())
    }

    /// Get one passing season row
    pub fn get_passing(&self, player_id: &str, year: i32) -> Result<Option<PassingSeasonRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT player_id, year, age, team, lg, pos, g, gs, qbrec, cmp, att,
                        cmp_pct, yds, td, td_pct, int, int_pct, first_down, succ_pct,
                        long, y_per_att, ay_per_att, y_per_cmp, y_per_g, rate, qbr,
                        sacks, sack_yds, sack_pct, ny_per_att, any_per_att,
                        four_q_comebacks, gwd, av
                 FROM seasons_passing WHERE player_id = ?1 AND year = ?2",
                params![player_id, year],
                Self::row_to_passing,
            )
            .optional()?;
        Ok(record)
    }

    /// Get one flexible stat row by its full key
    pub fn get_stat_row(
        &self,
        table: StatTable,
        player_id: &str,
        year: i32,
        team: &str,
        pos: &str,
    ) -> Result<Option<StatRowRecord>> {
        let sql = format!(
            "SELECT player_id, year, team, pos, row_json FROM {}
             WHERE player_id = ?1 AND year = ?2 AND team = ?3 AND pos = ?4",
            table.table_name()
        );
        let raw: Option<(String, i32, String, String, String)> = self
            .conn
            .query_row(&sql, params![player_id, year, team, pos], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            })
            .optional()?;

        match raw {
            Some((player_id, year, team, pos, row_json)) => {
                let row = serde_json::from_str(&row_json)?;
                Ok(Some(StatRowRecord {
                    player_id,
                    year,
                    team,
                    pos,
                    row,
                }))
            }
            None => Ok(None),
        }
    }

    fn row_to_passing(row: &rusqlite::Row) -> rusqlite::Result<PassingSeasonRecord> {
        Ok(PassingSeasonRecord {
            player_id: row.get(0)?,
            year: row.get(1)?,
            age: row.get(2)?,
            team: row.get(3)?,
            lg: row.get(4)?,
            pos: row.get(5)?,
            g: row.get(6)?,
            gs: row.get(7)?,
            qbrec: row.get(8)?,
            cmp: row.get(9)?,
            att: row.get(10)?,
            cmp_pct: row.get(11)?,
            yds: row.get(12)?,
            td: row.get(13)?,
            td_pct: row.get(14)?,
            int: row.get(15)?,
            int_pct: row.get(16)?,
            first_down: row.get(17)?,
            succ_pct: row.get(18)?,
            long: row.get(19)?,
            y_per_att: row.get(20)?,
            ay_per_att: row.get(21)?,
            y_per_cmp: row.get(22)?,
            y_per_g: row.get(23)?,
            rate: row.get(24)?,
            qbr: row.get(25)?,
            sacks: row.get(26)?,
            sack_yds: row.get(27)?,
            sack_pct: row.get(28)?,
            ny_per_att: row.get(29)?,
            any_per_att: row.get(30)?,
            four_q_comebacks: row.get(31)?,
            gwd: row.get(32)?,
            av: row.get(33)?,
        })
    }

    // ==================== Statistics ====================

    /// Get store statistics
    pub fn get_stats(&self) -> Result<PfrDbStats> {
        let player_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM players", [], |row| row.get(0))?;

        let passing_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM seasons_passing", [], |row| row.get(0))?;

        let rush_recv_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM seasons_rush_recv", [], |row| {
                row.get(0)
            })?;

        let def_fum_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM seasons_def_fum", [], |row| row.get(0))?;

        Ok(PfrDbStats {
            player_count: player_count as usize,
            passing_count: passing_count as usize,
            rush_recv_count: rush_recv_count as usize,
            def_fum_count: def_fum_count as usize,
        })
    }
}

fn write_player(conn: &Connection, player: &PfrPlayerRecord) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO players (player_id, name, position, college, url)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(player_id) DO UPDATE SET
            name = excluded.name,
            position = excluded.position,
            college = excluded.college,
            url = excluded.url
        "#,
        params![
            player.player_id,
            player.name,
            player.position,
            player.college,
            player.url
        ],
    )?;
    Ok(())
}

fn write_passing(conn: &Connection, records: &[PassingSeasonRecord]) -> Result<usize> {
    let mut count = 0;
    for record in records {
        conn.execute(
            r#"
            INSERT OR REPLACE INTO seasons_passing
            (player_id, year, age, team, lg, pos, g, gs, qbrec, cmp, att, cmp_pct,
             yds, td, td_pct, int, int_pct, first_down, succ_pct, long,
             y_per_att, ay_per_att, y_per_cmp, y_per_g, rate, qbr,
             sacks, sack_yds, sack_pct, ny_per_att, any_per_att,
             four_q_comebacks, gwd, av)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                    ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26,
                    ?27, ?28, ?29, ?30, ?31, ?32, ?33, ?34)
            "#,
            params![
                record.player_id,
                record.year,
                record.age,
                record.team,
                record.lg,
                record.pos,
                record.g,
                record.gs,
                record.qbrec,
                record.cmp,
                record.att,
                record.cmp_pct,
                record.yds,
                record.td,
                record.td_pct,
                record.int,
                record.int_pct,
                record.first_down,
                record.succ_pct,
                record.long,
                record.y_per_att,
                record.ay_per_att,
                record.y_per_cmp,
                record.y_per_g,
                record.rate,
                record.qbr,
                record.sacks,
                record.sack_yds,
                record.sack_pct,
                record.ny_per_att,
                record.any_per_att,
                record.four_q_comebacks,
                record.gwd,
                record.av,
            ],
        )?;
        count += 1;
    }
    Ok(count)
}

fn write_stat_rows(conn: &Connection, table: StatTable, records: &[StatRowRecord]) -> Result<usize> {
    let sql = format!(
        "INSERT OR REPLACE INTO {} (player_id, year, team, pos, row_json)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        table.table_name()
    );

    let mut count = 0;
    for record in records {
        let row_json = serde_json::to_string(&record.row)?;
        conn.execute(
            &sql,
            params![record.player_id, record.year, record.team, record.pos, row_json],
        )?;
        count += 1;
    }
    Ok(count)
}

/// Store statistics
#[derive(Debug, Clone)]
pub struct PfrDbStats {
    pub player_count: usize,
    pub passing_count: usize,
    pub rush_recv_count: usize,
    pub def_fum_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn pfr_player(id: &str, college: Option<&str>) -> PfrPlayerRecord {
        PfrPlayerRecord {
            player_id: id.to_string(),
            name: Some("Ben Roethlisberger".to_string()),
            position: Some("QB".to_string()),
            college: college.map(str::to_string),
            url: format!("https://www.pro-football-reference.com/players/{}.htm", id),
        }
    }

    fn passing(id: &str, year: i32) -> PassingSeasonRecord {
        PassingSeasonRecord {
            player_id: id.to_string(),
            year,
            team: Some("PIT".to_string()),
            cmp: Some(375),
            att: Some(584),
            rate: Some(92.0),
            ..Default::default()
        }
    }

    fn stat_row(id: &str, year: i32, source: Option<&str>) -> StatRowRecord {
        let mut row = serde_json::Map::new();
        row.insert("year_id".to_string(), Value::String(year.to_string()));
        row.insert("team".to_string(), Value::String("PIT".to_string()));
        if let Some(tag) = source {
            row.insert("_source".to_string(), Value::String(tag.to_string()));
        }
        StatRowRecord {
            player_id: id.to_string(),
            year,
            team: "PIT".to_string(),
            pos: "QB".to_string(),
            row,
        }
    }

    #[test]
    fn test_create_database() {
        let db = PfrDb::in_memory().unwrap();
        let stats = db.get_stats().unwrap();
        assert_eq!(stats.player_count, 0);
        assert_eq!(stats.passing_count, 0);
        assert_eq!(stats.rush_recv_count, 0);
        assert_eq!(stats.def_fum_count, 0);
    }

    #[test]
    fn test_upsert_player_overwrites() {
        let db = PfrDb::in_memory().unwrap();
        db.upsert_player(&pfr_player("R/RoetBe00", None)).unwrap();
        db.upsert_player(&pfr_player("R/RoetBe00", Some("Miami (OH)")))
            .unwrap();

        let stored = db.get_player("R/RoetBe00").unwrap().unwrap();
        assert_eq!(stored.college.as_deref(), Some("Miami (OH)"));
        assert_eq!(db.get_stats().unwrap().player_count, 1);
    }

    #[test]
    fn test_replace_passing_overwrites_whole_row() {
        let db = PfrDb::in_memory().unwrap();
        db.upsert_player(&pfr_player("R/RoetBe00", None)).unwrap();
        db.replace_passing(&[passing("R/RoetBe00", 2013)]).unwrap();

        let mut sparse = passing("R/RoetBe00", 2013);
        sparse.cmp = None;
        sparse.yds = Some(4261);
        db.replace_passing(&[sparse]).unwrap();

        let stored = db.get_passing("R/RoetBe00", 2013).unwrap().unwrap();
        assert_eq!(stored.cmp, None);
        assert_eq!(stored.yds, Some(4261));
        assert_eq!(db.get_stats().unwrap().passing_count, 1);
    }

    #[test]
    fn test_passing_requires_player() {
        let db = PfrDb::in_memory().unwrap();
        let result = db.replace_passing(&[passing("G/GhosXx00", 1999)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_store_player_page_fumbles_wins_collision() {
        let mut db = PfrDb::in_memory().unwrap();
        let defense = stat_row("P/PolaTr00", 2013, None);
        let fumbles = stat_row("P/PolaTr00", 2013, Some("fumbles"));

        db.store_player_page(
            &pfr_player("P/PolaTr00", None),
            &[],
            &[],
            &[defense, fumbles],
        )
        .unwrap();

        let stored = db
            .get_stat_row(StatTable::DefFum, "P/PolaTr00", 2013, "PIT", "QB")
            .unwrap()
            .unwrap();
        assert_eq!(stored.row["_source"], Value::String("fumbles".to_string()));
        assert_eq!(db.get_stats().unwrap().def_fum_count, 1);
    }

    #[test]
    fn test_store_player_page_idempotent() {
        let mut db = PfrDb::in_memory().unwrap();
        let player = pfr_player("R/RoetBe00", Some("Miami (OH)"));
        let passing_rows = vec![passing("R/RoetBe00", 2013)];
        let rush_rows = vec![stat_row("R/RoetBe00", 2013, None)];

        db.store_player_page(&player, &passing_rows, &rush_rows, &[])
            .unwrap();
        db.store_player_page(&player, &passing_rows, &rush_rows, &[])
            .unwrap();

        let stats = db.get_stats().unwrap();
        assert_eq!(stats.player_count, 1);
        assert_eq!(stats.passing_count, 1);
        assert_eq!(stats.rush_recv_count, 1);
    }
}
