//! Column mapping and type coercion for scraped stat tables

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};

use crate::{PassingSeasonRecord, SeasonBounds, StatRowRecord};

/// Passing table columns paired with the `data-stat` attribute that carries
/// each value on pro-football-reference season rows
pub const PASSING_MAP: &[(&str, &str)] = &[
    ("year", "year_id"),
    ("age", "age"),
    ("team", "team"),
    ("lg", "lg"),
    ("pos", "pos"),
    ("g", "g"),
    ("gs", "gs"),
    ("qbrec", "qb_rec"),
    ("cmp", "pass_cmp"),
    ("att", "pass_att"),
    ("cmp_pct", "pass_cmp_perc"),
    ("yds", "pass_yds"),
    ("td", "pass_td"),
    ("td_pct", "pass_td_perc"),
    ("int", "pass_int"),
    ("int_pct", "pass_int_perc"),
    ("first_down", "pass_first_down"),
    ("succ_pct", "pass_success_perc"),
    ("long", "pass_long"),
    ("y_per_att", "pass_yds_per_att"),
    ("ay_per_att", "pass_adj_yds_per_att"),
    ("y_per_cmp", "pass_yds_per_cmp"),
    ("y_per_g", "pass_yds_per_g"),
    ("rate", "pass_rating"),
    ("qbr", "qbr"),
    ("sacks", "pass_sacked"),
    ("sack_yds", "pass_sacked_yds"),
    ("sack_pct", "pass_sacked_perc"),
    ("ny_per_att", "pass_net_yds_per_att"),
    ("any_per_att", "pass_adj_net_yds_per_att"),
    ("four_q_comebacks", "comebacks"),
    ("gwd", "gwd"),
    ("av", "av"),
];

/// Parse a whole-number stat cell, treating blanks as missing
pub fn parse_count(text: &str) -> Option<i64> {
    text.trim().parse().ok()
}

/// Parse a fractional stat cell, treating blanks as missing
pub fn parse_real(text: &str) -> Option<f64> {
    text.trim().parse().ok()
}

/// Extract the season year from a raw table row. Rows whose year cell is not
/// a plain in-bounds number (header echoes, "Career" totals, starred partial
/// seasons like "2013*") are rejected.
pub fn season_year(row: &BTreeMap<String, String>, bounds: &SeasonBounds) -> Option<i32> {
    let text = row.get("year_id")?.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = text.parse().ok()?;
    if bounds.contains(year) {
        Some(year)
    } else {
        None
    }
}

/// Build a typed passing record from a raw row keyed by `data-stat` names.
/// The year is resolved by the caller before coercion.
pub fn coerce_passing_row(
    player_id: &str,
    year: i32,
    row: &BTreeMap<String, String>,
) -> PassingSeasonRecord {
    let text = |col: &str| native_cell(row, col).map(str::to_string);
    let count = |col: &str| native_cell(row, col).and_then(parse_count);
    let real = |col: &str| native_cell(row, col).and_then(parse_real);

    PassingSeasonRecord {
        player_id: player_id.to_string(),
        year,
        age: count("age"),
        team: text("team"),
        lg: text("lg"),
        pos: text("pos"),
        g: count("g"),
        gs: count("gs"),
        qbrec: text("qbrec"),
        cmp: count("cmp"),
        att: count("att"),
        cmp_pct: real("cmp_pct"),
        yds: count("yds"),
        td: count("td"),
        td_pct: real("td_pct"),
        int: count("int"),
        int_pct: real("int_pct"),
        first_down: count("first_down"),
        succ_pct: real("succ_pct"),
        long: count("long"),
        y_per_att: real("y_per_att"),
        ay_per_att: real("ay_per_att"),
        y_per_cmp: real("y_per_cmp"),
        y_per_g: real("y_per_g"),
        rate: real("rate"),
        qbr: real("qbr"),
        sacks: count("sacks"),
        sack_yds: count("sack_yds"),
        sack_pct: real("sack_pct"),
        ny_per_att: real("ny_per_att"),
        any_per_att: real("any_per_att"),
        four_q_comebacks: count("four_q_comebacks"),
        gwd: count("gwd"),
        av: count("av"),
    }
}

/// Look up the raw cell behind an output column through PASSING_MAP
fn native_cell<'a>(row: &'a BTreeMap<String, String>, output_col: &str) -> Option<&'a str> {
    let (_, source) = PASSING_MAP.iter().find(|(out, _)| *out == output_col)?;
    row.get(*source).map(String::as_str)
}

/// Convert a raw row into a JSON object, keeping numeric-looking cells as
/// numbers and everything else as strings
pub fn stat_bag(row: &BTreeMap<String, String>) -> Map<String, Value> {
    row.iter()
        .map(|(stat, text)| (stat.clone(), cell_value(text)))
        .collect()
}

fn cell_value(text: &str) -> Value {
    if let Ok(n) = text.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Ok(f) = text.parse::<f64>() {
        if let Some(n) = Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    Value::String(text.to_string())
}

/// Flatten raw rows into storable records, dropping rows outside the season
/// bounds. A source tag, when given, is stamped into each JSON bag so rows
/// from different tables stay distinguishable after storage.
pub fn bag_rows(
    player_id: &str,
    rows: &[BTreeMap<String, String>],
    bounds: &SeasonBounds,
    source_tag: Option<&str>,
) -> Vec<StatRowRecord> {
    let mut records = Vec::new();
    for row in rows {
        let year = match season_year(row, bounds) {
            Some(year) => year,
            None => continue,
        };
        let mut bag = stat_bag(row);
        if let Some(tag) = source_tag {
            bag.insert("_source".to_string(), Value::String(tag.to_string()));
        }
        records.push(StatRowRecord {
            player_id: player_id.to_string(),
            year,
            team: row.get("team").cloned().unwrap_or_default(),
            pos: row.get("pos").cloned().unwrap_or_default(),
            row: bag,
        });
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn bounds() -> SeasonBounds {
        SeasonBounds {
            min_year: 2000,
            max_year: 2024,
        }
    }

    #[test]
    fn test_season_year_accepts_in_bounds() {
        assert_eq!(season_year(&row(&[("year_id", "2013")]), &bounds()), Some(2013));
        assert_eq!(season_year(&row(&[("year_id", "2000")]), &bounds()), Some(2000));
        assert_eq!(season_year(&row(&[("year_id", "2024")]), &bounds()), Some(2024));
    }

    #[test]
    fn test_season_year_rejects_out_of_bounds() {
        assert_eq!(season_year(&row(&[("year_id", "1999")]), &bounds()), None);
        assert_eq!(season_year(&row(&[("year_id", "2025")]), &bounds()), None);
    }

    #[test]
    fn test_season_year_rejects_non_numeric() {
        assert_eq!(season_year(&row(&[("year_id", "2013*")]), &bounds()), None);
        assert_eq!(season_year(&row(&[("year_id", "Career")]), &bounds()), None);
        assert_eq!(season_year(&row(&[("year_id", "")]), &bounds()), None);
        assert_eq!(season_year(&row(&[("g", "16")]), &bounds()), None);
    }

    #[test]
    fn test_coerce_passing_row() {
        let raw = row(&[
            ("year_id", "2013"),
            ("age", "37"),
            ("team", "DEN"),
            ("lg", "NFL"),
            ("pos", "QB"),
            ("g", "16"),
            ("gs", "16"),
            ("qb_rec", "13-3-0"),
            ("pass_cmp", "450"),
            ("pass_att", "659"),
            ("pass_cmp_perc", "68.3"),
            ("pass_yds", "5477"),
            ("pass_td", "55"),
            ("pass_rating", "115.1"),
            ("pass_sacked", "18"),
            ("comebacks", "2"),
            ("gwd", "3"),
            ("av", "19"),
        ]);
        let rec = coerce_passing_row("M/MannPe00", 2013, &raw);
        assert_eq!(rec.player_id, "M/MannPe00");
        assert_eq!(rec.year, 2013);
        assert_eq!(rec.age, Some(37));
        assert_eq!(rec.team.as_deref(), Some("DEN"));
        assert_eq!(rec.qbrec.as_deref(), Some("13-3-0"));
        assert_eq!(rec.cmp, Some(450));
        assert_eq!(rec.cmp_pct, Some(68.3));
        assert_eq!(rec.yds, Some(5477));
        assert_eq!(rec.rate, Some(115.1));
        assert_eq!(rec.four_q_comebacks, Some(2));
        assert_eq!(rec.av, Some(19));
    }

    #[test]
    fn test_coerce_passing_row_missing_cells() {
        let raw = row(&[("year_id", "2013"), ("team", ""), ("pass_cmp", "")]);
        let rec = coerce_passing_row("X/XxxxXx00", 2013, &raw);
        assert_eq!(rec.team.as_deref(), Some(""));
        assert_eq!(rec.cmp, None);
        assert_eq!(rec.age, None);
        assert_eq!(rec.qbrec, None);
        assert_eq!(rec.rate, None);
    }

    #[test]
    fn test_stat_bag_value_kinds() {
        let bag = stat_bag(&row(&[
            ("rush_att", "212"),
            ("rush_yds_per_att", "4.5"),
            ("team", "DEN"),
            ("notes", ""),
        ]));
        assert_eq!(bag["rush_att"], Value::Number(212.into()));
        assert_eq!(bag["rush_yds_per_att"], Value::Number(Number::from_f64(4.5).unwrap()));
        assert_eq!(bag["team"], Value::String("DEN".to_string()));
        assert_eq!(bag["notes"], Value::String(String::new()));
    }

    #[test]
    fn test_bag_rows_gates_and_tags() {
        let rows = vec![
            row(&[("year_id", "2013"), ("team", "DEN"), ("pos", "QB"), ("fumbles", "2")]),
            row(&[("year_id", "Career"), ("fumbles", "31")]),
        ];
        let tagged = bag_rows("M/MannPe00", &rows, &bounds(), Some("fumbles"));
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].year, 2013);
        assert_eq!(tagged[0].team, "DEN");
        assert_eq!(tagged[0].pos, "QB");
        assert_eq!(tagged[0].row["_source"], Value::String("fumbles".to_string()));

        let untagged = bag_rows("M/MannPe00", &rows, &bounds(), None);
        assert!(!untagged[0].row.contains_key("_source"));
    }

    #[test]
    fn test_bag_rows_missing_team_pos_default_empty() {
        let rows = vec![row(&[("year_id", "2010"), ("tackles_solo", "58")])];
        let records = bag_rows("S/SmitXx00", &rows, &bounds(), None);
        assert_eq!(records[0].team, "");
        assert_eq!(records[0].pos, "");
    }
}
