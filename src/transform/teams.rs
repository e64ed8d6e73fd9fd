//! Canonical team abbreviations and legacy-code normalization

/// The 32 current franchises, in division order
pub const CANONICAL_TEAMS: [&str; 32] = [
    "BUF", "MIA", "NE", "NYJ", "BAL", "CIN", "CLE", "PIT", "HOU", "IND", "JAX", "TEN", "DEN",
    "KC", "LV", "LAC", "DAL", "NYG", "PHI", "WAS", "CHI", "DET", "GB", "MIN", "ATL", "CAR", "NO",
    "TB", "ARI", "LAR", "SF", "SEA",
];

/// Pro-football-reference roster path slugs for the same franchises
pub const PFR_TEAM_SLUGS: [&str; 32] = [
    "pit", "bal", "cin", "cle", "nwe", "buf", "mia", "nyj", "ind", "jax", "hou", "ten", "den",
    "lac", "kan", "lvr", "dal", "nyg", "phi", "was", "chi", "det", "gnb", "min", "car", "atl",
    "nor", "tam", "sfo", "sea", "ram", "ari",
];

/// Map a relocation-era code to the current abbreviation. Codes without a
/// remap entry pass through unchanged.
pub fn remap_team(code: &str) -> &str {
    match code {
        "OAK" => "LV",
        "SD" => "LAC",
        "STL" => "LAR",
        "LA" => "LAR",
        other => other,
    }
}

/// Check a pro-football-reference team slug against the known set
pub fn is_valid_slug(slug: &str) -> bool {
    PFR_TEAM_SLUGS.contains(&slug)
}
