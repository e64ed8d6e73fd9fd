//! NFL player statistics import CLI
//!
//! Imports nflverse release CSVs and pro-football-reference player pages
//! into local SQLite stores.

use clap::{Parser, Subcommand};
use gridiron::{Config, Result};

#[derive(Parser)]
#[command(name = "gridiron")]
#[command(about = "NFL player statistics importer", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import nflverse roster and seasonal stat CSVs
    Nflverse {
        /// Delete the database file before importing
        #[arg(long)]
        fresh: bool,
        /// Cache directory for downloaded CSV files
        #[arg(long)]
        cache: Option<String>,
        /// Use only cached files (no network requests)
        #[arg(long)]
        offline: bool,
    },
    /// Scrape pro-football-reference player pages from a team roster
    Pfr {
        /// Team slug as used in roster URLs (e.g. pit, gnb)
        #[arg(long, conflicts_with = "url", requires = "year")]
        team: Option<String>,
        /// Roster year
        #[arg(long)]
        year: Option<i32>,
        /// Scrape an explicit roster page URL instead
        #[arg(long)]
        url: Option<String>,
        /// Stop after this many players
        #[arg(long)]
        max_players: Option<usize>,
        /// Pause between player pages in milliseconds (overrides config)
        #[arg(long)]
        delay_ms: Option<u64>,
        /// Cache directory for HTML files
        #[arg(long)]
        cache: Option<String>,
        /// Use only cached files (no network requests)
        #[arg(long)]
        offline: bool,
    },
    /// Show row counts for both stores
    Status,
    /// Initialize a new project with default config
    Init,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    // Run command
    let result = match cli.command {
        Commands::Nflverse {
            fresh,
            cache,
            offline,
        } => commands::nflverse(&config, fresh, cache, offline),
        Commands::Pfr {
            team,
            year,
            url,
            max_players,
            delay_ms,
            cache,
            offline,
        } => commands::pfr(
            &config,
            team,
            year,
            url,
            max_players,
            delay_ms,
            cache,
            offline,
        ),
        Commands::Status => commands::status(&config),
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use std::time::Duration;

    use gridiron::data::sources::nflverse::NflverseClient;
    use gridiron::data::sources::pfr::PfrScraper;
    use gridiron::data::{NflverseDb, PfrDb};
    use gridiron::transform::teams;
    use gridiron::{pipeline, GridironError};

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        // Create data directory
        std::fs::create_dir_all("data")?;
        println!("Created data/ directory");

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!("  2. Run 'gridiron nflverse' to import roster and seasonal stats");
        println!("  3. Run 'gridiron pfr --team pit --year 2013' to scrape player pages");

        Ok(())
    }

    pub fn nflverse(
        config: &Config,
        fresh: bool,
        cache: Option<String>,
        offline: bool,
    ) -> Result<()> {
        if fresh && std::path::Path::new(&config.data.nflverse_db_path).exists() {
            println!("Removing {}", config.data.nflverse_db_path);
            std::fs::remove_file(&config.data.nflverse_db_path)?;
        }

        let mut client = NflverseClient::new(&config.nflverse);

        if let Some(cache_dir) = cache {
            println!("Using cache directory: {}", cache_dir);
            client = client.with_cache(&cache_dir);
        }

        if offline {
            println!("Offline mode: using cached files only");
            client = client.offline_only(true);
        }

        println!(
            "Loading rosters & seasonal stats for {}-{} ...",
            config.seasons.min_year, config.seasons.max_year
        );
        let rosters = client.fetch_rosters(&config.seasons)?;
        println!("Fetched {} roster rows", rosters.len());
        let seasonal = client.fetch_seasonal(&config.seasons)?;
        println!("Fetched {} seasonal rows", seasonal.len());

        if rosters.is_empty() && seasonal.is_empty() {
            println!("No data fetched. Check the URLs or cache directory.");
            return Ok(());
        }

        let mut db = NflverseDb::open(&config.data.nflverse_db_path)?;
        let report = pipeline::nflverse::run(&mut db, rosters, seasonal, &config.seasons)?;

        println!("\nImport complete:");
        println!("  Teams:        {}", report.teams);
        println!("  Players:      {}", report.players);
        println!("  Placeholders: {}", report.placeholder_players);
        println!("  Seasons:      {}", report.seasons);

        Ok(())
    }

    pub fn pfr(
        config: &Config,
        team: Option<String>,
        year: Option<i32>,
        url: Option<String>,
        max_players: Option<usize>,
        delay_ms: Option<u64>,
        cache: Option<String>,
        offline: bool,
    ) -> Result<()> {
        let mut scraper = PfrScraper::new(&config.pfr);

        if let Some(cache_dir) = cache {
            println!("Using cache directory: {}", cache_dir);
            scraper = scraper.with_cache(&cache_dir);
        }

        if offline {
            println!("Offline mode: using cached files only");
            scraper = scraper.offline_only(true);
        }

        let roster_url = if let Some(url) = url {
            url
        } else if let (Some(team), Some(year)) = (team, year) {
            if !teams::is_valid_slug(&team) {
                return Err(GridironError::Config(format!(
                    "Unknown team slug: {}",
                    team
                )));
            }
            scraper.roster_url(&team, year)
        } else {
            return Err(GridironError::Config(
                "Provide --team with --year, or --url".to_string(),
            ));
        };

        println!("Scraping roster at {}", roster_url);
        let links = scraper.roster_player_links(&roster_url)?;

        let delay = Duration::from_millis(delay_ms.unwrap_or(config.pfr.delay_ms));
        let mut db = PfrDb::open(&config.data.pfr_db_path)?;
        let report =
            pipeline::pfr::run(&mut db, &scraper, &links, &config.seasons, delay, max_players)?;

        println!("\nScrape complete:");
        println!(
            "  Players stored:  {}",
            report.players_scraped + report.players_without_data
        );
        println!("  No season data:  {}", report.players_without_data);
        println!("  Fetch failures:  {}", report.players_failed);
        println!("  Passing rows:    {}", report.passing_rows);
        println!("  Rush/recv rows:  {}", report.rush_recv_rows);
        println!("  Def/fum rows:    {}", report.def_fum_rows);

        Ok(())
    }

    pub fn status(config: &Config) -> Result<()> {
        let db = NflverseDb::open(&config.data.nflverse_db_path)?;
        let stats = db.get_stats()?;

        println!("nflverse store");
        println!("───────────────────────────────");
        println!("  Path:     {}", config.data.nflverse_db_path);
        println!("  Players:  {}", stats.player_count);
        println!("  Seasons:  {}", stats.season_count);
        if let (Some(min), Some(max)) = (stats.min_season, stats.max_season) {
            println!("  Range:    {} to {}", min, max);
        }

        let db = PfrDb::open(&config.data.pfr_db_path)?;
        let stats = db.get_stats()?;

        println!("\npro-football-reference store");
        println!("───────────────────────────────");
        println!("  Path:       {}", config.data.pfr_db_path);
        println!("  Players:    {}", stats.player_count);
        println!("  Passing:    {}", stats.passing_count);
        println!("  Rush/recv:  {}", stats.rush_recv_count);
        println!("  Def/fum:    {}", stats.def_fum_count);

        Ok(())
    }
}
