// classement entry point.
//
// Startup sequence:
// 1. Parse arguments, load config
// 2. Initialize tracing (stderr, so stdout carries only the report)
// 3. Load the match dump into a session
// 4. Apply manual entries and promotions
// 5. Print the text report or the JSON snapshot

mod display;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::{Local, NaiveDateTime};
use clap::Parser;
use tracing::{info, warn};

use classement_core::config::{self, Config};
use classement_core::feed;
use classement_core::manual::ManualMatchInput;
use classement_core::match_record::{parse_date_value, MatchId};
use classement_core::session::{LeagueSession, TeamFilter};

#[derive(Debug, Parser)]
#[command(name = "classement")]
#[command(about = "League table, form, and fixtures from a competition match dump", long_about = None)]
struct Cli {
    /// Match dump (JSON array, API page, or proxy response)
    matches: PathBuf,

    /// JSON array of manual entries: {date, time?, home, away, home_score, away_score}
    #[arg(long)]
    manual: Option<PathBuf>,

    /// Score a missing result, e.g. `1005=2-1`
    #[arg(long, value_name = "MATCH_ID=HOME-AWAY")]
    promote: Vec<String>,

    /// Restrict results to one team
    #[arg(long)]
    team: Option<String>,

    /// Restrict fixtures to one team (defaults to --team)
    #[arg(long)]
    fixtures_team: Option<String>,

    /// Competition key the manual entries belong to (defaults to the dump file name)
    #[arg(long)]
    competition: Option<String>,

    /// Config file (defaults to config/classement.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reference instant for missing results, e.g. 2024-10-01T12:00:00
    #[arg(long)]
    now: Option<String>,

    /// Print the team selector options and exit
    #[arg(long)]
    teams: bool,

    /// Print the snapshot as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 1. Config first: it carries the default log filter.
    let config = config::load_config(cli.config.as_deref()).context("failed to load configuration")?;

    // 2. Tracing
    init_tracing(&config)?;
    info!("classement starting up");

    // 3. Match dump
    let matches = feed::load_matches(&cli.matches)
        .with_context(|| format!("failed to load matches from {}", cli.matches.display()))?;
    let competition = cli
        .competition
        .clone()
        .unwrap_or_else(|| competition_key(&cli.matches));
    let mut session = LeagueSession::new(&config);
    session.load_competition(competition, matches);

    // 4. Manual data
    if let Some(path) = &cli.manual {
        apply_manual_file(&mut session, path)?;
    }
    for spec in &cli.promote {
        let (id, home, away) = parse_promotion(spec)?;
        session
            .promote_missing(&id, &home, &away)
            .with_context(|| format!("cannot promote `{spec}`"))?;
    }

    // 5. Output
    let now = match &cli.now {
        Some(raw) => parse_now(raw)?,
        None => Local::now().naive_local(),
    };
    let filter = TeamFilter {
        results: cli.team.clone(),
        fixtures: cli.fixtures_team.clone().or_else(|| cli.team.clone()),
    };
    let snapshot = session.view(now, &filter);

    if let Some(team) = &cli.team {
        if !snapshot.teams.iter().any(|t| &t.name == team) {
            warn!("team {:?} does not appear in any match", team);
        }
    }

    if cli.teams {
        print!("{}", display::render_team_options(&snapshot.teams, &config.display));
    } else if cli.json {
        let json = serde_json::to_string_pretty(&snapshot).context("failed to serialize snapshot")?;
        println!("{json}");
    } else {
        print!("{}", display::render_snapshot(&snapshot, now.date(), &config.display));
    }
    Ok(())
}

/// Initialize tracing to stderr; RUST_LOG overrides the configured filter.
fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}

fn competition_key(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "competition".to_string())
}

/// Add every entry of a manual file. Rejected entries are reported and
/// skipped.
fn apply_manual_file(session: &mut LeagueSession, path: &Path) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read manual entries from {}", path.display()))?;
    let inputs: Vec<ManualMatchInput> = serde_json::from_str(&raw)
        .with_context(|| format!("invalid manual entries in {}", path.display()))?;
    let mut added = 0;
    for (idx, input) in inputs.iter().enumerate() {
        match session.add_manual(input) {
            Ok(_) => added += 1,
            Err(e) => warn!("manual entry #{} rejected: {}", idx + 1, e),
        }
    }
    info!("Applied {}/{} manual entries", added, inputs.len());
    Ok(())
}

/// `1005=2-1` → (match id, home score, away score).
fn parse_promotion(spec: &str) -> anyhow::Result<(MatchId, String, String)> {
    let Some((id, score)) = spec.split_once('=') else {
        bail!("expected MATCH_ID=HOME-AWAY, got `{spec}`");
    };
    let Some((home, away)) = score.split_once('-') else {
        bail!("expected a HOME-AWAY score in `{spec}`");
    };
    Ok((
        MatchId::from(id.trim()),
        home.trim().to_string(),
        away.trim().to_string(),
    ))
}

fn parse_now(raw: &str) -> anyhow::Result<NaiveDateTime> {
    parse_date_value(raw).with_context(|| format!("unrecognized --now value `{raw}`"))
}
