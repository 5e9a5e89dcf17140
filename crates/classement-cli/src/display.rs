// Plain-text rendering of a league snapshot.

use std::fmt::Write;

use chrono::{Datelike, NaiveDate};

use classement_core::classify::TeamOption;
use classement_core::config::DisplayConfig;
use classement_core::form::FormTable;
use classement_core::match_record::{parse_date_value, MatchRecord};
use classement_core::session::{LeagueSnapshot, ResultEntry};
use classement_core::standings::StandingsRow;

/// Characters kept from an over-long name in result and fixture lists.
const LIST_NAME_KEEP: usize = 12;

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Names longer than `width` are cut to their first 12 characters.
pub fn truncate_list_name(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        return name.to_string();
    }
    let kept: String = name.chars().take(LIST_NAME_KEEP.min(width)).collect();
    format!("{kept}...")
}

/// Names longer than `width` are cut at `width`.
pub fn truncate_table_name(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        return name.to_string();
    }
    let kept: String = name.chars().take(width).collect();
    format!("{kept}...")
}

/// "dd.mm" within the current year, "dd.mm.yyyy" otherwise. Unparseable
/// dates are shown as given.
pub fn result_date(record: &MatchRecord, today: NaiveDate) -> String {
    let raw = record.effective_date();
    if raw.is_empty() {
        return String::new();
    }
    match parse_date_value(raw) {
        Some(dt) if dt.year() == today.year() => dt.format("%d.%m").to_string(),
        Some(dt) => dt.format("%d.%m.%Y").to_string(),
        None => raw.to_string(),
    }
}

/// "dd.mm - HH:MM" from the date and the "15H30" style time token.
pub fn fixture_date(record: &MatchRecord) -> String {
    let raw = record.effective_date();
    if raw.is_empty() {
        return String::new();
    }
    let Some(dt) = parse_date_value(raw) else {
        return raw.to_string();
    };
    let day = dt.format("%d.%m").to_string();
    match record.time.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        Some(time) => format!("{day} - {}", time.replacen('H', ":", 1)),
        None => day,
    }
}

fn form_letters(form: &FormTable, team: &str) -> String {
    form.sequence(team)
        .iter()
        .map(|r| r.letter().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

pub fn render_standings(rows: &[StandingsRow], form: &FormTable, config: &DisplayConfig) -> String {
    let width = config.standings_name_width + 3;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>3}  {:<width$} {:>3} {:>3} {:>3} {:>3} {:>4} {:>4} {:>5} {:>4}  Forme",
        "#", "Équipe", "J", "G", "N", "P", "BP", "BC", "Diff", "Pts"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:>3}  {:<width$} {:>3} {:>3} {:>3} {:>3} {:>4} {:>4} {:>+5} {:>4}  {}",
            row.rank,
            truncate_table_name(&row.team, config.standings_name_width),
            row.played,
            row.wins,
            row.draws,
            row.losses,
            row.goals_for,
            row.goals_against,
            row.goal_difference(),
            row.points,
            form_letters(form, &row.team),
        );
    }
    out
}

pub fn render_results(results: &[ResultEntry], today: NaiveDate, config: &DisplayConfig) -> String {
    let width = config.team_name_width + 3;
    let mut out = String::new();
    for entry in results {
        let record = &entry.record;
        let (home_goals, away_goals) = record.score().unwrap_or_default();
        let mut line = format!(
            "  {:<10} {:>width$} {:>2} - {:<2} {:<width$}",
            result_date(record, today),
            truncate_list_name(record.home_name(), config.team_name_width),
            home_goals,
            away_goals,
            truncate_list_name(record.away_name(), config.team_name_width),
        );
        if let Some(outcome) = entry.outcome {
            let _ = write!(line, " [{}]", outcome.letter());
        }
        if record.manual {
            line.push_str(" (saisie)");
        }
        let _ = writeln!(out, "{}", line.trim_end());
    }
    out
}

pub fn render_fixtures(fixtures: &[MatchRecord], config: &DisplayConfig) -> String {
    let width = config.team_name_width + 3;
    let mut out = String::new();
    for record in fixtures {
        let line = format!(
            "  {:<14} {:>width$}  -  {:<width$}",
            fixture_date(record),
            truncate_list_name(record.home_name(), config.team_name_width),
            truncate_list_name(record.away_name(), config.team_name_width),
        );
        let _ = writeln!(out, "{}", line.trim_end());
    }
    out
}

/// Missing results carry the match id so they can be scored with `--promote`.
pub fn render_missing(missing: &[MatchRecord], config: &DisplayConfig) -> String {
    let mut out = String::new();
    for record in missing {
        let _ = writeln!(
            out,
            "  [{}] {}  {} - {}",
            record.id,
            fixture_date(record),
            truncate_list_name(record.home_name(), config.team_name_width),
            truncate_list_name(record.away_name(), config.team_name_width),
        );
    }
    out
}

pub fn render_team_options(teams: &[TeamOption], config: &DisplayConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", config.all_teams_label);
    for team in teams {
        let _ = writeln!(out, "{}", team.name);
    }
    out
}

/// The whole snapshot as the text report printed on stdout.
pub fn render_snapshot(snapshot: &LeagueSnapshot, today: NaiveDate, config: &DisplayConfig) -> String {
    let mut out = String::new();
    if !snapshot.title.is_empty() {
        let _ = writeln!(out, "{}\n", snapshot.title);
    }
    out.push_str(&render_standings(&snapshot.standings, &snapshot.form, config));

    let _ = writeln!(out, "\nRésultats ({})", snapshot.results.len());
    out.push_str(&render_results(&snapshot.results, today, config));

    let _ = writeln!(out, "\nÀ venir ({})", snapshot.fixtures.len());
    out.push_str(&render_fixtures(&snapshot.fixtures, config));

    if !snapshot.missing_results.is_empty() {
        let _ = writeln!(out, "\nRésultats manquants ({})", snapshot.missing_results.len());
        out.push_str(&render_missing(&snapshot.missing_results, config));
    }
    if !snapshot.excluded.is_empty() {
        let _ = writeln!(out, "\nMatchs reportés: {}", snapshot.excluded.len());
    }
    out
}
