// Manual match entries: session-scoped results typed in by the user and
// layered over the server data without touching it.

use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::match_record::{parse_date_value, MatchId, MatchRecord, SideDescriptor};
use crate::standings::collation_key;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Which side of a match a validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Home,
    Away,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Home => f.write_str("home"),
            Side::Away => f.write_str("away"),
        }
    }
}

/// Rejection of a manual entry. The override set is unchanged when returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManualEntryError {
    #[error("{side} team is missing")]
    MissingTeam { side: Side },

    #[error("home and away teams are the same: {team}")]
    SameTeams { team: String },

    #[error("{side} score must be a whole number, got `{value}`")]
    InvalidScore { side: Side, value: String },

    #[error("{side} score cannot be negative, got {value}")]
    NegativeScore { side: Side, value: i64 },

    #[error("match date is missing")]
    MissingDate,

    #[error("match date `{value}` is not a valid date")]
    InvalidDate { value: String },

    #[error("no manual entry with id {0}")]
    UnknownEntry(ManualEntryId),

    #[error("no pending fixture with id {0}")]
    UnknownFixture(MatchId),
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Raw form input for a manual match. Scores stay textual until validated so
/// that "abc" and "-1" can be rejected with a reason. Missing keys decode as
/// empty and are rejected by validation, not by the decoder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualMatchInput {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub home: String,
    #[serde(default)]
    pub away: String,
    #[serde(default, deserialize_with = "score_text")]
    pub home_score: String,
    #[serde(default, deserialize_with = "score_text")]
    pub away_score: String,
}

/// Accepts `2` as well as `"2"` from JSON input files.
fn score_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Input after validation.
#[derive(Debug, Clone)]
struct ValidEntry {
    date: String,
    time: Option<String>,
    home: String,
    away: String,
    home_goals: u32,
    away_goals: u32,
}

fn validate(input: &ManualMatchInput) -> Result<ValidEntry, ManualEntryError> {
    let home = required_team(&input.home, Side::Home)?;
    let away = required_team(&input.away, Side::Away)?;
    distinct_teams(home, away)?;
    let home_goals = parse_goals(&input.home_score, Side::Home)?;
    let away_goals = parse_goals(&input.away_score, Side::Away)?;
    let date = required_date(&input.date)?;
    Ok(ValidEntry {
        date: date.to_string(),
        time: input
            .time
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string),
        home: home.to_string(),
        away: away.to_string(),
        home_goals,
        away_goals,
    })
}

fn required_team(raw: &str, side: Side) -> Result<&str, ManualEntryError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ManualEntryError::MissingTeam { side });
    }
    Ok(name)
}

fn distinct_teams(home: &str, away: &str) -> Result<(), ManualEntryError> {
    if collation_key(home) == collation_key(away) {
        return Err(ManualEntryError::SameTeams {
            team: home.to_string(),
        });
    }
    Ok(())
}

fn parse_goals(raw: &str, side: Side) -> Result<u32, ManualEntryError> {
    let text = raw.trim();
    let value: i64 = text.parse().map_err(|_| ManualEntryError::InvalidScore {
        side,
        value: text.to_string(),
    })?;
    if value < 0 {
        return Err(ManualEntryError::NegativeScore { side, value });
    }
    u32::try_from(value).map_err(|_| ManualEntryError::InvalidScore {
        side,
        value: text.to_string(),
    })
}

fn required_date(raw: &str) -> Result<&str, ManualEntryError> {
    let date = raw.trim();
    if date.is_empty() {
        return Err(ManualEntryError::MissingDate);
    }
    if parse_date_value(date).is_none() {
        return Err(ManualEntryError::InvalidDate {
            value: date.to_string(),
        });
    }
    Ok(date)
}

// ---------------------------------------------------------------------------
// Fixture identity
// ---------------------------------------------------------------------------

/// The calendar day of a match; raw text when the date does not parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MatchDay {
    Date(NaiveDate),
    Raw(String),
}

/// Identity of a fixture across server and manual data: both team names and
/// the effective date.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FixtureKey {
    pub home: String,
    pub away: String,
    pub day: MatchDay,
}

impl FixtureKey {
    pub fn of(record: &MatchRecord) -> Self {
        let raw = record.effective_date();
        let day = match parse_date_value(raw) {
            Some(dt) => MatchDay::Date(dt.date()),
            None => MatchDay::Raw(raw.trim().to_string()),
        };
        FixtureKey {
            home: record.home_name().to_string(),
            away: record.away_name().to_string(),
            day,
        }
    }
}

// ---------------------------------------------------------------------------
// Override set
// ---------------------------------------------------------------------------

/// Stable handle to a manual entry, valid until the set is reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ManualEntryId(u64);

impl fmt::Display for ManualEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "manual-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ManualEntry {
    id: ManualEntryId,
    record: MatchRecord,
}

/// Manual match records for the currently loaded competition.
///
/// Entries are only ever appended or edited in place; the owner empties the
/// set when another competition is loaded. Not synchronized: callers own
/// serialization of mutations.
#[derive(Debug, Clone, Default)]
pub struct ManualOverrideSet {
    entries: Vec<ManualEntry>,
    next_id: u64,
}

impl ManualOverrideSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry. Handles issued before the reset stop resolving.
    pub fn reset(&mut self) {
        if !self.entries.is_empty() {
            info!("Discarding {} manual entries", self.entries.len());
        }
        self.entries.clear();
    }

    /// Validate and append a new manual match.
    pub fn add(&mut self, input: &ManualMatchInput) -> Result<ManualEntryId, ManualEntryError> {
        let entry = validate(input)?;
        let home = SideDescriptor::named(entry.home.clone());
        let away = SideDescriptor::named(entry.away.clone());
        Ok(self.push(entry, home, away))
    }

    /// Turn a fixture without a score into a scored manual entry, keeping its
    /// sides (crests included), date, and kickoff time.
    pub fn promote(
        &mut self,
        fixture: &MatchRecord,
        home_score: &str,
        away_score: &str,
    ) -> Result<ManualEntryId, ManualEntryError> {
        let input = ManualMatchInput {
            date: fixture.effective_date().to_string(),
            time: fixture.time.clone(),
            home: fixture.home_name().to_string(),
            away: fixture.away_name().to_string(),
            home_score: home_score.to_string(),
            away_score: away_score.to_string(),
        };
        let entry = validate(&input)?;
        let home = fixture.home.clone().unwrap_or_else(|| SideDescriptor::named(&entry.home));
        let away = fixture.away.clone().unwrap_or_else(|| SideDescriptor::named(&entry.away));
        Ok(self.push(entry, home, away))
    }

    /// Replace date, teams, and scores of an existing entry in place.
    ///
    /// A side whose name is unchanged keeps its descriptor, so a crest copied
    /// from a promoted fixture survives a score correction.
    pub fn edit(
        &mut self,
        id: ManualEntryId,
        input: &ManualMatchInput,
    ) -> Result<(), ManualEntryError> {
        let entry = validate(input)?;
        let Some(slot) = self.entries.iter_mut().find(|e| e.id == id) else {
            return Err(ManualEntryError::UnknownEntry(id));
        };
        let record = &mut slot.record;
        if record.home_name() != entry.home {
            record.home = Some(SideDescriptor::named(entry.home.clone()));
        }
        if record.away_name() != entry.away {
            record.away = Some(SideDescriptor::named(entry.away.clone()));
        }
        record.date = Some(entry.date);
        record.initial_date = None;
        record.time = entry.time;
        record.home_score = Some(entry.home_goals);
        record.away_score = Some(entry.away_goals);
        info!(
            "Edited {}: {} {}-{} {}",
            id, entry.home, entry.home_goals, entry.away_goals, entry.away
        );
        Ok(())
    }

    pub fn get(&self, id: ManualEntryId) -> Option<&MatchRecord> {
        self.entries.iter().find(|e| e.id == id).map(|e| &e.record)
    }

    pub fn records(&self) -> impl Iterator<Item = &MatchRecord> {
        self.entries.iter().map(|e| &e.record)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether some manual entry stands for the same fixture as `record`.
    /// Prefer [`fixture_keys`](Self::fixture_keys) when checking many records.
    pub fn covers(&self, record: &MatchRecord) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        let key = FixtureKey::of(record);
        self.records().any(|m| FixtureKey::of(m) == key)
    }

    /// The fixtures stood for by manual entries.
    pub fn fixture_keys(&self) -> HashSet<FixtureKey> {
        self.records().map(FixtureKey::of).collect()
    }

    fn push(&mut self, entry: ValidEntry, home: SideDescriptor, away: SideDescriptor) -> ManualEntryId {
        self.next_id += 1;
        let id = ManualEntryId(self.next_id);
        let record = MatchRecord {
            id: MatchId(id.to_string()),
            date: Some(entry.date),
            time: entry.time,
            home: Some(home),
            away: Some(away),
            home_score: Some(entry.home_goals),
            away_score: Some(entry.away_goals),
            manual: true,
            ..MatchRecord::default()
        };
        info!(
            "Added {}: {} {}-{} {}",
            id, entry.home, entry.home_goals, entry.away_goals, entry.away
        );
        self.entries.push(ManualEntry { id, record });
        id
    }
}

/// The collection every downstream computation runs on: server records not
/// superseded by a manual entry, followed by all manual records.
pub fn effective_matches<'a>(
    server: &'a [MatchRecord],
    manual: &'a ManualOverrideSet,
) -> Vec<&'a MatchRecord> {
    let covered = manual.fixture_keys();
    let mut out: Vec<&MatchRecord> = Vec::with_capacity(server.len() + manual.len());
    for record in server {
        if !covered.is_empty() && covered.contains(&FixtureKey::of(record)) {
            debug!("Server match {} superseded by a manual entry", record.id);
            continue;
        }
        out.push(record);
    }
    out.extend(manual.records());
    out
}
