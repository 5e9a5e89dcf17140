// Match records as delivered by the competition API, and the normalizer that
// resolves team names, crests, and kickoff date-times from them.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Display name used when a side carries no usable name field.
pub const UNKNOWN_TEAM: &str = "Équipe inconnue";

/// Date-time layouts accepted for the primary/initial date fields, tried in order
/// after RFC 3339.
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Date-only layouts; these resolve to midnight.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Opaque match identifier. The API sends numbers, manual entries use strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MatchId(pub String);

impl<'de> Deserialize<'de> for MatchId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(MatchId(s)),
            Value::Number(n) => Ok(MatchId(n.to_string())),
            Value::Null => Ok(MatchId::default()),
            other => Err(serde::de::Error::custom(format!(
                "unsupported match id: {other}"
            ))),
        }
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MatchId {
    fn from(value: &str) -> Self {
        MatchId(value.to_string())
    }
}

// ---------------------------------------------------------------------------
// Side and competition descriptors
// ---------------------------------------------------------------------------

/// The club a team belongs to. Only the crest (`logo`) and name are used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClubDescriptor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
}

/// One competing team as it appears on a match record.
///
/// The API populates a different subset of the name fields depending on the
/// league and federation that registered the team; see [`team_name`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideDescriptor {
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub short_name_ligue: Option<String>,
    #[serde(default)]
    pub short_name_federation: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub club: Option<ClubDescriptor>,
}

impl SideDescriptor {
    /// A side known only by its display name (manual entries).
    pub fn named(name: impl Into<String>) -> Self {
        SideDescriptor {
            short_name: Some(name.into()),
            ..SideDescriptor::default()
        }
    }

    /// Attach a crest reference under the club descriptor.
    pub fn with_crest(mut self, logo: impl Into<String>) -> Self {
        self.club.get_or_insert_with(ClubDescriptor::default).logo = Some(logo.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitionRef {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseRef {
    #[serde(default, deserialize_with = "lenient_u32")]
    pub number: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PouleRef {
    #[serde(default)]
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
// Match record
// ---------------------------------------------------------------------------

/// One fixture or result.
///
/// A record is played iff both goal fields are present. Goal values that are
/// not non-negative integers in the source JSON decode as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    #[serde(default)]
    pub id: MatchId,
    /// Primary scheduled date.
    #[serde(default)]
    pub date: Option<String>,
    /// Originally scheduled date, used when `date` is absent.
    #[serde(default)]
    pub initial_date: Option<String>,
    /// Free-text kickoff time, e.g. "15H30".
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub home: Option<SideDescriptor>,
    #[serde(default)]
    pub away: Option<SideDescriptor>,
    #[serde(default, deserialize_with = "lenient_goals")]
    pub home_score: Option<u32>,
    #[serde(default, deserialize_with = "lenient_goals")]
    pub away_score: Option<u32>,
    #[serde(default)]
    pub status_label: Option<String>,
    #[serde(default)]
    pub seems_postponed: Option<bool>,
    /// True only for records entered by the user during the session.
    #[serde(default)]
    pub manual: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competition: Option<CompetitionRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<PhaseRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poule: Option<PouleRef>,
}

impl MatchRecord {
    /// Both goal counts, when the match has been played.
    pub fn score(&self) -> Option<(u32, u32)> {
        match (self.home_score, self.away_score) {
            (Some(home), Some(away)) => Some((home, away)),
            _ => None,
        }
    }

    pub fn is_played(&self) -> bool {
        self.score().is_some()
    }

    pub fn home_name(&self) -> &str {
        team_name(self.home.as_ref())
    }

    pub fn away_name(&self) -> &str {
        team_name(self.away.as_ref())
    }

    pub fn home_crest(&self) -> Option<&str> {
        team_crest(self.home.as_ref())
    }

    pub fn away_crest(&self) -> Option<&str> {
        team_crest(self.away.as_ref())
    }

    /// Whether `team` plays on either side of this match.
    pub fn involves(&self, team: &str) -> bool {
        self.home_name() == team || self.away_name() == team
    }

    /// The date used for sorting and classification: `date`, else
    /// `initial_date`, else the empty string.
    pub fn effective_date(&self) -> &str {
        non_empty(self.date.as_deref())
            .or_else(|| non_empty(self.initial_date.as_deref()))
            .unwrap_or("")
    }

    /// Combined date and kickoff time, used only for ordering.
    ///
    /// `None` when the effective date does not parse; callers sort such
    /// records last. A time token that does not parse leaves the date's own
    /// time (midnight for the API's date fields) untouched.
    pub fn kickoff(&self) -> Option<NaiveDateTime> {
        let base = parse_date_value(self.effective_date())?;
        match self.time.as_deref().and_then(parse_time_token) {
            Some(time) => Some(base.date().and_time(time)),
            None => Some(base),
        }
    }
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Resolve a side's display name.
///
/// Fallback order: short name, league short name, federation short name,
/// full name, club name, then [`UNKNOWN_TEAM`]. Empty strings count as absent.
pub fn team_name(side: Option<&SideDescriptor>) -> &str {
    let Some(side) = side else {
        return UNKNOWN_TEAM;
    };
    non_empty(side.short_name.as_deref())
        .or_else(|| non_empty(side.short_name_ligue.as_deref()))
        .or_else(|| non_empty(side.short_name_federation.as_deref()))
        .or_else(|| non_empty(side.name.as_deref()))
        .or_else(|| non_empty(side.club.as_ref().and_then(|c| c.name.as_deref())))
        .unwrap_or(UNKNOWN_TEAM)
}

/// The crest reference stored under `club.logo`, if any.
pub fn team_crest(side: Option<&SideDescriptor>) -> Option<&str> {
    non_empty(side?.club.as_ref()?.logo.as_deref())
}

/// Parse a date or date-time value as sent by the API or typed by a user.
pub fn parse_date_value(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    if let Some(dt) = DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(dt);
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Extract a kickoff time from a token such as "15H30" or "9h05".
///
/// Looks for one or two digits, an `H`, then exactly two digits. A lowercase
/// `h` is accepted too, as typed in manual entries. Anything else, including
/// out-of-range values like "25H00", yields `None`.
pub fn parse_time_token(raw: &str) -> Option<NaiveTime> {
    let bytes = raw.as_bytes();
    for (idx, &b) in bytes.iter().enumerate() {
        if b != b'H' && b != b'h' {
            continue;
        }
        let digits_before = bytes[..idx]
            .iter()
            .rev()
            .take_while(|c| c.is_ascii_digit())
            .count();
        if digits_before == 0 {
            continue;
        }
        let hour_start = idx - digits_before.min(2);
        let Some(minutes) = bytes.get(idx + 1..idx + 3) else {
            continue;
        };
        if !minutes.iter().all(u8::is_ascii_digit) {
            continue;
        }
        let hour: u32 = raw[hour_start..idx].parse().ok()?;
        let minute: u32 = raw[idx + 1..idx + 3].parse().ok()?;
        return NaiveTime::from_hms_opt(hour, minute, 0);
    }
    None
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Lenient decoders
// ---------------------------------------------------------------------------

/// Goals count only when the JSON value is a non-negative integer.
fn lenient_goals<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| v.as_u64())
        .and_then(|n| u32::try_from(n).ok()))
}

/// Accepts integers and numeric strings ("2").
fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
