// League table: folds played matches into ranked standings rows.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::match_record::MatchRecord;

pub const POINTS_FOR_WIN: u32 = 3;
pub const POINTS_FOR_DRAW: u32 = 1;

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// One line of the league table, keyed by resolved team display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandingsRow {
    /// 1-based position, assigned after sorting.
    pub rank: usize,
    pub team: String,
    /// First non-empty crest seen for this team.
    pub crest: Option<String>,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub points: u32,
    /// Order in which the team was first encountered; last-resort tie-break.
    first_seen: usize,
}

impl StandingsRow {
    fn new(team: &str, crest: Option<&str>, first_seen: usize) -> Self {
        StandingsRow {
            rank: 0,
            team: team.to_string(),
            crest: crest.map(str::to_string),
            played: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            goals_for: 0,
            goals_against: 0,
            points: 0,
            first_seen,
        }
    }

    pub fn goal_difference(&self) -> i64 {
        i64::from(self.goals_for) - i64::from(self.goals_against)
    }

    /// Counters saturate: feed goal counts are only bounded by `u32`.
    fn record(&mut self, scored: u32, conceded: u32) {
        self.played = self.played.saturating_add(1);
        self.goals_for = self.goals_for.saturating_add(scored);
        self.goals_against = self.goals_against.saturating_add(conceded);
        match scored.cmp(&conceded) {
            Ordering::Greater => {
                self.wins = self.wins.saturating_add(1);
                self.points = self.points.saturating_add(POINTS_FOR_WIN);
            }
            Ordering::Equal => {
                self.draws = self.draws.saturating_add(1);
                self.points = self.points.saturating_add(POINTS_FOR_DRAW);
            }
            Ordering::Less => {
                self.losses = self.losses.saturating_add(1);
            }
        }
    }
}

impl Serialize for StandingsRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("StandingsRow", 11)?;
        s.serialize_field("rank", &self.rank)?;
        s.serialize_field("team", &self.team)?;
        s.serialize_field("crest", &self.crest)?;
        s.serialize_field("played", &self.played)?;
        s.serialize_field("wins", &self.wins)?;
        s.serialize_field("draws", &self.draws)?;
        s.serialize_field("losses", &self.losses)?;
        s.serialize_field("goals_for", &self.goals_for)?;
        s.serialize_field("goals_against", &self.goals_against)?;
        s.serialize_field("goal_difference", &self.goal_difference())?;
        s.serialize_field("points", &self.points)?;
        s.end()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Accumulates match results into per-team rows.
#[derive(Debug, Default)]
pub struct StandingsBuilder {
    rows: Vec<StandingsRow>,
    index: HashMap<String, usize>,
}

impl StandingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure `team` has a row even if it never plays.
    pub fn seed_team(&mut self, team: &str, crest: Option<&str>) -> &mut Self {
        self.row_mut(team, crest);
        self
    }

    /// Fold one match into the table. Unplayed matches are ignored.
    pub fn record_match(&mut self, record: &MatchRecord) -> &mut Self {
        let Some((home_goals, away_goals)) = record.score() else {
            return self;
        };
        self.row_mut(record.home_name(), record.home_crest())
            .record(home_goals, away_goals);
        self.row_mut(record.away_name(), record.away_crest())
            .record(away_goals, home_goals);
        self
    }

    /// Sort and rank the accumulated rows.
    pub fn finish(self) -> Vec<StandingsRow> {
        let mut rows = self.rows;
        rank_rows(&mut rows);
        rows
    }

    fn row_mut(&mut self, team: &str, crest: Option<&str>) -> &mut StandingsRow {
        let idx = match self.index.get(team) {
            Some(&idx) => idx,
            None => {
                let idx = self.rows.len();
                self.rows.push(StandingsRow::new(team, None, idx));
                self.index.insert(team.to_string(), idx);
                idx
            }
        };
        let row = &mut self.rows[idx];
        if row.crest.is_none() {
            row.crest = crest.map(str::to_string);
        }
        row
    }
}

/// Compute the ranked table from an unordered collection of matches.
pub fn compute_standings<'a, I>(matches: I) -> Vec<StandingsRow>
where
    I: IntoIterator<Item = &'a MatchRecord>,
{
    let mut builder = StandingsBuilder::new();
    for record in matches {
        builder.record_match(record);
    }
    builder.finish()
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Sort rows into table order and assign 1-based ranks.
pub fn rank_rows(rows: &mut [StandingsRow]) {
    rows.sort_by(compare_rows);
    for (idx, row) in rows.iter_mut().enumerate() {
        row.rank = idx + 1;
    }
}

/// Table order: points, goal difference, goals scored (all descending), then
/// team name ascending under French case-insensitive collation.
pub fn compare_rows(a: &StandingsRow, b: &StandingsRow) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| b.goal_difference().cmp(&a.goal_difference()))
        .then_with(|| b.goals_for.cmp(&a.goals_for))
        .then_with(|| compare_team_names(&a.team, &b.team))
        .then_with(|| a.first_seen.cmp(&b.first_seen))
}

/// Total order on team names: collation key first, raw text second, so two
/// distinct names never compare equal.
pub fn compare_team_names(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

/// Base-level French collation key: lowercase with diacritics removed and
/// ligatures expanded.
pub fn collation_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        match c {
            'à' | 'â' | 'ä' | 'á' | 'ã' | 'å' => key.push('a'),
            'ç' => key.push('c'),
            'é' | 'è' | 'ê' | 'ë' => key.push('e'),
            'î' | 'ï' | 'í' | 'ì' => key.push('i'),
            'ô' | 'ö' | 'ó' | 'ò' | 'õ' => key.push('o'),
            'ù' | 'û' | 'ü' | 'ú' => key.push('u'),
            'ÿ' | 'ý' => key.push('y'),
            'ñ' => key.push('n'),
            'œ' => key.push_str("oe"),
            'æ' => key.push_str("ae"),
            other => key.push(other),
        }
    }
    key
}
