// Recent-form sequences: each team's last results, most recent first.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

use crate::classify::most_recent_first;
use crate::match_record::MatchRecord;

/// Number of real results kept per team.
pub const FORM_LENGTH: usize = 5;

/// Length of every exposed sequence: one leading unknown marker plus
/// [`FORM_LENGTH`] slots.
pub const FORM_SEQUENCE_LEN: usize = FORM_LENGTH + 1;

/// One slot of a form sequence, from the team's own perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormResult {
    Win,
    Draw,
    Loss,
    Unknown,
}

impl FormResult {
    /// Outcome for a side that scored `own` and conceded `other`.
    pub fn from_goals(own: u32, other: u32) -> Self {
        match own.cmp(&other) {
            Ordering::Greater => FormResult::Win,
            Ordering::Equal => FormResult::Draw,
            Ordering::Less => FormResult::Loss,
        }
    }

    /// Outcome of `record` for `team`, if the match is played and involves it.
    pub fn for_team(record: &MatchRecord, team: &str) -> Option<Self> {
        let (home_goals, away_goals) = record.score()?;
        if record.home_name() == team {
            Some(Self::from_goals(home_goals, away_goals))
        } else if record.away_name() == team {
            Some(Self::from_goals(away_goals, home_goals))
        } else {
            None
        }
    }

    /// Badge letter: V(ictoire), N(ul), D(éfaite), or "?".
    pub fn letter(self) -> char {
        match self {
            FormResult::Win => 'V',
            FormResult::Draw => 'N',
            FormResult::Loss => 'D',
            FormResult::Unknown => '?',
        }
    }
}

impl Serialize for FormResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_char(self.letter())
    }
}

/// Per-team form sequences keyed by display name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormTable {
    entries: BTreeMap<String, Vec<FormResult>>,
}

impl FormTable {
    /// The sequence for `team`, or all-unknown markers when the team has no
    /// played match.
    pub fn sequence(&self, team: &str) -> Vec<FormResult> {
        self.entries
            .get(team)
            .cloned()
            .unwrap_or_else(|| vec![FormResult::Unknown; FORM_SEQUENCE_LEN])
    }

    pub fn get(&self, team: &str) -> Option<&[FormResult]> {
        self.entries.get(team).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build form sequences from a match collection. Unplayed matches are ignored.
pub fn build_form_table<'a, I>(matches: I) -> FormTable
where
    I: IntoIterator<Item = &'a MatchRecord>,
{
    let mut played: Vec<(Option<NaiveDateTime>, &MatchRecord)> = matches
        .into_iter()
        .filter(|m| m.is_played())
        .map(|m| (m.kickoff(), m))
        .collect();
    // Stable: undated matches keep encounter order.
    played.sort_by(|a, b| most_recent_first(a.0, b.0));

    let mut entries: BTreeMap<String, Vec<FormResult>> = BTreeMap::new();
    for (_, record) in played {
        let Some((home_goals, away_goals)) = record.score() else {
            continue;
        };
        push_capped(
            &mut entries,
            record.home_name(),
            FormResult::from_goals(home_goals, away_goals),
        );
        push_capped(
            &mut entries,
            record.away_name(),
            FormResult::from_goals(away_goals, home_goals),
        );
    }

    for sequence in entries.values_mut() {
        sequence.insert(0, FormResult::Unknown);
    }
    FormTable { entries }
}

fn push_capped(entries: &mut BTreeMap<String, Vec<FormResult>>, team: &str, result: FormResult) {
    let sequence = entries.entry(team.to_string()).or_default();
    if sequence.len() < FORM_LENGTH {
        sequence.push(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::match_record::SideDescriptor;
    use super::FormResult::*;

    fn played(home: &str, away: &str, hg: u32, ag: u32, date: &str) -> MatchRecord {
        MatchRecord {
            id: format!("{home}-{away}-{date}").as_str().into(),
            date: Some(date.into()),
            home: Some(SideDescriptor::named(home)),
            away: Some(SideDescriptor::named(away)),
            home_score: Some(hg),
            away_score: Some(ag),
            ..MatchRecord::default()
        }
    }

    #[test]
    fn most_recent_result_comes_first() {
        let matches = vec![
            played("A", "B", 3, 0, "2024-09-01"),
            played("B", "A", 1, 0, "2024-09-08"),
        ];
        let form = build_form_table(&matches);
        assert_eq!(form.get("A").unwrap(), &[Unknown, Loss, Win]);
        assert_eq!(form.get("B").unwrap(), &[Unknown, Win, Loss]);
    }

    #[test]
    fn caps_at_five_results_plus_marker() {
        let matches: Vec<MatchRecord> = (1..=8)
            .map(|day| played("A", "B", day % 2, 0, &format!("2024-09-{day:02}")))
            .collect();
        let form = build_form_table(&matches);
        let a = form.get("A").unwrap();
        assert_eq!(a.len(), FORM_SEQUENCE_LEN);
        assert_eq!(a[0], Unknown);
        // Days 8, 7, 6, 5, 4: even days are draws, odd days wins.
        assert_eq!(&a[1..], &[Draw, Win, Draw, Win, Draw]);
    }

    #[test]
    fn kickoff_time_orders_same_day_matches() {
        let mut early = played("A", "B", 1, 0, "2024-09-01");
        early.time = Some("10H00".into());
        let mut late = played("A", "C", 0, 1, "2024-09-01");
        late.time = Some("16H30".into());
        let form = build_form_table(&[early, late]);
        assert_eq!(form.get("A").unwrap(), &[Unknown, Loss, Win]);
    }

    #[test]
    fn undated_matches_sort_last_in_encounter_order() {
        let undated_first = played("A", "B", 0, 0, "");
        let undated_second = played("A", "C", 0, 2, "pas de date");
        let dated = played("A", "D", 4, 0, "2024-09-01");
        let form = build_form_table(&[undated_first, undated_second, dated]);
        assert_eq!(form.get("A").unwrap(), &[Unknown, Win, Draw, Loss]);
    }

    #[test]
    fn teams_without_played_matches_get_default() {
        let mut fixture = played("A", "B", 0, 0, "2024-09-01");
        fixture.home_score = None;
        let form = build_form_table(&[fixture]);
        assert!(form.is_empty());
        assert_eq!(form.sequence("A"), vec![Unknown; FORM_SEQUENCE_LEN]);
    }

    #[test]
    fn result_for_team_mirrors_sides() {
        let m = played("A", "B", 2, 2, "2024-09-01");
        assert_eq!(FormResult::for_team(&m, "A"), Some(Draw));
        let m = played("A", "B", 0, 1, "2024-09-01");
        assert_eq!(FormResult::for_team(&m, "A"), Some(Loss));
        assert_eq!(FormResult::for_team(&m, "B"), Some(Win));
        assert_eq!(FormResult::for_team(&m, "C"), None);
    }

    #[test]
    fn serializes_as_letters() {
        let form = build_form_table(&[played("A", "B", 1, 0, "2024-09-01")]);
        let json = serde_json::to_string(&form).unwrap();
        assert_eq!(json, r#"{"A":["?","V"],"B":["?","D"]}"#);
    }
}
