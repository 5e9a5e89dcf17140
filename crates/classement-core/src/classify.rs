// Match classification: results, fixtures, postponed records, and the
// past fixtures still waiting for a score.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::manual::{FixtureKey, ManualOverrideSet};
use crate::match_record::{MatchRecord, UNKNOWN_TEAM};
use crate::standings::compare_team_names;

/// Status-label fragment marking a postponed match ("reporté").
pub const DEFAULT_POSTPONED_TOKEN: &str = "report";

// ---------------------------------------------------------------------------
// Partition
// ---------------------------------------------------------------------------

/// Three disjoint groups of one match collection, each in input order.
#[derive(Debug, Clone, Default)]
pub struct Partition<'a> {
    /// Not postponed, both goals present.
    pub results: Vec<&'a MatchRecord>,
    /// Not postponed, score missing.
    pub fixtures: Vec<&'a MatchRecord>,
    /// Postponed by flag or status label.
    pub excluded: Vec<&'a MatchRecord>,
}

/// Splits matches into results, fixtures, and postponed records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classifier {
    /// Lowercased status-label fragments meaning "postponed".
    postponed_tokens: Vec<String>,
}

impl Default for Classifier {
    fn default() -> Self {
        Classifier {
            postponed_tokens: vec![DEFAULT_POSTPONED_TOKEN.to_string()],
        }
    }
}

impl Classifier {
    /// Build a classifier from localized postponement tokens. Empty tokens are
    /// dropped since they would match every label.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let postponed_tokens = tokens
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Classifier { postponed_tokens }
    }

    pub fn is_postponed(&self, record: &MatchRecord) -> bool {
        if record.seems_postponed == Some(true) {
            return true;
        }
        let Some(label) = record.status_label.as_deref() else {
            return false;
        };
        let label = label.to_lowercase();
        self.postponed_tokens.iter().any(|t| label.contains(t.as_str()))
    }

    pub fn split<'a, I>(&self, matches: I) -> Partition<'a>
    where
        I: IntoIterator<Item = &'a MatchRecord>,
    {
        let mut partition = Partition::default();
        for record in matches {
            if self.is_postponed(record) {
                partition.excluded.push(record);
            } else if record.is_played() {
                partition.results.push(record);
            } else {
                partition.fixtures.push(record);
            }
        }
        partition
    }
}

/// Fixtures dated strictly before `now` that no manual entry covers.
/// Undated fixtures are never reported.
pub fn missing_results<'a>(
    fixtures: &[&'a MatchRecord],
    manual: &ManualOverrideSet,
    now: NaiveDateTime,
) -> Vec<&'a MatchRecord> {
    let covered = manual.fixture_keys();
    fixtures
        .iter()
        .copied()
        .filter(|m| m.kickoff().is_some_and(|k| k < now))
        .filter(|m| covered.is_empty() || !covered.contains(&FixtureKey::of(m)))
        .collect()
}

// ---------------------------------------------------------------------------
// Ordering and filtering
// ---------------------------------------------------------------------------

/// Most recent first; undated last.
pub fn most_recent_first(a: Option<NaiveDateTime>, b: Option<NaiveDateTime>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Soonest first; undated last.
pub fn soonest_first(a: Option<NaiveDateTime>, b: Option<NaiveDateTime>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort of results, most recent kickoff first.
pub fn sort_results(results: &mut [&MatchRecord]) {
    results.sort_by(|a, b| most_recent_first(a.kickoff(), b.kickoff()));
}

/// Stable sort of fixtures, soonest kickoff first.
pub fn sort_fixtures(fixtures: &mut [&MatchRecord]) {
    fixtures.sort_by(|a, b| soonest_first(a.kickoff(), b.kickoff()));
}

/// Keep matches involving `team`; `None` keeps everything.
pub fn filter_by_team<'a>(matches: &[&'a MatchRecord], team: Option<&str>) -> Vec<&'a MatchRecord> {
    match team {
        Some(team) => matches.iter().copied().filter(|m| m.involves(team)).collect(),
        None => matches.to_vec(),
    }
}

// ---------------------------------------------------------------------------
// Team options
// ---------------------------------------------------------------------------

/// A selectable team for result/fixture filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamOption {
    pub name: String,
    pub crest: Option<String>,
}

/// Distinct team names across `matches`, in table name order, each with the
/// first crest seen for it. Sides without a usable name are left out.
pub fn team_options<'a, I>(matches: I) -> Vec<TeamOption>
where
    I: IntoIterator<Item = &'a MatchRecord>,
{
    let mut crests: HashMap<&str, Option<&str>> = HashMap::new();
    for record in matches {
        for (name, crest) in [
            (record.home_name(), record.home_crest()),
            (record.away_name(), record.away_crest()),
        ] {
            if name == UNKNOWN_TEAM {
                continue;
            }
            let slot = crests.entry(name).or_insert(None);
            if slot.is_none() {
                *slot = crest;
            }
        }
    }

    let mut options: Vec<TeamOption> = crests
        .into_iter()
        .map(|(name, crest)| TeamOption {
            name: name.to_string(),
            crest: crest.map(str::to_string),
        })
        .collect();
    options.sort_by(|a, b| compare_team_names(&a.name, &b.name));
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::match_record::SideDescriptor;

    fn fixture(id: &str, home: &str, away: &str, date: &str) -> MatchRecord {
        MatchRecord {
            id: id.into(),
            date: Some(date.into()),
            home: Some(SideDescriptor::named(home)),
            away: Some(SideDescriptor::named(away)),
            ..MatchRecord::default()
        }
    }

    fn result(id: &str, home: &str, away: &str, date: &str, hg: u32, ag: u32) -> MatchRecord {
        MatchRecord {
            home_score: Some(hg),
            away_score: Some(ag),
            ..fixture(id, home, away, date)
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2024-10-01 12:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn ids(records: &[&MatchRecord]) -> Vec<String> {
        records.iter().map(|m| m.id.to_string()).collect()
    }

    #[test]
    fn split_is_disjoint() {
        let mut flagged = result("p1", "A", "B", "2024-09-01", 1, 0);
        flagged.seems_postponed = Some(true);
        let mut labelled = fixture("p2", "A", "C", "2024-09-08");
        labelled.status_label = Some("Match REPORTÉ".into());
        let matches = vec![
            result("r1", "A", "B", "2024-09-15", 2, 2),
            fixture("f1", "B", "C", "2024-10-15"),
            flagged,
            labelled,
        ];

        let partition = Classifier::default().split(&matches);
        assert_eq!(ids(&partition.results), vec!["r1"]);
        assert_eq!(ids(&partition.fixtures), vec!["f1"]);
        assert_eq!(ids(&partition.excluded), vec!["p1", "p2"]);
        assert_eq!(
            partition.results.len() + partition.fixtures.len() + partition.excluded.len(),
            matches.len()
        );
    }

    #[test]
    fn half_scored_record_is_a_fixture() {
        let mut m = fixture("f1", "A", "B", "2024-09-01");
        m.home_score = Some(1);
        let partition = Classifier::default().split(std::iter::once(&m));
        assert_eq!(partition.fixtures.len(), 1);
    }

    #[test]
    fn custom_tokens_are_case_insensitive() {
        let classifier = Classifier::new(["Postponed", ""]);
        let mut m = fixture("f1", "A", "B", "2024-09-01");
        m.status_label = Some("POSTPONED (weather)".into());
        assert!(classifier.is_postponed(&m));
        m.status_label = Some("Reporté".into());
        assert!(!classifier.is_postponed(&m));
    }

    #[test]
    fn missing_results_are_past_and_uncovered() {
        let matches = vec![
            fixture("past", "A", "B", "2024-09-01"),
            fixture("future", "A", "C", "2024-11-01"),
            fixture("undated", "B", "C", ""),
        ];
        let partition = Classifier::default().split(&matches);
        let manual = ManualOverrideSet::new();
        let missing = missing_results(&partition.fixtures, &manual, now());
        assert_eq!(ids(&missing), vec!["past"]);
    }

    #[test]
    fn same_day_fixture_uses_kickoff_time() {
        let mut later_today = fixture("f1", "A", "B", "2024-10-01");
        later_today.time = Some("15H00".into());
        let mut earlier_today = fixture("f2", "C", "D", "2024-10-01");
        earlier_today.time = Some("09H30".into());
        let matches = vec![later_today, earlier_today];
        let partition = Classifier::default().split(&matches);
        let missing = missing_results(&partition.fixtures, &ManualOverrideSet::new(), now());
        assert_eq!(ids(&missing), vec!["f2"]);
    }

    #[test]
    fn results_sort_recent_first_undated_last() {
        let matches = vec![
            result("undated", "A", "B", "", 0, 0),
            result("old", "A", "B", "2024-09-01", 0, 0),
            result("new", "A", "B", "2024-09-20", 0, 0),
        ];
        let mut results: Vec<&MatchRecord> = matches.iter().collect();
        sort_results(&mut results);
        assert_eq!(ids(&results), vec!["new", "old", "undated"]);
    }

    #[test]
    fn fixtures_sort_soonest_first_undated_last() {
        let matches = vec![
            fixture("undated-1", "A", "B", "?"),
            fixture("late", "A", "B", "2024-12-01"),
            fixture("undated-2", "A", "B", ""),
            fixture("soon", "A", "B", "2024-10-05"),
        ];
        let mut fixtures: Vec<&MatchRecord> = matches.iter().collect();
        sort_fixtures(&mut fixtures);
        assert_eq!(ids(&fixtures), vec!["soon", "late", "undated-1", "undated-2"]);
    }

    #[test]
    fn team_filter_matches_either_side() {
        let matches = vec![
            fixture("1", "A", "B", "2024-09-01"),
            fixture("2", "C", "A", "2024-09-08"),
            fixture("3", "B", "C", "2024-09-15"),
        ];
        let all: Vec<&MatchRecord> = matches.iter().collect();
        assert_eq!(ids(&filter_by_team(&all, Some("A"))), vec!["1", "2"]);
        assert_eq!(filter_by_team(&all, None).len(), 3);
        assert!(filter_by_team(&all, Some("Z")).is_empty());
    }

    #[test]
    fn team_options_sorted_with_first_crest() {
        let mut first = fixture("1", "Étoile", "lens", "2024-09-01");
        first.away = Some(SideDescriptor::named("lens"));
        let mut second = fixture("2", "Arras", "lens", "2024-09-08");
        second.away = Some(SideDescriptor::named("lens").with_crest("lens.png"));
        let options = team_options(&[first, second]);
        let names: Vec<&str> = options.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["Arras", "Étoile", "lens"]);
        assert_eq!(options[2].crest.as_deref(), Some("lens.png"));
    }

    #[test]
    fn team_options_skip_nameless_sides() {
        let mut nameless = fixture("1", "Arras", "x", "2024-09-01");
        nameless.away = None;
        let mut blank = fixture("2", "y", "Lens", "2024-09-08");
        blank.home = Some(SideDescriptor::default());
        let options = team_options(&[nameless, blank]);
        let names: Vec<&str> = options.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["Arras", "Lens"]);
    }

    #[test]
    fn missing_results_skip_every_covered_fixture() {
        let matches = vec![
            fixture("a", "A", "B", "2024-09-01"),
            fixture("b", "C", "D", "2024-09-01"),
            fixture("c", "A", "C", "2024-09-08"),
        ];
        let partition = Classifier::default().split(&matches);
        let mut manual = ManualOverrideSet::new();
        manual.promote(&matches[0], "1", "0").unwrap();
        manual.promote(&matches[2], "0", "0").unwrap();
        let missing = missing_results(&partition.fixtures, &manual, now());
        assert_eq!(ids(&missing), vec!["b"]);
    }
}
