// League session: the server collection of one loaded competition plus the
// user's manual overrides, and the pipeline producing everything displayed.

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, info};

use crate::classify::{
    filter_by_team, missing_results, sort_fixtures, sort_results, team_options, Classifier,
    TeamOption,
};
use crate::config::Config;
use crate::feed::competition_title;
use crate::form::{build_form_table, FormResult, FormTable};
use crate::manual::{
    effective_matches, ManualEntryError, ManualEntryId, ManualMatchInput, ManualOverrideSet,
};
use crate::match_record::{MatchId, MatchRecord};
use crate::standings::{StandingsBuilder, StandingsRow};

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// A played match, with the outcome for the filtered team when a team filter
/// is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultEntry {
    #[serde(flatten)]
    pub record: MatchRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<FormResult>,
}

/// Everything derived from the effective collection at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeagueSnapshot {
    pub competition: Option<String>,
    pub title: String,
    pub standings: Vec<StandingsRow>,
    /// Built from server and manual results.
    pub form: FormTable,
    /// Built from server results only.
    pub server_form: FormTable,
    /// Most recent first.
    pub results: Vec<ResultEntry>,
    /// Soonest first.
    pub fixtures: Vec<MatchRecord>,
    /// Past fixtures without a score or a manual entry, soonest first.
    pub missing_results: Vec<MatchRecord>,
    pub excluded: Vec<MatchRecord>,
    pub teams: Vec<TeamOption>,
}

/// Per-list team restriction; `None` shows every team.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamFilter {
    pub results: Option<String>,
    pub fixtures: Option<String>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LeagueSession {
    competition: Option<String>,
    server: Vec<MatchRecord>,
    manual: ManualOverrideSet,
    classifier: Classifier,
    include_unplayed_teams: bool,
}

impl Default for LeagueSession {
    fn default() -> Self {
        LeagueSession::new(&Config::default())
    }
}

impl LeagueSession {
    pub fn new(config: &Config) -> Self {
        LeagueSession {
            competition: None,
            server: Vec::new(),
            manual: ManualOverrideSet::new(),
            classifier: config.classifier(),
            include_unplayed_teams: config.standings.include_unplayed_teams,
        }
    }

    /// Replace the server collection. Manual entries belong to the previous
    /// competition and are discarded.
    pub fn load_competition(&mut self, key: impl Into<String>, matches: Vec<MatchRecord>) {
        let key = key.into();
        info!("Loaded {} matches for competition {}", matches.len(), key);
        self.manual.reset();
        self.competition = Some(key);
        self.server = matches;
    }

    pub fn competition(&self) -> Option<&str> {
        self.competition.as_deref()
    }

    pub fn manual(&self) -> &ManualOverrideSet {
        &self.manual
    }

    pub fn add_manual(&mut self, input: &ManualMatchInput) -> Result<ManualEntryId, ManualEntryError> {
        self.manual.add(input)
    }

    pub fn edit_manual(
        &mut self,
        id: ManualEntryId,
        input: &ManualMatchInput,
    ) -> Result<(), ManualEntryError> {
        self.manual.edit(id, input)
    }

    /// Score a server fixture that is still pending. Played, postponed, and
    /// already-covered matches are not pending.
    pub fn promote_missing(
        &mut self,
        match_id: &MatchId,
        home_score: &str,
        away_score: &str,
    ) -> Result<ManualEntryId, ManualEntryError> {
        let fixture = self
            .server
            .iter()
            .find(|m| {
                &m.id == match_id
                    && !m.is_played()
                    && !self.classifier.is_postponed(m)
                    && !self.manual.covers(m)
            })
            .ok_or_else(|| ManualEntryError::UnknownFixture(match_id.clone()))?;
        self.manual.promote(fixture, home_score, away_score)
    }

    /// Server records not superseded by a manual entry, then every manual
    /// record.
    pub fn effective_matches(&self) -> Vec<&MatchRecord> {
        effective_matches(&self.server, &self.manual)
    }

    pub fn snapshot(&self, now: NaiveDateTime) -> LeagueSnapshot {
        self.view(now, &TeamFilter::default())
    }

    /// Snapshot with results and fixtures restricted per `filter`. Standings,
    /// form, missing results, and team options are never filtered.
    pub fn view(&self, now: NaiveDateTime, filter: &TeamFilter) -> LeagueSnapshot {
        let effective = self.effective_matches();
        let partition = self.classifier.split(effective.iter().copied());
        let server_partition = self.classifier.split(&self.server);
        debug!(
            "Effective collection: {} results, {} fixtures, {} excluded",
            partition.results.len(),
            partition.fixtures.len(),
            partition.excluded.len()
        );

        let mut builder = StandingsBuilder::new();
        if self.include_unplayed_teams {
            for record in partition.results.iter().chain(&partition.fixtures) {
                builder.seed_team(record.home_name(), record.home_crest());
                builder.seed_team(record.away_name(), record.away_crest());
            }
        }
        for record in &partition.results {
            builder.record_match(record);
        }
        let standings = builder.finish();

        let form = build_form_table(partition.results.iter().copied());
        let server_form = build_form_table(server_partition.results.iter().copied());

        let mut missing = missing_results(&partition.fixtures, &self.manual, now);
        sort_fixtures(&mut missing);

        let results_team = filter.results.as_deref();
        let mut results = filter_by_team(&partition.results, results_team);
        sort_results(&mut results);
        let results = results
            .into_iter()
            .map(|record| ResultEntry {
                record: record.clone(),
                outcome: results_team.and_then(|team| FormResult::for_team(record, team)),
            })
            .collect();

        let mut fixtures = filter_by_team(&partition.fixtures, filter.fixtures.as_deref());
        sort_fixtures(&mut fixtures);

        LeagueSnapshot {
            competition: self.competition.clone(),
            title: competition_title(&self.server),
            standings,
            form,
            server_form,
            results,
            fixtures: fixtures.into_iter().cloned().collect(),
            missing_results: missing.into_iter().cloned().collect(),
            excluded: partition.excluded.into_iter().cloned().collect(),
            teams: team_options(effective.iter().copied()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormResult::*;
    use crate::match_record::SideDescriptor;

    fn record(id: &str, home: &str, away: &str, date: &str, score: Option<(u32, u32)>) -> MatchRecord {
        MatchRecord {
            id: id.into(),
            date: Some(date.into()),
            home: Some(SideDescriptor::named(home)),
            away: Some(SideDescriptor::named(away)),
            home_score: score.map(|s| s.0),
            away_score: score.map(|s| s.1),
            ..MatchRecord::default()
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2024-10-01 12:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn loaded(matches: Vec<MatchRecord>) -> LeagueSession {
        let mut session = LeagueSession::default();
        session.load_competition("439637/1/4", matches);
        session
    }

    fn ids(records: &[MatchRecord]) -> Vec<String> {
        records.iter().map(|m| m.id.to_string()).collect()
    }

    #[test]
    fn snapshot_is_idempotent() {
        let session = loaded(vec![
            record("1", "X", "Y", "2024-09-01", Some((2, 1))),
            record("2", "Y", "X", "2024-09-08", Some((0, 0))),
            record("3", "X", "Z", "2024-09-15", None),
        ]);
        let first = session.snapshot(now());
        let second = session.snapshot(now());
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn promoting_missing_result_moves_it_to_results() {
        let mut session = loaded(vec![
            record("1", "A", "B", "2024-09-01", Some((1, 0))),
            record("2", "B", "A", "2024-09-08", None),
        ]);
        let before = session.snapshot(now());
        assert_eq!(ids(&before.missing_results), vec!["2"]);
        assert_eq!(before.results.len(), 1);

        session.promote_missing(&MatchId::from("2"), "2", "2").unwrap();
        let after = session.snapshot(now());
        assert!(after.missing_results.is_empty());
        assert!(after.fixtures.is_empty());
        assert_eq!(after.results.len(), 2);
        assert!(after.results[0].record.manual);
        assert_eq!(after.standings[0].played, 2);
        // Server-only form does not see the manual result.
        assert_eq!(after.server_form.get("A").unwrap(), &[Unknown, Win]);
        assert_eq!(after.form.get("A").unwrap(), &[Unknown, Draw, Win]);
    }

    #[test]
    fn promote_rejects_non_pending_matches() {
        let mut postponed = record("3", "A", "C", "2024-09-15", None);
        postponed.seems_postponed = Some(true);
        let mut session = loaded(vec![
            record("1", "A", "B", "2024-09-01", Some((1, 0))),
            record("2", "B", "A", "2024-09-08", None),
            postponed,
        ]);
        for id in ["1", "3", "404"] {
            let err = session.promote_missing(&MatchId::from(id), "1", "0").unwrap_err();
            assert_eq!(err, ManualEntryError::UnknownFixture(MatchId::from(id)));
        }
        session.promote_missing(&MatchId::from("2"), "1", "0").unwrap();
        assert!(session.promote_missing(&MatchId::from("2"), "1", "0").is_err());
        assert_eq!(session.manual().len(), 1);
    }

    #[test]
    fn postponed_matches_stay_out_of_every_output() {
        let mut postponed = record("p", "A", "B", "2024-09-01", Some((5, 0)));
        postponed.status_label = Some("Reporté".into());
        let session = loaded(vec![postponed, record("1", "A", "B", "2024-09-08", None)]);
        let snapshot = session.snapshot(now());
        assert_eq!(ids(&snapshot.excluded), vec!["p"]);
        assert!(snapshot.standings.is_empty());
        assert!(snapshot.form.is_empty());
        assert!(snapshot.results.is_empty());
        assert_eq!(ids(&snapshot.missing_results), vec!["1"]);
    }

    #[test]
    fn loading_a_competition_clears_manual_entries() {
        let mut session = loaded(vec![]);
        session
            .add_manual(&ManualMatchInput {
                date: "2024-09-21".into(),
                home: "A".into(),
                away: "B".into(),
                home_score: "1".into(),
                away_score: "0".into(),
                ..ManualMatchInput::default()
            })
            .unwrap();
        assert_eq!(session.effective_matches().len(), 1);

        session.load_competition("439637/1/5", vec![]);
        assert!(session.manual().is_empty());
        assert!(session.effective_matches().is_empty());
        assert_eq!(session.competition(), Some("439637/1/5"));
    }

    #[test]
    fn manual_teams_are_selectable() {
        let mut session = loaded(vec![record("1", "A", "B", "2024-09-01", None)]);
        session
            .add_manual(&ManualMatchInput {
                date: "2024-09-21".into(),
                home: "Nouveau".into(),
                away: "A".into(),
                home_score: "0".into(),
                away_score: "0".into(),
                ..ManualMatchInput::default()
            })
            .unwrap();
        let names: Vec<String> = session
            .snapshot(now())
            .teams
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["A", "B", "Nouveau"]);
    }

    #[test]
    fn view_filters_lists_and_adds_outcome() {
        let session = loaded(vec![
            record("1", "A", "B", "2024-09-01", Some((3, 0))),
            record("2", "C", "B", "2024-09-08", Some((1, 1))),
            record("3", "A", "C", "2024-10-15", None),
            record("4", "B", "C", "2024-10-22", None),
        ]);
        let filter = TeamFilter {
            results: Some("B".into()),
            fixtures: Some("A".into()),
        };
        let view = session.view(now(), &filter);
        let outcomes: Vec<(String, Option<FormResult>)> = view
            .results
            .iter()
            .map(|r| (r.record.id.to_string(), r.outcome))
            .collect();
        assert_eq!(
            outcomes,
            vec![("2".to_string(), Some(Draw)), ("1".to_string(), Some(Loss))]
        );
        assert_eq!(ids(&view.fixtures), vec!["3"]);
        // The table is not filtered.
        assert_eq!(view.standings.len(), 3);
        assert!(session.snapshot(now()).results.iter().all(|r| r.outcome.is_none()));
    }

    #[test]
    fn unplayed_teams_get_rows_when_configured() {
        let mut config = Config::default();
        config.standings.include_unplayed_teams = true;
        let mut session = LeagueSession::new(&config);
        session.load_competition(
            "k",
            vec![
                record("1", "Zèbres", "Aigles", "2024-10-15", None),
                record("2", "Castors", "Aigles", "2024-09-01", Some((0, 1))),
            ],
        );
        let snapshot = session.snapshot(now());
        let table: Vec<(&str, usize, u32)> = snapshot
            .standings
            .iter()
            .map(|r| (r.team.as_str(), r.rank, r.played))
            .collect();
        assert_eq!(
            table,
            // Zèbres has not played, so its zero goal difference beats Castors.
            vec![("Aigles", 1, 1), ("Zèbres", 2, 0), ("Castors", 3, 1)]
        );
    }

    #[test]
    fn title_comes_from_server_matches() {
        let mut first = record("1", "A", "B", "2024-09-01", None);
        first.poule = Some(crate::match_record::PouleRef {
            name: Some("POULE D".into()),
        });
        let session = loaded(vec![first]);
        assert_eq!(session.snapshot(now()).title, "Compétition - Poule D");
    }
}
