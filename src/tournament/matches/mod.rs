use std::collections::HashMap;

use chrono::NaiveDateTime;
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use serde::Serialize;

use crate::{
    schema::{challenges, matches, teams},
    tournament::{
        BracketError, MatchStatus, POINTS_FOR_TIE, POINTS_FOR_WIN, Phase,
        challenges::Challenge, teams::Team,
    },
};

pub mod results;

#[derive(Serialize, Queryable, Clone, Debug, PartialEq, Eq)]
pub struct Match {
    pub id: String,
    pub team1_id: String,
    pub team2_id: String,
    pub challenge_id: Option<String>,
    pub status: String,
    pub winner_id: Option<String>,
    pub phase: String,
    pub score1: i64,
    pub score2: i64,
    pub created_at: NaiveDateTime,
}

impl Match {
    #[tracing::instrument(skip(conn))]
    pub fn fetch(
        match_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Match, BracketError> {
        matches::table
            .filter(matches::id.eq(match_id))
            .first::<Match>(conn)
            .optional()?
            .ok_or(BracketError::MatchNotFound)
    }

    /// The matches of a phase, in the order they were created.
    pub fn of_phase(
        phase: Phase,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<Vec<Match>> {
        matches::table
            .filter(matches::phase.eq(phase.as_code()))
            .order_by((matches::created_at.asc(), matches::id.asc()))
            .load::<Match>(conn)
    }

    pub fn count_of_phase(
        phase: Phase,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<i64> {
        matches::table
            .filter(matches::phase.eq(phase.as_code()))
            .count()
            .get_result(conn)
    }

    pub fn count_finished_of_phase(
        phase: Phase,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<i64> {
        matches::table
            .filter(matches::phase.eq(phase.as_code()))
            .filter(matches::status.eq(MatchStatus::Finished.as_code()))
            .count()
            .get_result(conn)
    }

    /// The matches of a phase which have a winner.
    pub fn decided_of_phase(
        phase: Phase,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<Vec<Match>> {
        matches::table
            .filter(matches::phase.eq(phase.as_code()))
            .filter(matches::winner_id.is_not_null())
            .order_by((matches::created_at.asc(), matches::id.asc()))
            .load::<Match>(conn)
    }

    pub fn status(&self) -> MatchStatus {
        MatchStatus::from_code(&self.status).unwrap_or_else(|| {
            tracing::warn!("match {} has unknown status {}", self.id, self.status);
            MatchStatus::Scheduled
        })
    }

    /// The phase is fixed when the match is created; the column is
    /// constrained to the known codes.
    pub fn phase(&self) -> Phase {
        Phase::from_code(&self.phase).unwrap_or_else(|| {
            tracing::warn!("match {} has unknown phase {}", self.id, self.phase);
            Phase::Groups
        })
    }

    pub fn is_finished(&self) -> bool {
        self.status() == MatchStatus::Finished
    }
}

/// How a recorded match ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Winner(String),
    Tie,
}

impl Outcome {
    pub fn of_scores(m: &Match, score1: i64, score2: i64) -> Outcome {
        match score1.cmp(&score2) {
            std::cmp::Ordering::Greater => Outcome::Winner(m.team1_id.clone()),
            std::cmp::Ordering::Less => Outcome::Winner(m.team2_id.clone()),
            std::cmp::Ordering::Equal => Outcome::Tie,
        }
    }
}

/// Finishes a match with the given scores and awards points: three to the
/// winner, or one to each team on a tie.
///
/// A match only ever receives one result. Points are stored on the teams, so
/// accepting a second result for the same match would award its points
/// twice; such a submission is refused with
/// [`BracketError::ResultAlreadyRecorded`] and changes nothing.
#[tracing::instrument(skip(conn))]
pub fn record_result(
    match_id: &str,
    score1: i64,
    score2: i64,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<(Match, Outcome), BracketError> {
    let m = Match::fetch(match_id, conn)?;

    if m.is_finished() {
        tracing::warn!(
            "refusing a second result for match {} ({}-{} already recorded)",
            m.id,
            m.score1,
            m.score2
        );
        return Err(BracketError::ResultAlreadyRecorded);
    }

    let outcome = Outcome::of_scores(&m, score1, score2);

    conn.transaction(|conn| -> QueryResult<()> {
        let winner_id = match &outcome {
            Outcome::Winner(id) => Some(id.as_str()),
            Outcome::Tie => None,
        };

        diesel::update(matches::table.filter(matches::id.eq(&m.id)))
            .set((
                matches::score1.eq(score1),
                matches::score2.eq(score2),
                matches::status.eq(MatchStatus::Finished.as_code()),
                matches::winner_id.eq(winner_id),
            ))
            .execute(conn)?;

        match &outcome {
            Outcome::Winner(id) => {
                diesel::update(teams::table.filter(teams::id.eq(id)))
                    .set(teams::points.eq(teams::points + POINTS_FOR_WIN))
                    .execute(conn)?;
            }
            Outcome::Tie => {
                diesel::update(teams::table.filter(
                    teams::id.eq(&m.team1_id).or(teams::id.eq(&m.team2_id)),
                ))
                .set(teams::points.eq(teams::points + POINTS_FOR_TIE))
                .execute(conn)?;
            }
        }

        Ok(())
    })?;

    tracing::info!(
        "recorded {}-{} for match {} ({:?})",
        score1,
        score2,
        m.id,
        outcome
    );

    Ok((Match::fetch(match_id, conn)?, outcome))
}

/// A match together with the records it refers to, for display.
#[derive(Clone, Debug)]
pub struct MatchDetails {
    pub m: Match,
    pub team1: Team,
    pub team2: Team,
    pub challenge: Option<Challenge>,
}

impl MatchDetails {
    pub fn winner(&self) -> Option<&Team> {
        match self.m.winner_id.as_deref() {
            Some(id) if id == self.team1.id => Some(&self.team1),
            Some(id) if id == self.team2.id => Some(&self.team2),
            _ => None,
        }
    }

    pub fn load(
        ms: Vec<Match>,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<Vec<MatchDetails>> {
        let teams: HashMap<String, Team> = teams::table
            .load::<Team>(conn)?
            .into_iter()
            .map(|t| (t.id.clone(), t))
            .collect();
        let challenges: HashMap<String, Challenge> = challenges::table
            .load::<Challenge>(conn)?
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();

        // Foreign keys guarantee both teams exist.
        Ok(ms
            .into_iter()
            .filter_map(|m| {
                let team1 = teams.get(&m.team1_id)?.clone();
                let team2 = teams.get(&m.team2_id)?.clone();
                let challenge = m
                    .challenge_id
                    .as_ref()
                    .and_then(|id| challenges.get(id))
                    .cloned();
                Some(MatchDetails {
                    m,
                    team1,
                    team2,
                    challenge,
                })
            })
            .collect())
    }

    pub fn fetch(
        match_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<MatchDetails, BracketError> {
        let m = Match::fetch(match_id, conn)?;
        MatchDetails::load(vec![m], conn)?
            .pop()
            .ok_or(BracketError::TeamNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{fresh_conn, register_teams};
    use crate::tournament::draws::draw_groups;

    fn points_of(name: &str, conn: &mut SqliteConnection) -> i64 {
        teams::table
            .filter(teams::name.eq(name))
            .select(teams::points)
            .first(conn)
            .unwrap()
    }

    fn group_match_between(
        a: &str,
        b: &str,
        conn: &mut SqliteConnection,
    ) -> Match {
        let details =
            MatchDetails::load(Match::of_phase(Phase::Groups, conn).unwrap(), conn)
                .unwrap();
        details
            .into_iter()
            .find(|d| d.team1.name == a && d.team2.name == b)
            .unwrap()
            .m
    }

    #[test]
    fn decisive_result_awards_three_points() {
        let mut conn = fresh_conn();
        register_teams(&mut conn, &["A", "B", "C", "D", "E"]);
        draw_groups(&mut conn).unwrap();

        let m = group_match_between("A", "B", &mut conn);
        let (m, outcome) = record_result(&m.id, 3, 1, &mut conn).unwrap();

        assert_eq!(m.status(), MatchStatus::Finished);
        assert_eq!(m.winner_id.as_deref(), Some(m.team1_id.as_str()));
        assert_eq!(outcome, Outcome::Winner(m.team1_id.clone()));
        assert_eq!((m.score1, m.score2), (3, 1));
        assert_eq!(points_of("A", &mut conn), 3);
        assert_eq!(points_of("B", &mut conn), 0);
    }

    #[test]
    fn away_win_goes_to_second_team() {
        let mut conn = fresh_conn();
        register_teams(&mut conn, &["A", "B", "C", "D", "E"]);
        draw_groups(&mut conn).unwrap();

        let m = group_match_between("C", "E", &mut conn);
        let (m, _) = record_result(&m.id, 0, 4, &mut conn).unwrap();

        assert_eq!(m.winner_id.as_deref(), Some(m.team2_id.as_str()));
        assert_eq!(points_of("E", &mut conn), 3);
        assert_eq!(points_of("C", &mut conn), 0);
    }

    #[test]
    fn tie_awards_one_point_each() {
        let mut conn = fresh_conn();
        register_teams(&mut conn, &["A", "B", "C", "D", "E"]);
        draw_groups(&mut conn).unwrap();

        let m = group_match_between("A", "B", &mut conn);
        let (m, outcome) = record_result(&m.id, 2, 2, &mut conn).unwrap();

        assert_eq!(outcome, Outcome::Tie);
        assert_eq!(m.winner_id, None);
        assert_eq!(m.status(), MatchStatus::Finished);
        assert_eq!(points_of("A", &mut conn), 1);
        assert_eq!(points_of("B", &mut conn), 1);
    }

    #[test]
    fn second_result_is_refused() {
        let mut conn = fresh_conn();
        register_teams(&mut conn, &["A", "B", "C", "D", "E"]);
        draw_groups(&mut conn).unwrap();

        let m = group_match_between("A", "B", &mut conn);
        record_result(&m.id, 3, 1, &mut conn).unwrap();

        assert!(matches!(
            record_result(&m.id, 0, 5, &mut conn),
            Err(BracketError::ResultAlreadyRecorded)
        ));

        let stored = Match::fetch(&m.id, &mut conn).unwrap();
        assert_eq!((stored.score1, stored.score2), (3, 1));
        assert_eq!(points_of("A", &mut conn), 3);
        assert_eq!(points_of("B", &mut conn), 0);
    }

    #[test]
    fn negative_scores_are_compared_like_any_other() {
        let mut conn = fresh_conn();
        register_teams(&mut conn, &["A", "B", "C", "D", "E"]);
        draw_groups(&mut conn).unwrap();

        let m = group_match_between("A", "B", &mut conn);
        let (m, outcome) = record_result(&m.id, -1, -3, &mut conn).unwrap();

        assert_eq!(outcome, Outcome::Winner(m.team1_id.clone()));
        assert_eq!((m.score1, m.score2), (-1, -3));
        assert!(m.is_finished());
        assert_eq!(points_of("A", &mut conn), 3);
        assert_eq!(points_of("B", &mut conn), 0);
    }

    #[test]
    fn unknown_match_is_not_found() {
        let mut conn = fresh_conn();
        assert!(matches!(
            record_result("nope", 1, 0, &mut conn),
            Err(BracketError::MatchNotFound)
        ));
    }
}
