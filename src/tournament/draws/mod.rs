//! Creation of the matches of each phase, and the rules which decide who
//! plays in them.

use chrono::Utc;
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use itertools::Itertools;
use uuid::Uuid;

use crate::{
    schema::{matches, teams},
    tournament::{
        BracketError, MIN_FINISHED_GROUP_MATCHES, MatchStatus, Phase,
        TEAMS_IN_TOURNAMENT, matches::Match, teams::Team,
    },
};

pub mod manage;

fn insert_match(
    team1: &Team,
    team2: &Team,
    phase: Phase,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<()> {
    diesel::insert_into(matches::table)
        .values((
            matches::id.eq(Uuid::now_v7().to_string()),
            matches::team1_id.eq(&team1.id),
            matches::team2_id.eq(&team2.id),
            matches::status.eq(MatchStatus::Scheduled.as_code()),
            matches::phase.eq(phase.as_code()),
            matches::score1.eq(0),
            matches::score2.eq(0),
            matches::created_at.eq(Utc::now().naive_utc()),
        ))
        .execute(conn)?;

    tracing::debug!(
        "created {} match {} vs {}",
        phase.as_code(),
        team1.name,
        team2.name
    );
    Ok(())
}

/// Draws the group stage: every team plays every other team once.
///
/// Any previous matches (of every phase) are discarded and all points are
/// reset. Pairs are created in registration order.
#[tracing::instrument(skip(conn))]
pub fn draw_groups(
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<usize, BracketError> {
    let registered = Team::all_registered(conn)?;

    if registered.len() != TEAMS_IN_TOURNAMENT {
        return Err(BracketError::WrongTeamCount {
            expected: TEAMS_IN_TOURNAMENT,
            found: registered.len(),
        });
    }

    let created = conn.transaction(|conn| -> QueryResult<usize> {
        diesel::delete(matches::table).execute(conn)?;
        diesel::update(teams::table)
            .set(teams::points.eq(0))
            .execute(conn)?;

        let mut created = 0;
        for (team1, team2) in registered.iter().tuple_combinations() {
            insert_match(team1, team2, Phase::Groups, conn)?;
            created += 1;
        }
        Ok(created)
    })?;

    tracing::info!("drew {created} group matches");
    Ok(created)
}

/// Whether the semifinals may be drawn: enough teams, enough finished group
/// matches, and no semifinals yet.
pub fn can_generate_semifinals(
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<bool> {
    Ok(Team::count(conn)? >= 4
        && Match::count_of_phase(Phase::Semifinal, conn)? == 0
        && Match::count_finished_of_phase(Phase::Groups, conn)?
            >= MIN_FINISHED_GROUP_MATCHES)
}

/// Whether the final may be drawn: both semifinals decided, and no final yet.
pub fn can_generate_final(
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<bool> {
    Ok(Match::decided_of_phase(Phase::Semifinal, conn)?.len() == 2
        && Match::count_of_phase(Phase::Final, conn)? == 0)
}

/// Draws the semifinals from the current standings: first plays fourth and
/// second plays third. Replaces any existing semifinals.
///
/// Returns the two pairings, in the order the matches were created.
#[tracing::instrument(skip(conn))]
pub fn generate_semifinals(
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<[(Team, Team); 2], BracketError> {
    let standings = Team::standings(conn)?;

    let [first, second, third, fourth] = match standings.get(..4) {
        Some([a, b, c, d]) => [a, b, c, d].map(|t| t.clone()),
        _ => {
            return Err(BracketError::NotEnoughTeamsForSemifinals {
                found: standings.len(),
            });
        }
    };

    let finished = Match::count_finished_of_phase(Phase::Groups, conn)?;
    if finished < MIN_FINISHED_GROUP_MATCHES {
        return Err(BracketError::GroupStageIncomplete { finished });
    }

    conn.transaction(|conn| -> QueryResult<()> {
        diesel::delete(
            matches::table
                .filter(matches::phase.eq(Phase::Semifinal.as_code())),
        )
        .execute(conn)?;
        insert_match(&first, &fourth, Phase::Semifinal, conn)?;
        insert_match(&second, &third, Phase::Semifinal, conn)?;
        Ok(())
    })?;

    tracing::info!(
        "semifinals: {} vs {}, {} vs {}",
        first.name,
        fourth.name,
        second.name,
        third.name
    );

    Ok([(first, fourth), (second, third)])
}

/// Draws the final between the winners of the two semifinals. Replaces any
/// existing final.
#[tracing::instrument(skip(conn))]
pub fn generate_final(
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<(Team, Team), BracketError> {
    let winner_ids: Vec<String> =
        Match::decided_of_phase(Phase::Semifinal, conn)?
            .into_iter()
            .filter_map(|m| m.winner_id)
            .collect();

    let [winner1, winner2] = winner_ids.as_slice() else {
        return Err(BracketError::SemifinalsUndecided {
            decided: winner_ids.len(),
        });
    };

    let team1 = Team::fetch(winner1, conn)?;
    let team2 = Team::fetch(winner2, conn)?;

    conn.transaction(|conn| -> QueryResult<()> {
        diesel::delete(
            matches::table.filter(matches::phase.eq(Phase::Final.as_code())),
        )
        .execute(conn)?;
        insert_match(&team1, &team2, Phase::Final, conn)
    })?;

    tracing::info!("final: {} vs {}", team1.name, team2.name);

    Ok((team1, team2))
}

/// Deletes every team and every match. Challenges are kept.
#[tracing::instrument(skip(conn))]
pub fn reset_all(
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<usize> {
    conn.transaction(|conn| {
        diesel::delete(matches::table).execute(conn)?;
        let n = diesel::delete(teams::table).execute(conn)?;
        tracing::info!("removed {n} teams");
        Ok(n)
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::test::{fresh_conn, register_teams};
    use crate::tournament::matches::record_result;

    // Registered in reverse alphabetical order, so that ties broken by name
    // and ties broken by registration would disagree.
    const FIVE: [&str; 5] = ["Eon", "Dot", "Cog", "Bit", "Ada"];

    fn match_count(conn: &mut SqliteConnection) -> i64 {
        matches::table.count().get_result(conn).unwrap()
    }

    fn names(pair: &(Team, Team)) -> (&str, &str) {
        (pair.0.name.as_str(), pair.1.name.as_str())
    }

    /// Records `score_a`-`score_b` for the group match between `a` and `b`,
    /// whichever way round the match was drawn.
    fn play(
        a: &str,
        b: &str,
        score_a: i64,
        score_b: i64,
        conn: &mut SqliteConnection,
    ) {
        let registered = Team::all_registered(conn).unwrap();
        let id_of = |name: &str| {
            registered.iter().find(|t| t.name == name).unwrap().id.clone()
        };
        let (a, b) = (id_of(a), id_of(b));

        let m = Match::of_phase(Phase::Groups, conn)
            .unwrap()
            .into_iter()
            .find(|m| {
                (m.team1_id == a && m.team2_id == b)
                    || (m.team1_id == b && m.team2_id == a)
            })
            .unwrap();

        if m.team1_id == a {
            record_result(&m.id, score_a, score_b, conn).unwrap();
        } else {
            record_result(&m.id, score_b, score_a, conn).unwrap();
        }
    }

    /// Ada 9, Bit 6, Cog 2, Dot 1, Eon 1 after seven group matches.
    fn play_group_stage(conn: &mut SqliteConnection) {
        play("Ada", "Bit", 2, 1, conn);
        play("Ada", "Cog", 3, 0, conn);
        play("Ada", "Dot", 1, 0, conn);
        play("Bit", "Cog", 2, 0, conn);
        play("Bit", "Eon", 1, 0, conn);
        play("Cog", "Dot", 1, 1, conn);
        play("Cog", "Eon", 2, 2, conn);
    }

    #[test]
    fn draw_creates_one_match_per_pair() {
        let mut conn = fresh_conn();
        let teams = register_teams(&mut conn, &FIVE);

        assert_eq!(draw_groups(&mut conn).unwrap(), 10);

        let groups = Match::of_phase(Phase::Groups, &mut conn).unwrap();
        assert_eq!(groups.len(), 10);

        let pairs: HashSet<(String, String)> = groups
            .iter()
            .map(|m| {
                assert_eq!(m.phase(), Phase::Groups);
                assert_eq!(m.status(), MatchStatus::Scheduled);
                assert_ne!(m.team1_id, m.team2_id);
                if m.team1_id < m.team2_id {
                    (m.team1_id.clone(), m.team2_id.clone())
                } else {
                    (m.team2_id.clone(), m.team1_id.clone())
                }
            })
            .collect();
        assert_eq!(pairs.len(), 10);

        // Registration order: the first match is between the first two teams.
        assert_eq!(groups[0].team1_id, teams[0].id);
        assert_eq!(groups[0].team2_id, teams[1].id);
    }

    #[test]
    fn redraw_resets_points_and_matches() {
        let mut conn = fresh_conn();
        register_teams(&mut conn, &FIVE);
        draw_groups(&mut conn).unwrap();
        play_group_stage(&mut conn);
        generate_semifinals(&mut conn).unwrap();

        assert_eq!(draw_groups(&mut conn).unwrap(), 10);

        assert_eq!(match_count(&mut conn), 10);
        assert!(
            Team::all_registered(&mut conn)
                .unwrap()
                .iter()
                .all(|t| t.points == 0)
        );
        assert_eq!(
            Match::count_finished_of_phase(Phase::Groups, &mut conn).unwrap(),
            0
        );
    }

    #[test]
    fn draw_needs_exactly_five_teams() {
        for names in [&FIVE[..4], &["A", "B", "C", "D", "E", "F"][..]] {
            let mut conn = fresh_conn();
            register_teams(&mut conn, names);

            assert!(matches!(
                draw_groups(&mut conn),
                Err(BracketError::WrongTeamCount { expected: 5, found })
                    if found == names.len()
            ));
            assert_eq!(match_count(&mut conn), 0);
        }
    }

    #[test]
    fn failed_draw_leaves_existing_data_alone() {
        let mut conn = fresh_conn();
        register_teams(&mut conn, &FIVE);
        draw_groups(&mut conn).unwrap();
        play("Ada", "Bit", 3, 1, &mut conn);

        register_teams(&mut conn, &["Fox"]);
        assert!(draw_groups(&mut conn).is_err());

        assert_eq!(match_count(&mut conn), 10);
        let ada = Team::standings(&mut conn).unwrap().remove(0);
        assert_eq!((ada.name.as_str(), ada.points), ("Ada", 3));
    }

    #[test]
    fn semifinals_pair_first_with_fourth() {
        let mut conn = fresh_conn();
        register_teams(&mut conn, &FIVE);
        draw_groups(&mut conn).unwrap();
        play_group_stage(&mut conn);

        let [a, b] = generate_semifinals(&mut conn).unwrap();
        // Dot and Eon are level on points; Dot wins on name.
        assert_eq!(names(&a), ("Ada", "Dot"));
        assert_eq!(names(&b), ("Bit", "Cog"));

        let semis = Match::of_phase(Phase::Semifinal, &mut conn).unwrap();
        assert_eq!(semis.len(), 2);
        assert_eq!(semis[0].team1_id, a.0.id);
        assert_eq!(semis[0].team2_id, a.1.id);
        assert_eq!(semis[1].team1_id, b.0.id);
        assert_eq!(semis[1].team2_id, b.1.id);
        assert!(semis.iter().all(|m| m.status() == MatchStatus::Scheduled));
    }

    #[test]
    fn regenerating_semifinals_replaces_them() {
        let mut conn = fresh_conn();
        register_teams(&mut conn, &FIVE);
        draw_groups(&mut conn).unwrap();
        play_group_stage(&mut conn);

        generate_semifinals(&mut conn).unwrap();
        generate_semifinals(&mut conn).unwrap();

        assert_eq!(
            Match::count_of_phase(Phase::Semifinal, &mut conn).unwrap(),
            2
        );
        assert_eq!(
            Match::count_of_phase(Phase::Groups, &mut conn).unwrap(),
            10
        );
    }

    #[test]
    fn semifinals_wait_for_the_group_stage() {
        let mut conn = fresh_conn();
        register_teams(&mut conn, &FIVE);
        draw_groups(&mut conn).unwrap();
        play("Ada", "Bit", 2, 1, &mut conn);
        play("Ada", "Cog", 2, 1, &mut conn);
        play("Ada", "Dot", 2, 1, &mut conn);
        play("Ada", "Eon", 2, 1, &mut conn);
        play("Bit", "Cog", 2, 2, &mut conn);

        assert!(!can_generate_semifinals(&mut conn).unwrap());
        assert!(matches!(
            generate_semifinals(&mut conn),
            Err(BracketError::GroupStageIncomplete { finished: 5 })
        ));
        assert_eq!(
            Match::count_of_phase(Phase::Semifinal, &mut conn).unwrap(),
            0
        );

        play("Bit", "Dot", 0, 1, &mut conn);
        assert!(can_generate_semifinals(&mut conn).unwrap());
        assert!(generate_semifinals(&mut conn).is_ok());
        assert!(!can_generate_semifinals(&mut conn).unwrap());
    }

    #[test]
    fn semifinals_need_four_teams() {
        let mut conn = fresh_conn();
        register_teams(&mut conn, &["A", "B", "C"]);

        assert!(matches!(
            generate_semifinals(&mut conn),
            Err(BracketError::NotEnoughTeamsForSemifinals { found: 3 })
        ));
        assert_eq!(match_count(&mut conn), 0);
    }

    #[test]
    fn final_needs_two_decided_semifinals() {
        let mut conn = fresh_conn();
        register_teams(&mut conn, &FIVE);
        draw_groups(&mut conn).unwrap();
        play_group_stage(&mut conn);
        generate_semifinals(&mut conn).unwrap();

        assert!(matches!(
            generate_final(&mut conn),
            Err(BracketError::SemifinalsUndecided { decided: 0 })
        ));

        let semis = Match::of_phase(Phase::Semifinal, &mut conn).unwrap();
        record_result(&semis[0].id, 1, 0, &mut conn).unwrap();
        // A tied semifinal has no winner.
        record_result(&semis[1].id, 2, 2, &mut conn).unwrap();

        assert!(!can_generate_final(&mut conn).unwrap());
        assert!(matches!(
            generate_final(&mut conn),
            Err(BracketError::SemifinalsUndecided { decided: 1 })
        ));
        assert_eq!(
            Match::count_of_phase(Phase::Final, &mut conn).unwrap(),
            0
        );
    }

    #[test]
    fn final_is_played_by_the_semifinal_winners() {
        let mut conn = fresh_conn();
        register_teams(&mut conn, &FIVE);
        draw_groups(&mut conn).unwrap();
        play_group_stage(&mut conn);
        generate_semifinals(&mut conn).unwrap();

        let semis = Match::of_phase(Phase::Semifinal, &mut conn).unwrap();
        // Ada beats Dot, Cog beats Bit.
        record_result(&semis[0].id, 3, 0, &mut conn).unwrap();
        record_result(&semis[1].id, 0, 1, &mut conn).unwrap();

        assert!(can_generate_final(&mut conn).unwrap());
        let final_pair = generate_final(&mut conn).unwrap();
        assert_eq!(names(&final_pair), ("Ada", "Cog"));

        // Drawing the final again replaces it.
        generate_final(&mut conn).unwrap();
        let finals = Match::of_phase(Phase::Final, &mut conn).unwrap();
        assert_eq!(finals.len(), 1);
        assert_eq!(finals[0].team1_id, final_pair.0.id);
        assert_eq!(finals[0].team2_id, final_pair.1.id);
        assert!(!can_generate_final(&mut conn).unwrap());
    }

    #[test]
    fn reset_all_clears_teams_and_matches() {
        let mut conn = fresh_conn();
        register_teams(&mut conn, &FIVE);
        draw_groups(&mut conn).unwrap();

        assert_eq!(reset_all(&mut conn).unwrap(), 5);

        assert_eq!(Team::count(&mut conn).unwrap(), 0);
        assert_eq!(match_count(&mut conn), 0);
    }
}
