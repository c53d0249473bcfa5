use axum_extra::extract::CookieJar;
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use hypertext::prelude::*;

use crate::{
    flash::take_flash,
    state::Conn,
    template::Page,
    tournament::{
        Phase,
        draws::{can_generate_final, can_generate_semifinals},
        matches::{Match, MatchDetails},
        teams::Team,
    },
    util_resp::{StandardResponse, success},
    widgets::actions::ActionButtons,
};

/// Everything shown on the results page.
pub struct Dashboard {
    pub standings: Vec<Team>,
    pub groups: Vec<MatchDetails>,
    pub semifinals: Vec<MatchDetails>,
    pub finals: Vec<MatchDetails>,
    pub can_generate_semifinals: bool,
    pub can_generate_final: bool,
}

impl Dashboard {
    #[tracing::instrument(skip(conn))]
    pub fn load(
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<Dashboard> {
        let standings = Team::standings(conn)?;
        let groups = Match::of_phase(Phase::Groups, conn)?;
        let groups = MatchDetails::load(groups, conn)?;
        let semifinals = Match::of_phase(Phase::Semifinal, conn)?;
        let semifinals = MatchDetails::load(semifinals, conn)?;
        let finals = Match::of_phase(Phase::Final, conn)?;
        let finals = MatchDetails::load(finals, conn)?;

        Ok(Dashboard {
            standings,
            groups,
            semifinals,
            finals,
            can_generate_semifinals: can_generate_semifinals(conn)?,
            can_generate_final: can_generate_final(conn)?,
        })
    }

    pub fn champion(&self) -> Option<&Team> {
        self.finals.first().and_then(|f| f.winner())
    }
}

struct StandingsTable<'r> {
    teams: &'r [Team],
}

impl Renderable for StandingsTable<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud! {
            table class="table table-striped" {
                thead {
                    tr {
                        th scope="col" { "#" }
                        th scope="col" { "Team" }
                        th scope="col" { "School" }
                        th scope="col" { "Points" }
                    }
                }
                tbody {
                    @for (i, team) in self.teams.iter().enumerate() {
                        tr {
                            th scope="row" { (i + 1) }
                            td { (team.name) }
                            td {
                                @if let Some(school) = &team.school {
                                    (school)
                                }
                            }
                            td { (team.points) }
                        }
                    }
                }
            }
        }
        .render_to(buffer)
    }
}

struct MatchesTable<'r> {
    matches: &'r [MatchDetails],
}

impl Renderable for MatchesTable<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud! {
            table class="table" {
                thead {
                    tr {
                        th scope="col" { "Match" }
                        th scope="col" { "Score" }
                        th scope="col" { "Status" }
                        th scope="col" { "Challenge" }
                        th scope="col" {}
                    }
                }
                tbody {
                    @for details in self.matches {
                        tr {
                            td {
                                (details.team1.name) " vs " (details.team2.name)
                            }
                            td {
                                @if details.m.is_finished() {
                                    (details.m.score1) " - " (details.m.score2)
                                    @if let Some(winner) = details.winner() {
                                        br;
                                        small class="text-muted" {
                                            "Winner: " (winner.name)
                                        }
                                    } @else {
                                        br;
                                        small class="text-muted" { "Tie" }
                                    }
                                }
                            }
                            td { (details.m.status().label()) }
                            td {
                                @if let Some(challenge) = &details.challenge {
                                    a href=(format!("/challenges/{}", challenge.id)) {
                                        (challenge.name)
                                    }
                                }
                            }
                            td {
                                @if !details.m.is_finished() {
                                    a class="btn btn-sm btn-primary me-2"
                                      href=(format!("/matches/{}/result", details.m.id)) {
                                        "Record result"
                                    }
                                }
                                a class="btn btn-sm btn-outline-secondary"
                                  href=(format!("/matches/{}/roulette", details.m.id)) {
                                    "Roulette"
                                }
                            }
                        }
                    }
                }
            }
        }
        .render_to(buffer)
    }
}

pub async fn results_page(
    jar: CookieJar,
    mut conn: Conn<false>,
) -> (CookieJar, StandardResponse) {
    let (jar, flash) = take_flash(jar);

    let dashboard = match Dashboard::load(&mut *conn) {
        Ok(dashboard) => dashboard,
        Err(e) => return (jar, Err(e.into())),
    };

    (
        jar,
        success(
            Page::new()
                .title("Results")
                .flash(flash)
                .body(maud! {
                    h1 { "Results" }
                    p class="lead" {
                        (dashboard.standings.len()) " teams registered."
                    }
                    @if let Some(champion) = dashboard.champion() {
                        div class="alert alert-success" role="alert" {
                            "Champion: " strong { (champion.name) }
                        }
                    }

                    h2 class="h4" { "Standings" }
                    StandingsTable teams=(&dashboard.standings);

                    h2 class="h4" { (Phase::Groups.label()) }
                    @if dashboard.groups.is_empty() {
                        p { "The draw has not been done yet." }
                    } @else {
                        MatchesTable matches=(&dashboard.groups);
                    }

                    @if !dashboard.semifinals.is_empty() {
                        h2 class="h4" { "Semifinals" }
                        MatchesTable matches=(&dashboard.semifinals);
                    }

                    @if !dashboard.finals.is_empty() {
                        h2 class="h4" { (Phase::Final.label()) }
                        MatchesTable matches=(&dashboard.finals);
                    }

                    ActionButtons
                        target="/draw"
                        options=(&[
                            (
                                "generar_semifinales",
                                "Generate semifinals",
                                dashboard.can_generate_semifinals,
                            ),
                            (
                                "generar_final",
                                "Generate final",
                                dashboard.can_generate_final,
                            ),
                        ]);
                })
                .render(),
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{fresh_conn, register_teams};
    use crate::tournament::{
        draws::{draw_groups, generate_final, generate_semifinals},
        matches::record_result,
    };

    #[test]
    fn eligibility_follows_the_bracket() {
        let mut conn = fresh_conn();
        register_teams(&mut conn, &["A", "B", "C", "D", "E"]);
        draw_groups(&mut conn).unwrap();

        let dashboard = Dashboard::load(&mut conn).unwrap();
        assert_eq!(dashboard.groups.len(), 10);
        assert!(!dashboard.can_generate_semifinals);
        assert!(!dashboard.can_generate_final);

        for m in dashboard.groups.iter().take(6) {
            record_result(&m.m.id, 1, 0, &mut conn).unwrap();
        }
        let dashboard = Dashboard::load(&mut conn).unwrap();
        assert!(dashboard.can_generate_semifinals);
        assert!(!dashboard.can_generate_final);

        generate_semifinals(&mut conn).unwrap();
        let dashboard = Dashboard::load(&mut conn).unwrap();
        assert_eq!(dashboard.semifinals.len(), 2);
        assert!(!dashboard.can_generate_semifinals);
        assert!(!dashboard.can_generate_final);

        for m in &dashboard.semifinals {
            record_result(&m.m.id, 2, 1, &mut conn).unwrap();
        }
        let dashboard = Dashboard::load(&mut conn).unwrap();
        assert!(dashboard.can_generate_final);

        let (team1, _) = generate_final(&mut conn).unwrap();
        let dashboard = Dashboard::load(&mut conn).unwrap();
        assert!(!dashboard.can_generate_final);
        assert_eq!(dashboard.champion(), None);

        record_result(&dashboard.finals[0].m.id, 3, 0, &mut conn).unwrap();
        let dashboard = Dashboard::load(&mut conn).unwrap();
        assert_eq!(dashboard.champion().map(|t| &t.id), Some(&team1.id));
    }
}
