use axum::{Form, response::Redirect};
use axum_extra::extract::CookieJar;
use hypertext::prelude::*;
use serde::Deserialize;

use crate::{
    flash::{Flash, take_flash},
    state::Conn,
    template::Page,
    tournament::{
        TEAMS_IN_TOURNAMENT,
        draws::{
            can_generate_final, can_generate_semifinals, draw_groups,
            generate_final, generate_semifinals, reset_all,
        },
        refuse,
        teams::{MAX_NAME_LEN, Team, create_team},
    },
    util_resp::{StandardResponse, bad_request, see_other_flash, success},
    widgets::{actions::ActionButtons, alert::ErrorAlert},
};

struct TeamsTable<'r> {
    teams: &'r [Team],
}

impl Renderable for TeamsTable<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud! {
            table class="table" {
                thead {
                    tr {
                        th scope="col" { "#" }
                        th scope="col" { "Team" }
                        th scope="col" { "School" }
                        th scope="col" {}
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
                            td {
                                form method="post"
                                     action=(format!("/teams/{}/delete", team.id)) {
                                    button type="submit"
                                           class="btn btn-sm btn-outline-danger" {
                                        "Remove"
                                    }
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

pub async fn draw_page(
    jar: CookieJar,
    mut conn: Conn<false>,
) -> (CookieJar, StandardResponse) {
    let (jar, flash) = take_flash(jar);

    let teams = match Team::all_registered(&mut *conn) {
        Ok(teams) => teams,
        Err(e) => return (jar, Err(e.into())),
    };
    let ready = teams.len() == TEAMS_IN_TOURNAMENT;
    let eligible = can_generate_semifinals(&mut *conn)
        .and_then(|semis| Ok((semis, can_generate_final(&mut *conn)?)));
    let (semis_ready, final_ready) = match eligible {
        Ok(eligible) => eligible,
        Err(e) => return (jar, Err(e.into())),
    };
    let max_len = MAX_NAME_LEN.to_string();

    (
        jar,
        success(
            Page::new()
                .title("Teams & draw")
                .flash(flash)
                .body(maud! {
                    h1 { "Teams" }
                    p class="lead" {
                        (teams.len()) " of " (TEAMS_IN_TOURNAMENT)
                        " teams registered."
                    }
                    TeamsTable teams=(&teams);

                    h2 class="h4" { "Add a team" }
                    form method="post" class="row g-3 mb-4" {
                        input type="hidden" name="agregar_equipo" value="1";
                        div class="col-md-5" {
                            label for="nombre" class="form-label" { "Name" }
                            input type="text"
                                  class="form-control"
                                  id="nombre"
                                  name="nombre"
                                  maxlength=(max_len)
                                  required;
                        }
                        div class="col-md-5" {
                            label for="escuela" class="form-label" { "School" }
                            input type="text"
                                  class="form-control"
                                  id="escuela"
                                  name="escuela"
                                  maxlength=(max_len);
                        }
                        div class="col-md-2 align-self-end" {
                            button type="submit" class="btn btn-primary w-100" {
                                "Add"
                            }
                        }
                    }

                    h2 class="h4" { "Tournament" }
                    ActionButtons
                        target="/draw"
                        options=(&[
                            ("realizar_sorteo", "Draw the group stage", ready),
                            (
                                "generar_semifinales",
                                "Generate semifinals",
                                semis_ready,
                            ),
                            ("generar_final", "Generate final", final_ready),
                            ("eliminar_todos", "Remove all teams", !teams.is_empty()),
                        ]);
                })
                .render(),
        ),
    )
}

/// The draw page posts a single form; which action was requested is told by
/// which flag is present.
#[derive(Deserialize, Debug, Default)]
pub struct DrawPageForm {
    #[serde(rename = "nombre")]
    name: Option<String>,
    #[serde(rename = "escuela")]
    school: Option<String>,
    agregar_equipo: Option<String>,
    eliminar_todos: Option<String>,
    realizar_sorteo: Option<String>,
    generar_semifinales: Option<String>,
    generar_final: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum DrawPageAction {
    AddTeam { name: String, school: String },
    RemoveAll,
    DrawGroups,
    GenerateSemifinals,
    GenerateFinal,
}

impl DrawPageForm {
    /// If several flags are present, the first in this order wins.
    pub fn action(self) -> Option<DrawPageAction> {
        if self.agregar_equipo.is_some() {
            Some(DrawPageAction::AddTeam {
                name: self.name.unwrap_or_default(),
                school: self.school.unwrap_or_default(),
            })
        } else if self.eliminar_todos.is_some() {
            Some(DrawPageAction::RemoveAll)
        } else if self.realizar_sorteo.is_some() {
            Some(DrawPageAction::DrawGroups)
        } else if self.generar_semifinales.is_some() {
            Some(DrawPageAction::GenerateSemifinals)
        } else if self.generar_final.is_some() {
            Some(DrawPageAction::GenerateFinal)
        } else {
            None
        }
    }
}

pub async fn do_draw_action(
    mut conn: Conn<true>,
    Form(form): Form<DrawPageForm>,
) -> StandardResponse {
    let Some(action) = form.action() else {
        return bad_request(
            Page::new()
                .title("Bad request")
                .body(maud! {
                    ErrorAlert msg="No action was selected.";
                    a href="/draw" { "Back to the draw page" }
                })
                .render(),
        );
    };

    tracing::debug!("draw page action: {action:?}");

    match action {
        DrawPageAction::AddTeam { name, school } => {
            match create_team(&name, &school, &mut *conn) {
                Ok(team) => see_other_flash(
                    Redirect::to("/draw"),
                    Flash::success(format!("Team {} added.", team.name)),
                ),
                Err(e) => refuse(e, "/draw"),
            }
        }
        DrawPageAction::RemoveAll => {
            let n = reset_all(&mut *conn)?;
            see_other_flash(
                Redirect::to("/draw"),
                Flash::success(format!("{n} teams removed.")),
            )
        }
        DrawPageAction::DrawGroups => match draw_groups(&mut *conn) {
            Ok(n) => see_other_flash(
                Redirect::to("/results"),
                Flash::success(format!(
                    "Draw done! {n} group stage matches were created."
                )),
            ),
            Err(e) => refuse(e, "/draw"),
        },
        DrawPageAction::GenerateSemifinals => {
            match generate_semifinals(&mut *conn) {
                Ok(_) => see_other_flash(
                    Redirect::to("/results"),
                    Flash::success("Semifinals generated!"),
                ),
                Err(e) => refuse(e, "/results"),
            }
        }
        DrawPageAction::GenerateFinal => match generate_final(&mut *conn) {
            Ok(_) => see_other_flash(
                Redirect::to("/results"),
                Flash::success("Final generated!"),
            ),
            Err(e) => refuse(e, "/results"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Option<DrawPageAction> {
        serde_urlencoded::from_str::<DrawPageForm>(body)
            .unwrap()
            .action()
    }

    #[test]
    fn flags_select_the_action() {
        assert_eq!(
            parse("agregar_equipo=1&nombre=Robotines&escuela=IES+Sur"),
            Some(DrawPageAction::AddTeam {
                name: "Robotines".to_string(),
                school: "IES Sur".to_string(),
            })
        );
        assert_eq!(
            parse("agregar_equipo=1&nombre=Solo"),
            Some(DrawPageAction::AddTeam {
                name: "Solo".to_string(),
                school: String::new(),
            })
        );
        assert_eq!(parse("eliminar_todos="), Some(DrawPageAction::RemoveAll));
        assert_eq!(parse("realizar_sorteo=1"), Some(DrawPageAction::DrawGroups));
        assert_eq!(
            parse("generar_semifinales=1"),
            Some(DrawPageAction::GenerateSemifinals)
        );
        assert_eq!(parse("generar_final=1"), Some(DrawPageAction::GenerateFinal));
        assert_eq!(parse("nombre=Nobody"), None);
    }
}
