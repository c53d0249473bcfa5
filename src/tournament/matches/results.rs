use axum::{Form, extract::Path, response::Redirect};
use axum_extra::extract::CookieJar;
use hypertext::prelude::*;
use serde::Deserialize;

use crate::{
    flash::{Flash, take_flash},
    state::Conn,
    template::Page,
    tournament::{
        matches::{MatchDetails, Outcome, record_result},
        refuse,
    },
    util_resp::{StandardResponse, see_other_flash, success},
    widgets::alert::ErrorAlert,
};

struct ResultForm<'r> {
    details: &'r MatchDetails,
}

impl Renderable for ResultForm<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        let m = &self.details.m;

        maud! {
            h1 { "Record result" }
            p class="lead" {
                (m.phase().label()) ": "
                (self.details.team1.name) " vs " (self.details.team2.name)
            }
            @if let Some(challenge) = &self.details.challenge {
                p {
                    "Challenge: "
                    a href=(format!("/challenges/{}", challenge.id)) {
                        (challenge.name)
                    }
                }
            }
            @if m.is_finished() {
                ErrorAlert msg=(format!(
                    "A result has already been recorded ({} {}-{} {}).",
                    self.details.team1.name,
                    m.score1,
                    m.score2,
                    self.details.team2.name
                ));
            } @else {
                form method="post" {
                    div class="row mb-3" {
                        div class="col" {
                            label for="resultado1" class="form-label" {
                                (self.details.team1.name)
                            }
                            input type="number"
                                  class="form-control"
                                  id="resultado1"
                                  name="resultado1"
                                  value="0"
                                  required;
                        }
                        div class="col" {
                            label for="resultado2" class="form-label" {
                                (self.details.team2.name)
                            }
                            input type="number"
                                  class="form-control"
                                  id="resultado2"
                                  name="resultado2"
                                  value="0"
                                  required;
                        }
                    }
                    button type="submit" class="btn btn-primary" {
                        "Save result"
                    }
                }
            }
        }
        .render_to(buffer)
    }
}

pub async fn record_result_page(
    Path(match_id): Path<String>,
    jar: CookieJar,
    mut conn: Conn<false>,
) -> (CookieJar, StandardResponse) {
    let (jar, flash) = take_flash(jar);

    let details = match MatchDetails::fetch(&match_id, &mut *conn) {
        Ok(details) => details,
        Err(e) => return (jar, refuse(e, "/results")),
    };

    (
        jar,
        success(
            Page::new()
                .title("Record result")
                .flash(flash)
                .body(maud! {
                    ResultForm details=(&details);
                })
                .render(),
        ),
    )
}

#[derive(Deserialize, Debug)]
pub struct RecordResultForm {
    #[serde(default, rename = "resultado1")]
    score1: i64,
    #[serde(default, rename = "resultado2")]
    score2: i64,
}

pub async fn do_record_result(
    Path(match_id): Path<String>,
    mut conn: Conn<true>,
    Form(form): Form<RecordResultForm>,
) -> StandardResponse {
    let details = match MatchDetails::fetch(&match_id, &mut *conn) {
        Ok(details) => details,
        Err(e) => return refuse(e, "/results"),
    };

    match record_result(&match_id, form.score1, form.score2, &mut *conn) {
        Ok((m, outcome)) => {
            let summary = format!(
                "Result recorded: {} {}-{} {}",
                details.team1.name, m.score1, m.score2, details.team2.name
            );
            let summary = match outcome {
                Outcome::Tie => format!("{summary} (tie)."),
                Outcome::Winner(_) => format!("{summary}."),
            };
            see_other_flash(Redirect::to("/results"), Flash::success(summary))
        }
        Err(e) => refuse(e, "/results"),
    }
}
