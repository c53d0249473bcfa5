use axum::{extract::Path, response::Redirect};
use axum_extra::extract::CookieJar;
use hypertext::prelude::*;
use rand::SeedableRng;
use serde_json::json;

use crate::{
    flash::{Flash, take_flash},
    state::Conn,
    template::Page,
    tournament::{
        challenges::{Challenge, assign_challenge, seed_challenges},
        matches::MatchDetails,
        refuse,
    },
    util_resp::{StandardResponse, json, see_other_flash, success},
};

pub async fn challenge_page(
    Path(challenge_id): Path<String>,
    mut conn: Conn<false>,
) -> StandardResponse {
    let challenge = match Challenge::fetch(&challenge_id, &mut *conn) {
        Ok(challenge) => challenge,
        Err(e) => return refuse(e, "/results"),
    };

    success(
        Page::new()
            .title(challenge.name.clone())
            .body(maud! {
                h1 { (challenge.name) }
                p class="lead" { (challenge.description) }
                h2 class="h5" { "Instructions" }
                p { (challenge.instructions) }
            })
            .render(),
    )
}

pub async fn roulette_page(
    Path(match_id): Path<String>,
    jar: CookieJar,
    mut conn: Conn<false>,
) -> (CookieJar, StandardResponse) {
    let (jar, flash) = take_flash(jar);

    let details = match MatchDetails::fetch(&match_id, &mut *conn) {
        Ok(details) => details,
        Err(e) => return (jar, refuse(e, "/results")),
    };
    let challenges = match Challenge::all(&mut *conn) {
        Ok(challenges) => challenges,
        Err(e) => return (jar, Err(e.into())),
    };

    (
        jar,
        success(
            Page::new()
                .title("Challenge roulette")
                .flash(flash)
                .body(maud! {
                    h1 { "Challenge roulette" }
                    p class="lead" {
                        (details.team1.name) " vs " (details.team2.name)
                    }
                    @if let Some(current) = &details.challenge {
                        p {
                            "Current challenge: "
                            a href=(format!("/challenges/{}", current.id)) {
                                (current.name)
                            }
                        }
                    }
                    ul {
                        @for challenge in &challenges {
                            li { (challenge.name) }
                        }
                    }
                    form method="post" {
                        button type="submit" class="btn btn-primary" {
                            "Spin the roulette"
                        }
                    }
                })
                .render(),
        ),
    )
}

pub async fn do_spin_roulette(
    Path(match_id): Path<String>,
    mut conn: Conn<true>,
) -> StandardResponse {
    let mut rng = rand_chacha::ChaCha20Rng::from_os_rng();

    match assign_challenge(&match_id, &mut rng, &mut *conn) {
        Ok(challenge) => see_other_flash(
            Redirect::to("/results"),
            Flash::success(format!(
                "Challenge \"{}\" assigned to the match.",
                challenge.name
            )),
        ),
        Err(e) => refuse(e, "/results"),
    }
}

/// Makes sure the standard challenges exist. Safe to call any number of
/// times.
pub async fn seed(mut conn: Conn<true>) -> StandardResponse {
    seed_challenges(&mut *conn)?;
    json(json!({ "success": true }))
}
