use axum::{
    Extension, Router, middleware,
    routing::{get, post},
};
use diesel::{
    SqliteConnection,
    r2d2::{ConnectionManager, Pool},
};
use hypertext::prelude::*;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{
    state::{DbPool, EnableForeignKeys, tx_commit},
    template::Page,
    tournament::{
        TEAMS_IN_TOURNAMENT,
        challenges::view::{
            challenge_page, do_spin_roulette, roulette_page, seed,
        },
        dashboard::results_page,
        draws::manage::{do_draw_action, draw_page},
        matches::results::{do_record_result, record_result_page},
        teams::do_delete_team,
    },
    util_resp::{StandardResponse, success},
};

pub async fn home() -> StandardResponse {
    success(
        Page::new()
            .body(maud! {
                h1 { "Robotics tournament" }
                p class="lead" {
                    (TEAMS_IN_TOURNAMENT) " teams play each other once in the \
                     group stage. The best four go through to the \
                     semifinals, and the two winners meet in the final."
                }
                ul {
                    li {
                        a href="/draw" { "Register teams and do the draw" }
                    }
                    li {
                        a href="/results" { "Record results and follow the tournament" }
                    }
                }
            })
            .render(),
    )
}

/// Builds the connection pool. An in-memory database only exists for as long
/// as its connection, so it gets a single connection which is never
/// recycled.
pub fn make_pool(db_url: &str) -> Result<DbPool, diesel::r2d2::PoolError> {
    let in_memory = db_url == ":memory:";

    let builder = Pool::builder()
        .max_size(if in_memory { 1 } else { 10 })
        .connection_customizer(Box::new(EnableForeignKeys));

    let builder = if in_memory {
        builder.max_lifetime(None).idle_timeout(None)
    } else {
        builder
    };

    builder.build(ConnectionManager::<SqliteConnection>::new(db_url))
}

pub fn create_app(pool: DbPool) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/draw", get(draw_page).post(do_draw_action))
        .route("/teams/:id/delete", post(do_delete_team))
        .route("/results", get(results_page))
        .route(
            "/matches/:id/result",
            get(record_result_page).post(do_record_result),
        )
        .route(
            "/matches/:id/roulette",
            get(roulette_page).post(do_spin_roulette),
        )
        .route("/seed", get(seed).post(seed))
        .route("/challenges/:id", get(challenge_page))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(Extension(pool))
                .layer(middleware::from_fn(tx_commit)),
        )
}
