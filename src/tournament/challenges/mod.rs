//! Challenges are the mini-games played in a match. They are reference data:
//! seeded once, never edited, and attached to matches at random. They play
//! no part in scoring.

use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use rand::{Rng, seq::IndexedRandom};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    schema::{challenges, matches},
    tournament::{BracketError, matches::Match},
};

pub mod view;

#[derive(Serialize, Queryable, Clone, Debug, PartialEq, Eq)]
pub struct Challenge {
    pub id: String,
    pub name: String,
    pub description: String,
    pub instructions: String,
}

impl Challenge {
    #[tracing::instrument(skip(conn))]
    pub fn fetch(
        challenge_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Challenge, BracketError> {
        challenges::table
            .filter(challenges::id.eq(challenge_id))
            .first::<Challenge>(conn)
            .optional()?
            .ok_or(BracketError::ChallengeNotFound)
    }

    pub fn all(
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<Vec<Challenge>> {
        challenges::table
            .order_by(challenges::name.asc())
            .load::<Challenge>(conn)
    }
}

/// `(name, description, instructions)` of the challenges every tournament
/// starts with.
pub const SEED_CHALLENGES: [(&str, &str, &str); 3] = [
    (
        "El Puente de Cristal",
        "Versión robótica del juego clásico. Los mBots deben cruzar el \
         tablero eligiendo la casilla correcta en cada paso.",
        "Programación por tiempos. No usar sensores. Ruta secreta: A1 -> B2 \
         -> C2 -> D3 -> E4 -> F5",
    ),
    (
        "Carrera de la Serpiente Obstaculizada",
        "Carrera de velocidad con obstáculos fijos. El que termine primero \
         gana, pero chocar con obstáculos conlleva penalización.",
        "Recorrido: A6 -> F6 -> F1 -> A1. Penalización: +5 segundos por \
         obstáculo derribado.",
    ),
    (
        "El Guardián del Tesoro",
        "Juego de estrategia y precisión. Deben alcanzar un objeto en el \
         centro del tablero evitando zonas de peligro.",
        "Tesoro en D3. Zonas de peligro: fila 2 y columna E. El Guardián \
         elimina mBots en zonas de peligro.",
    ),
];

/// Inserts the standard challenges, unless any challenge exists already.
/// Returns how many challenges were created.
#[tracing::instrument(skip(conn))]
pub fn seed_challenges(
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<usize> {
    conn.transaction(|conn| {
        let existing: i64 = challenges::table.count().get_result(conn)?;
        if existing > 0 {
            tracing::debug!("{existing} challenges exist, not seeding");
            return Ok(0);
        }

        let rows: Vec<_> = SEED_CHALLENGES
            .iter()
            .map(|(name, description, instructions)| {
                (
                    challenges::id.eq(Uuid::now_v7().to_string()),
                    challenges::name.eq(*name),
                    challenges::description.eq(*description),
                    challenges::instructions.eq(*instructions),
                )
            })
            .collect();

        let n = diesel::insert_into(challenges::table)
            .values(&rows)
            .execute(conn)?;

        tracing::info!("seeded {n} challenges");
        Ok(n)
    })
}

/// Attaches a challenge, chosen uniformly at random among all challenges, to
/// the match. May be repeated; each call replaces the previous challenge.
#[tracing::instrument(skip(rng, conn))]
pub fn assign_challenge(
    match_id: &str,
    rng: &mut impl Rng,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<Challenge, BracketError> {
    let m = Match::fetch(match_id, conn)?;

    let all = Challenge::all(conn)?;
    let challenge = all.choose(rng).ok_or(BracketError::NoChallenges)?;

    diesel::update(matches::table.filter(matches::id.eq(&m.id)))
        .set(matches::challenge_id.eq(&challenge.id))
        .execute(conn)?;

    tracing::info!("assigned challenge {} to match {}", challenge.name, m.id);

    Ok(challenge.clone())
}
