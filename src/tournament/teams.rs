use axum::{extract::Path, response::Redirect};
use chrono::{NaiveDateTime, Utc};
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    flash::Flash,
    schema::{matches, teams},
    state::Conn,
    tournament::{BracketError, refuse},
    util_resp::{StandardResponse, see_other_flash},
};

pub const MAX_NAME_LEN: usize = 100;

#[derive(Serialize, Queryable, Clone, Debug, PartialEq, Eq)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub school: Option<String>,
    pub points: i64,
    pub created_at: NaiveDateTime,
}

impl Team {
    #[tracing::instrument(skip(conn))]
    pub fn fetch(
        team_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Team, BracketError> {
        teams::table
            .filter(teams::id.eq(team_id))
            .first::<Team>(conn)
            .optional()?
            .ok_or(BracketError::TeamNotFound)
    }

    /// All teams, in the order in which they were registered.
    pub fn all_registered(
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<Vec<Team>> {
        teams::table
            .order_by((teams::created_at.asc(), teams::id.asc()))
            .load::<Team>(conn)
    }

    /// All teams, best first. Teams on equal points are ordered by name and
    /// then by registration order.
    pub fn standings(
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<Vec<Team>> {
        teams::table
            .order_by((
                teams::points.desc(),
                teams::name.asc(),
                teams::created_at.asc(),
                teams::id.asc(),
            ))
            .load::<Team>(conn)
    }

    pub fn count(
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<i64> {
        teams::table.count().get_result(conn)
    }
}

/// Registers a new team with no points. A blank school is stored as no
/// school at all.
#[tracing::instrument(skip(conn))]
pub fn create_team(
    name: &str,
    school: &str,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<Team, BracketError> {
    let name = name.trim();
    let school = school.trim();

    if name.is_empty() {
        return Err(BracketError::InvalidTeamName(
            "The team needs a name.".to_string(),
        ));
    }
    if name.chars().count() > MAX_NAME_LEN
        || school.chars().count() > MAX_NAME_LEN
    {
        return Err(BracketError::InvalidTeamName(format!(
            "Team and school names may be at most {MAX_NAME_LEN} characters \
             long."
        )));
    }

    let team = Team {
        id: Uuid::now_v7().to_string(),
        name: name.to_string(),
        school: (!school.is_empty()).then(|| school.to_string()),
        points: 0,
        created_at: Utc::now().naive_utc(),
    };

    diesel::insert_into(teams::table)
        .values((
            teams::id.eq(&team.id),
            teams::name.eq(&team.name),
            teams::school.eq(&team.school),
            teams::points.eq(team.points),
            teams::created_at.eq(team.created_at),
        ))
        .execute(conn)?;

    tracing::info!("registered team {} ({})", team.name, team.id);

    Ok(team)
}

/// Removes a team together with every match it takes part in.
#[tracing::instrument(skip(conn))]
pub fn delete_team(
    team_id: &str,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<Team, BracketError> {
    let team = Team::fetch(team_id, conn)?;

    conn.transaction(|conn| -> QueryResult<()> {
        diesel::delete(
            matches::table.filter(
                matches::team1_id
                    .eq(&team.id)
                    .or(matches::team2_id.eq(&team.id)),
            ),
        )
        .execute(conn)?;
        diesel::delete(teams::table.filter(teams::id.eq(&team.id)))
            .execute(conn)?;
        Ok(())
    })?;

    Ok(team)
}

pub async fn do_delete_team(
    Path(team_id): Path<String>,
    mut conn: Conn<true>,
) -> StandardResponse {
    match delete_team(&team_id, &mut *conn) {
        Ok(team) => see_other_flash(
            Redirect::to("/draw"),
            Flash::success(format!("Team {} removed.", team.name)),
        ),
        Err(e) => refuse(e, "/draw"),
    }
}
