//! Shared fixtures for the tests of this crate.

use axum_test::TestServer;
use diesel::{Connection, RunQueryDsl, SqliteConnection};
use diesel_migrations::MigrationHarness;

use crate::{
    MIGRATIONS,
    config::{create_app, make_pool},
    state::DbPool,
    tournament::teams::{Team, create_team},
};


/// A migrated in-memory database, with foreign keys enforced as they are for
/// pooled connections.
pub fn fresh_conn() -> SqliteConnection {
    let mut conn = SqliteConnection::establish(":memory:").unwrap();
    diesel::sql_query("PRAGMA foreign_keys = ON")
        .execute(&mut conn)
        .unwrap();
    conn.run_pending_migrations(MIGRATIONS).unwrap();
    conn
}

pub fn register_teams(conn: &mut SqliteConnection, names: &[&str]) -> Vec<Team> {
    names
        .iter()
        .map(|name| create_team(name, "", conn).unwrap())
        .collect()
}

/// The application on top of a fresh in-memory database. The pool is
/// returned as well so that tests can look at the database directly; any
/// connection taken from it must be dropped before the next request.
pub fn test_server() -> (DbPool, TestServer) {
    let pool = make_pool(":memory:").unwrap();
    pool.get().unwrap().run_pending_migrations(MIGRATIONS).unwrap();

    let server = TestServer::new(create_app(pool.clone())).unwrap();
    (pool, server)
}
