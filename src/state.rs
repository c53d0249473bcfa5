use std::{
    ops::{Deref, DerefMut},
    sync::{Arc, PoisonError},
};

use axum::{
    Extension, async_trait,
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use diesel::{
    Connection, RunQueryDsl, SqliteConnection,
    connection::TransactionManager,
    r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection},
};

use crate::util_resp::FailureResponse;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

type PooledSqlite = PooledConnection<ConnectionManager<SqliteConnection>>;

type SqliteTxManager = <SqliteConnection as Connection>::TransactionManager;

/// SQLite only enforces foreign keys (and therefore the cascading deletes
/// between teams and matches) when asked to, once per connection.
#[derive(Debug)]
pub struct EnableForeignKeys;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error>
    for EnableForeignKeys
{
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> Result<(), diesel::r2d2::Error> {
        diesel::sql_query("PRAGMA foreign_keys = ON")
            .execute(conn)
            .map(|_| ())
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

struct OpenedConn {
    conn: Arc<tokio::sync::Mutex<PooledSqlite>>,
    tx: bool,
}

/// Holds the connection checked out while handling a single request, so that
/// the transaction opened by [`Conn<true>`] can be settled once the response
/// is known.
#[derive(Clone, Default)]
pub struct RequestConn(Arc<std::sync::Mutex<Option<OpenedConn>>>);

/// Commits opened transactions after each request has been handled, or rolls
/// them back if the handler did not succeed.
pub async fn tx_commit(mut req: Request, next: Next) -> Response {
    let slot = RequestConn::default();
    req.extensions_mut().insert(slot.clone());

    let res = next.run(req).await;

    let opened = slot
        .0
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();

    if let Some(OpenedConn { conn, tx: true }) = opened {
        let mut conn = conn.lock().await;

        let status = res.status();
        let outcome = if status.is_success()
            || status.is_redirection()
            || status.is_informational()
        {
            SqliteTxManager::commit_transaction(&mut **conn)
        } else {
            tracing::debug!("rolling back transaction (status = {status})");
            SqliteTxManager::rollback_transaction(&mut **conn)
        };

        if let Err(e) = outcome {
            tracing::error!("failed to settle transaction: {e}");
            return FailureResponse::ServerError(()).into_response();
        }
    }

    res
}

#[derive(Clone)]
pub struct ThreadSafeConn<const TX: bool> {
    pub inner: Arc<tokio::sync::Mutex<PooledSqlite>>,
}

#[async_trait]
impl<S, const TX: bool> FromRequestParts<S> for ThreadSafeConn<TX>
where
    S: Send + Sync,
{
    type Rejection = FailureResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let slot = parts.extensions.get::<RequestConn>().cloned().ok_or_else(
            || {
                tracing::error!("`tx_commit` middleware is not installed");
                FailureResponse::ServerError(())
            },
        )?;

        let existing = slot
            .0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|opened| (opened.conn.clone(), opened.tx));

        if let Some((conn, tx)) = existing {
            if TX && !tx {
                let mut locked = conn.lock().await;
                SqliteTxManager::begin_transaction(&mut **locked)?;
                drop(locked);
                if let Some(opened) = slot
                    .0
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .as_mut()
                {
                    opened.tx = true;
                }
            }
            return Ok(ThreadSafeConn { inner: conn });
        }

        let Extension(pool) =
            Extension::<DbPool>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    tracing::error!("no database pool was registered");
                    FailureResponse::ServerError(())
                })?;

        let mut conn = tokio::task::spawn_blocking(move || pool.get())
            .await
            .map_err(|e| {
                tracing::error!("connection checkout panicked: {e}");
                FailureResponse::ServerError(())
            })?
            .map_err(|e| {
                tracing::error!("failed to check out a connection: {e}");
                FailureResponse::ServerError(())
            })?;

        if TX {
            SqliteTxManager::begin_transaction(&mut *conn)?;
        }

        let inner = Arc::new(tokio::sync::Mutex::new(conn));
        *slot.0.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(OpenedConn {
                conn: inner.clone(),
                tx: TX,
            });

        Ok(ThreadSafeConn { inner })
    }
}

/// A database connection for the duration of one request. With `TX = true`
/// everything the handler does runs in a single transaction.
pub struct Conn<const TX: bool> {
    inner: tokio::sync::OwnedMutexGuard<PooledSqlite>,
}

impl<const TX: bool> Deref for Conn<TX> {
    type Target = SqliteConnection;

    fn deref(&self) -> &Self::Target {
        &**self.inner
    }
}

impl<const TX: bool> DerefMut for Conn<TX> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut **self.inner
    }
}

#[async_trait]
impl<S, const TX: bool> FromRequestParts<S> for Conn<TX>
where
    S: Send + Sync,
{
    type Rejection = FailureResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let conn =
            ThreadSafeConn::<TX>::from_request_parts(parts, state).await?;
        Ok(Conn {
            inner: conn.inner.lock_owned().await,
        })
    }
}
