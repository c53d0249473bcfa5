use clap::Parser;
use diesel_migrations::MigrationHarness;
use tokio::task::spawn_blocking;
use torneo::{
    MIGRATIONS,
    config::{create_app, make_pool},
    tournament::challenges::seed_challenges,
};
use tracing_subscriber::EnvFilter;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser, Debug)]
#[clap(about = "Runs the robotics tournament web application.")]
pub struct Args {
    /// Where the SQLite database lives. Defaults to a throwaway in-memory
    /// database.
    #[clap(long, env = "DATABASE_URL", default_value = ":memory:")]
    database_url: String,
    #[clap(long, env = "BIND_ADDR", default_value = "0.0.0.0:8000")]
    bind: String,
    /// Do not create the standard challenges on startup.
    #[clap(long, action)]
    no_seed: bool,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    tracing::info!("database location = {}", args.database_url);

    let pool = make_pool(&args.database_url)?;

    let setup = pool.clone();
    let no_seed = args.no_seed;
    spawn_blocking(move || -> Result<(), BoxError> {
        let mut conn = setup.get()?;
        conn.run_pending_migrations(MIGRATIONS)?;
        if !no_seed {
            seed_challenges(&mut *conn)?;
        }
        Ok(())
    })
    .await??;

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, create_app(pool)).await?;

    Ok(())
}
