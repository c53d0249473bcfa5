use diesel_migrations::{EmbeddedMigrations, embed_migrations};

pub mod config;
pub mod flash;
pub mod schema;
pub mod state;
pub mod template;
pub mod tournament;
pub mod util_resp;
pub mod widgets;

#[cfg(test)]
mod test;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");
