mod config;
mod db;

pub use config::Config;
pub use db::{connect, init_db, shutdown_signal, SqliteUserStore};

#[cfg(test)]
pub use db::testing;
