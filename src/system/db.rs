use anyhow::Result;
use async_trait::async_trait;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::UserStore;
use crate::models::{NewUser, StoreError, User};

pub async fn connect(db_url: &str) -> Result<SqlitePool> {
    let pool = pool_options(db_url).connect(db_url).await?;
    Ok(pool)
}

/// An in-memory database lives only as long as its one connection, so that
/// connection is never reaped.
fn pool_options(db_url: &str) -> SqlitePoolOptions {
    if db_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    }
}

pub async fn init_db(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            full_name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            hashed_password TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'user',
            status TEXT NOT NULL DEFAULT 'active'
        )",
    )
    .execute(pool)
    .await?;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    info!("Users table ready ({} accounts)", count);
    Ok(())
}

#[derive(Clone)]
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE email = ? AND status NOT IN (?, ?)",
        )
        .bind(email)
        .bind("inactive")
        .bind("deleted")
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let id = Uuid::new_v4().to_string();
        debug!("Creating user {} <{}>", id, new_user.email);
        let sql = "INSERT INTO users (id, full_name, email, hashed_password, role, status)
                   VALUES (?, ?, ?, ?, 'user', 'active') RETURNING *";
        let user = sqlx::query_as::<_, User>(sql)
            .bind(&id)
            .bind(&new_user.full_name)
            .bind(&new_user.email)
            .bind(&new_user.hashed_password)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::models::AccountStatus;

    #[tokio::test]
    async fn test_init_db_is_idempotent() {
        let pool = memory_pool().await;
        init_db(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = SqliteUserStore::new(memory_pool().await);
        let created = store
            .create(NewUser {
                full_name: "Ada".into(),
                email: "ada@example.com".into(),
                hashed_password: "hash".into(),
            })
            .await
            .unwrap();
        assert_eq!(created.role, "user");
        assert_eq!(created.status, AccountStatus::Active);

        let by_id = store.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "ada@example.com");
        let by_email = store.find_by_email("ada@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);
        assert!(store.find_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let store = SqliteUserStore::new(memory_pool().await);
        let new_user = || NewUser {
            full_name: "Ada".into(),
            email: "ada@example.com".into(),
            hashed_password: "hash".into(),
        };
        store.create(new_user()).await.unwrap();
        let err = store.create(new_user()).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_find_by_email_skips_disabled_accounts() {
        let pool = memory_pool().await;
        insert_user(&pool, "u1", "user", "inactive").await;
        insert_user(&pool, "u2", "user", "deleted").await;
        insert_user(&pool, "u3", "user", "active").await;
        let store = SqliteUserStore::new(pool);

        assert!(store.find_by_email("u1@example.com").await.unwrap().is_none());
        assert!(store.find_by_email("u2@example.com").await.unwrap().is_none());
        assert!(store.find_by_email("u3@example.com").await.unwrap().is_some());
        assert_eq!(
            store.find_by_id("u1").await.unwrap().unwrap().status,
            AccountStatus::Inactive
        );
    }

    #[tokio::test]
    async fn test_closed_pool_is_unavailable() {
        let pool = memory_pool().await;
        pool.close().await;
        let store = SqliteUserStore::new(pool);
        let err = store.find_by_id("u1").await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_memory_pool_keeps_its_connection() {
        let pool = connect("sqlite::memory:").await.unwrap();
        let options = pool.options();
        assert_eq!(options.get_max_connections(), 1);
        assert_eq!(options.get_min_connections(), 1);
        assert_eq!(options.get_idle_timeout(), None);
        assert_eq!(options.get_max_lifetime(), None);

        init_db(&pool).await.unwrap();
        insert_user(&pool, "u1", "user", "active").await;
        let store = SqliteUserStore::new(pool);
        assert!(store.find_by_id("u1").await.unwrap().is_some());
    }

    #[test]
    fn test_file_pool_options() {
        let options = pool_options("sqlite://notes.db");
        assert_eq!(options.get_max_connections(), 5);
        assert!(options.get_idle_timeout().is_some());
    }
}
