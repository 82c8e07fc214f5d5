use async_trait::async_trait;

use crate::models::{NewUser, StoreError, User};

/// Account lookups the auth gate and the account endpoints depend on.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;

    /// Only accounts that may log in (neither inactive nor deleted).
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;
}
