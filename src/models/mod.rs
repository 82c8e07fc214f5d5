use std::sync::Arc;

use crate::core::{RoleRights, TokenService, UserStore};

mod error;
mod response;
mod token_claims;
mod user;

pub use error::{AppError, AuthError, StoreError};
pub use response::CustomResponse;
pub use token_claims::TokenClaims;
pub use user::{AccountStatus, Credentials, NewUser, SignupRequest, User};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub tokens: TokenService,
    pub rights: Arc<RoleRights>,
    pub bcrypt_cost: u32,
}
