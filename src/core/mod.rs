pub mod roles;
mod token;
mod user_store;

pub use roles::{Capability, RoleRights};
pub use token::{Subject, TokenError, TokenService};
pub use user_store::UserStore;
