//! Authentication & Authorization
//! Mission: Credential storage, token codec, and the request gates

pub mod api;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod user_store;

pub use jwt::{TokenCodec, VerifyError};
pub use middleware::{authenticate, authorize, AuthError, CurrentUser};
pub use models::{Claims, Role, User};
pub use user_store::{UserStore, UserStoreError};
