//! Authentication: password hashing, cookie sessions and the request principal.

pub mod password;
pub mod principal;
pub mod session;

pub use principal::{CurrentUser, Principal, RequireUser};
pub use session::SessionManager;
