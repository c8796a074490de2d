// Session gate: static credential table, in-memory bearer sessions, role checks.

pub mod credentials;
pub mod extract;
pub mod handlers;
pub mod session;

pub use credentials::CredentialTable;
pub use extract::{AdminUser, CurrentUser};
pub use session::SessionStore;
