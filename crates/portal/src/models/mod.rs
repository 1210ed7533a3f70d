//! Types the portal keeps in the user's session.

pub mod session;

pub use session::{CurrentUser, JustRegistered, keys as session_keys};
