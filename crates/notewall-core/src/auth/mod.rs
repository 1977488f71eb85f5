//! Single-secret authentication and session state.
//!
//! There are no accounts: one shared password unlocks the board, and a
//! server-side session remembers whether the client holding its token has
//! entered it.

mod gate;
mod session;
mod store;

pub use gate::{Authenticated, LoginOutcome, Secret, SessionGate, WRONG_PASSWORD};
pub use session::{SessionData, SessionToken, AUTHED_KEY};
pub use store::SessionStore;
