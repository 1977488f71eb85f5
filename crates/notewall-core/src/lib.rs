pub mod auth;
pub mod error;
pub mod note;

// Re-export common error type
pub use error::NotewallError;
