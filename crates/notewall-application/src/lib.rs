//! Request handling for the notes board.
//!
//! The presentation layer turns an HTTP request into a [`BoardRequest`] plus a
//! [`RequestContext`], hands both to [`NoteBoardService::handle`] and renders
//! the returned [`BoardReply`].

pub mod request;
pub mod service;

pub use request::{Action, BoardRequest, RequestMethod};
pub use service::{BoardOutcome, BoardReply, NoteBoardService, RequestContext, SessionDirective};
