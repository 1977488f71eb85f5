//! HTML pages, rendered with minijinja.
//!
//! Templates end in `.html`, so minijinja auto-escapes every interpolated
//! value.

use chrono::{DateTime, Local};
use minijinja::{Environment, context};
use serde::Serialize;

use notewall_core::note::Note;

pub const APP_TITLE: &str = "Tiny Notes";

const LOGIN_TEMPLATE: &str = include_str!("../templates/login.html");
const BOARD_TEMPLATE: &str = include_str!("../templates/board.html");

#[derive(Serialize)]
struct NoteView<'a> {
    id: &'a str,
    text: &'a str,
    created: String,
}

impl<'a> From<&'a Note> for NoteView<'a> {
    fn from(note: &'a Note) -> Self {
        Self {
            id: &note.id,
            text: &note.text,
            created: format_timestamp(note.created_at),
        }
    }
}

/// Formats unix seconds as local `YYYY-MM-DD HH:MM`.
fn format_timestamp(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("login.html", LOGIN_TEMPLATE)?;
        env.add_template("board.html", BOARD_TEMPLATE)?;
        Ok(Self { env })
    }

    pub fn login_page(&self, error: Option<&str>) -> Result<String, minijinja::Error> {
        self.env
            .get_template("login.html")?
            .render(context! { title => APP_TITLE, error => error })
    }

    pub fn board_page(&self, notes: &[Note], query: &str) -> Result<String, minijinja::Error> {
        let notes: Vec<NoteView<'_>> = notes.iter().map(NoteView::from).collect();
        self.env
            .get_template("board.html")?
            .render(context! { title => APP_TITLE, notes => notes, query => query })
    }
}
