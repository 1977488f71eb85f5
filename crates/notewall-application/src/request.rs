//! Inbound request model.

use std::collections::HashMap;

/// HTTP method, reduced to what the board cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
    Other,
}

impl RequestMethod {
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "GET" | "HEAD" => Self::Get,
            "POST" => Self::Post,
            _ => Self::Other,
        }
    }

    /// Only POST may carry a state-changing action.
    pub fn is_state_changing(&self) -> bool {
        matches!(self, Self::Post)
    }
}

/// What the client asked for, decoded from the `action` parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Login { password: String },
    Logout,
    Add { text: String },
    Delete { id: String },
    /// Show the board, filtered by `query` (already trimmed, possibly empty).
    View { query: String },
}

impl Action {
    /// Actions that must arrive via POST.
    pub fn requires_state_change(&self) -> bool {
        matches!(self, Self::Login { .. } | Self::Add { .. } | Self::Delete { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Login { .. } => "login",
            Self::Logout => "logout",
            Self::Add { .. } => "add",
            Self::Delete { .. } => "delete",
            Self::View { .. } => "view",
        }
    }
}

/// A single request to the board endpoint.
///
/// `form` holds the decoded request body, `query` the URL query string.
#[derive(Debug, Clone)]
pub struct BoardRequest {
    pub method: RequestMethod,
    pub form: HashMap<String, String>,
    pub query: HashMap<String, String>,
}

impl BoardRequest {
    pub fn new(method: RequestMethod) -> Self {
        Self {
            method,
            form: HashMap::new(),
            query: HashMap::new(),
        }
    }

    pub fn get() -> Self {
        Self::new(RequestMethod::Get)
    }

    pub fn post() -> Self {
        Self::new(RequestMethod::Post)
    }

    pub fn with_form(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.insert(key.into(), value.into());
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    fn form_value(&self, key: &str) -> String {
        self.form.get(key).cloned().unwrap_or_default()
    }

    /// Decodes the action. `action` is read from the body first, then the
    /// query string; credentials and note fields come from the body only.
    /// Unknown or missing actions show the board.
    pub fn action(&self) -> Action {
        let action = self
            .form
            .get("action")
            .or_else(|| self.query.get("action"))
            .map(String::as_str)
            .unwrap_or_default();

        match action {
            "login" => Action::Login {
                password: self.form_value("password"),
            },
            "logout" => Action::Logout,
            "add" => Action::Add {
                text: self.form_value("text"),
            },
            "delete" => Action::Delete {
                id: self.form_value("id"),
            },
            _ => Action::View {
                query: self
                    .query
                    .get("q")
                    .map(|q| q.trim().to_string())
                    .unwrap_or_default(),
            },
        }
    }
}
