//! The board service: session gate in front of the note repository.

use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use notewall_core::auth::{Authenticated, SessionData, SessionGate, SessionStore, SessionToken};
use notewall_core::error::Result;
use notewall_core::note::{Note, NoteRepository};

use crate::request::{Action, BoardRequest};

/// Per-request context supplied by the presentation layer.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Session token presented by the client, if any.
    pub session_token: Option<SessionToken>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: SessionToken) -> Self {
        Self {
            session_token: Some(token),
        }
    }
}

/// What the presentation layer should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardOutcome {
    /// Send the client back to the board (post/redirect/get).
    Redirect,
    /// Show the login form, with a one-shot error after a failed attempt.
    LoginPage { error: Option<&'static str> },
    /// Show the board.
    Board { notes: Vec<Note>, query: String },
    /// A mutating action arrived over a read-only method.
    MethodNotAllowed,
}

/// What the presentation layer should do with the client's session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionDirective {
    /// Nothing to change.
    Keep,
    /// Hand this (new) token to the client.
    Issue(SessionToken),
    /// Tell the client to forget its token.
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardReply {
    pub outcome: BoardOutcome,
    pub session: SessionDirective,
}

impl BoardReply {
    fn new(outcome: BoardOutcome, session: SessionDirective) -> Self {
        Self { outcome, session }
    }
}

/// Handles one board request end to end.
///
/// Each mutating request does its own load → mutate → save. Two concurrent
/// mutations can therefore race, with the later save dropping the other's
/// change. Saves themselves never interleave. [`with_serialized_mutations`]
/// closes the race within one process by holding a mutex across the whole
/// cycle.
///
/// [`with_serialized_mutations`]: NoteBoardService::with_serialized_mutations
pub struct NoteBoardService {
    repository: Arc<dyn NoteRepository>,
    sessions: Arc<dyn SessionStore>,
    gate: Arc<SessionGate>,
    mutation_lock: Option<Mutex<()>>,
}

impl NoteBoardService {
    pub fn new(
        repository: Arc<dyn NoteRepository>,
        sessions: Arc<dyn SessionStore>,
        gate: Arc<SessionGate>,
    ) -> Self {
        Self {
            repository,
            sessions,
            gate,
            mutation_lock: None,
        }
    }

    /// Serializes add/delete end to end inside this process.
    pub fn with_serialized_mutations(mut self) -> Self {
        self.mutation_lock = Some(Mutex::new(()));
        self
    }

    /// Prepares the backing store. Call once before serving.
    pub async fn initialize(&self) -> Result<()> {
        self.repository.ensure_initialized().await
    }

    /// Runs one request through the gate and, if allowed, the store.
    ///
    /// Only storage failures come back as `Err`; everything else resolves to
    /// an outcome the caller can render.
    pub async fn handle(&self, ctx: RequestContext, request: &BoardRequest) -> Result<BoardReply> {
        let action = request.action();

        if action.requires_state_change() && !request.method.is_state_changing() {
            tracing::debug!("Rejected '{}' over {:?}", action.name(), request.method);
            return Ok(BoardReply::new(
                BoardOutcome::MethodNotAllowed,
                SessionDirective::Keep,
            ));
        }

        let (token, mut session, issued) = self.resolve_session(ctx.session_token).await?;
        let directive = if issued {
            SessionDirective::Issue(token.clone())
        } else {
            SessionDirective::Keep
        };

        let mut login_error = None;
        match &action {
            Action::Logout => {
                self.gate.logout(&mut session);
                self.sessions.destroy(&token).await?;
                tracing::info!("Session logged out");
                return Ok(BoardReply::new(
                    BoardOutcome::Redirect,
                    SessionDirective::Clear,
                ));
            }
            Action::Login { password } => {
                let outcome = self.gate.login(&mut session, password);
                if outcome.is_granted() {
                    // Authenticated state never lives under a pre-login token.
                    self.sessions.destroy(&token).await?;
                    let rotated = SessionToken::generate();
                    self.sessions.store(&rotated, session).await?;
                    tracing::info!("Login succeeded");
                    return Ok(BoardReply::new(
                        BoardOutcome::Redirect,
                        SessionDirective::Issue(rotated),
                    ));
                }
                self.sessions.store(&token, session.clone()).await?;
                tracing::warn!("Login failed: wrong password");
                login_error = outcome.error_message();
            }
            _ => {}
        }

        let Some(auth) = self.gate.require_authenticated(&session) else {
            return Ok(BoardReply::new(
                BoardOutcome::LoginPage { error: login_error },
                directive,
            ));
        };

        let outcome = match action {
            Action::Add { text } => {
                self.add_note(&auth, &text).await?;
                BoardOutcome::Redirect
            }
            Action::Delete { id } => {
                self.delete_note(&auth, &id).await?;
                BoardOutcome::Redirect
            }
            Action::View { query } => {
                let notes = self.list_notes(&auth, &query).await?;
                BoardOutcome::Board { notes, query }
            }
            Action::Login { .. } | Action::Logout => BoardOutcome::Redirect,
        };

        Ok(BoardReply::new(outcome, directive))
    }

    /// Finds the client's session or starts a new one.
    ///
    /// Returns the token, the session data and whether the token is new.
    async fn resolve_session(
        &self,
        presented: Option<SessionToken>,
    ) -> Result<(SessionToken, SessionData, bool)> {
        if let Some(token) = presented {
            if let Some(data) = self.sessions.load(&token).await? {
                return Ok((token, data, false));
            }
        }

        let token = SessionToken::generate();
        let data = SessionData::new();
        self.sessions.store(&token, data.clone()).await?;
        tracing::debug!("Started new session");
        Ok((token, data, true))
    }

    async fn lock_mutations(&self) -> Option<MutexGuard<'_, ()>> {
        match &self.mutation_lock {
            Some(lock) => Some(lock.lock().await),
            None => None,
        }
    }

    async fn add_note(&self, _auth: &Authenticated, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }

        let _guard = self.lock_mutations().await;
        let mut collection = self.repository.load().await?;
        if let Some(note) = collection.add(text) {
            tracing::info!("Added note {}", note.id);
            self.repository.save(&collection).await?;
        }
        Ok(())
    }

    async fn delete_note(&self, _auth: &Authenticated, id: &str) -> Result<()> {
        if id.is_empty() {
            return Ok(());
        }

        let _guard = self.lock_mutations().await;
        let mut collection = self.repository.load().await?;
        let removed = collection.delete(id);
        if removed > 0 {
            tracing::info!("Deleted note {}", id);
            self.repository.save(&collection).await?;
        } else {
            tracing::debug!("Delete of unknown note {} ignored", id);
        }
        Ok(())
    }

    async fn list_notes(&self, _auth: &Authenticated, query: &str) -> Result<Vec<Note>> {
        let collection = self.repository.load().await?;
        Ok(collection.search(query).into_iter().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use notewall_core::NotewallError;
    use notewall_core::auth::{Secret, WRONG_PASSWORD};
    use crate::request::RequestMethod;
    use notewall_core::note::NoteCollection;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PASSWORD: &str = "open sesame";

    #[derive(Default)]
    struct FakeNoteRepository {
        collection: std::sync::Mutex<NoteCollection>,
        loads: AtomicUsize,
        saves: AtomicUsize,
        fail_saves: bool,
    }

    impl FakeNoteRepository {
        fn failing() -> Self {
            Self {
                fail_saves: true,
                ..Self::default()
            }
        }

        fn accesses(&self) -> usize {
            self.loads.load(Ordering::SeqCst) + self.saves.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl NoteRepository for FakeNoteRepository {
        async fn ensure_initialized(&self) -> Result<()> {
            Ok(())
        }

        async fn load(&self) -> Result<NoteCollection> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(self.collection.lock().unwrap().clone())
        }

        async fn save(&self, collection: &NoteCollection) -> Result<()> {
            if self.fail_saves {
                return Err(NotewallError::io("disk full"));
            }
            self.saves.fetch_add(1, Ordering::SeqCst);
            *self.collection.lock().unwrap() = collection.clone();
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeSessionStore {
        sessions: std::sync::Mutex<HashMap<SessionToken, SessionData>>,
    }

    #[async_trait]
    impl SessionStore for FakeSessionStore {
        async fn load(&self, token: &SessionToken) -> Result<Option<SessionData>> {
            Ok(self.sessions.lock().unwrap().get(token).cloned())
        }

        async fn store(&self, token: &SessionToken, data: SessionData) -> Result<()> {
            self.sessions.lock().unwrap().insert(token.clone(), data);
            Ok(())
        }

        async fn destroy(&self, token: &SessionToken) -> Result<()> {
            self.sessions.lock().unwrap().remove(token);
            Ok(())
        }
    }

    struct Harness {
        service: NoteBoardService,
        repository: Arc<FakeNoteRepository>,
        sessions: Arc<FakeSessionStore>,
    }

    fn harness_with(repository: FakeNoteRepository) -> Harness {
        let repository = Arc::new(repository);
        let sessions = Arc::new(FakeSessionStore::default());
        let gate = Arc::new(SessionGate::new(Secret::new(PASSWORD)).unwrap());
        let service = NoteBoardService::new(repository.clone(), sessions.clone(), gate);
        Harness {
            service,
            repository,
            sessions,
        }
    }

    fn harness() -> Harness {
        harness_with(FakeNoteRepository::default())
    }

    fn issued_token(reply: &BoardReply) -> SessionToken {
        match &reply.session {
            SessionDirective::Issue(token) => token.clone(),
            other => panic!("expected a new token, got {:?}", other),
        }
    }

    async fn logged_in(h: &Harness) -> RequestContext {
        let reply = h
            .service
            .handle(
                RequestContext::anonymous(),
                &BoardRequest::post()
                    .with_form("action", "login")
                    .with_form("password", PASSWORD),
            )
            .await
            .unwrap();
        assert_eq!(reply.outcome, BoardOutcome::Redirect);
        RequestContext::with_token(issued_token(&reply))
    }

    #[tokio::test]
    async fn test_anonymous_view_shows_login_without_store_access() {
        let h = harness();

        let reply = h
            .service
            .handle(RequestContext::anonymous(), &BoardRequest::get())
            .await
            .unwrap();

        assert_eq!(reply.outcome, BoardOutcome::LoginPage { error: None });
        issued_token(&reply);
        assert_eq!(h.repository.accesses(), 0);
    }

    #[tokio::test]
    async fn test_unknown_token_starts_new_session() {
        let h = harness();
        let stale = RequestContext::with_token(SessionToken::generate());

        let reply = h.service.handle(stale, &BoardRequest::get()).await.unwrap();

        issued_token(&reply);
    }

    #[tokio::test]
    async fn test_wrong_password_shows_generic_error_once() {
        let h = harness();

        let reply = h
            .service
            .handle(
                RequestContext::anonymous(),
                &BoardRequest::post()
                    .with_form("action", "login")
                    .with_form("password", "guess"),
            )
            .await
            .unwrap();
        assert_eq!(
            reply.outcome,
            BoardOutcome::LoginPage {
                error: Some(WRONG_PASSWORD)
            }
        );
        let ctx = RequestContext::with_token(issued_token(&reply));

        // The error is not persisted: the next plain view has no message.
        let reply = h.service.handle(ctx, &BoardRequest::get()).await.unwrap();
        assert_eq!(reply.outcome, BoardOutcome::LoginPage { error: None });
        assert_eq!(reply.session, SessionDirective::Keep);
        assert_eq!(h.repository.accesses(), 0);
    }

    #[tokio::test]
    async fn test_login_rotates_session_token() {
        let h = harness();
        let reply = h
            .service
            .handle(RequestContext::anonymous(), &BoardRequest::get())
            .await
            .unwrap();
        let before = issued_token(&reply);

        let reply = h
            .service
            .handle(
                RequestContext::with_token(before.clone()),
                &BoardRequest::post()
                    .with_form("action", "login")
                    .with_form("password", PASSWORD),
            )
            .await
            .unwrap();
        assert_eq!(reply.outcome, BoardOutcome::Redirect);
        let after = issued_token(&reply);
        assert_ne!(after, before);
        assert!(h.sessions.load(&before).await.unwrap().is_none());

        // The pre-login token is no longer authenticated.
        let reply = h
            .service
            .handle(RequestContext::with_token(before), &BoardRequest::get())
            .await
            .unwrap();
        assert_eq!(reply.outcome, BoardOutcome::LoginPage { error: None });

        let reply = h
            .service
            .handle(RequestContext::with_token(after), &BoardRequest::get())
            .await
            .unwrap();
        assert!(matches!(reply.outcome, BoardOutcome::Board { .. }));
    }

    #[tokio::test]
    async fn test_login_then_view_board() {
        let h = harness();
        let ctx = logged_in(&h).await;

        let reply = h.service.handle(ctx, &BoardRequest::get()).await.unwrap();

        assert_eq!(
            reply.outcome,
            BoardOutcome::Board {
                notes: vec![],
                query: String::new()
            }
        );
        assert_eq!(reply.session, SessionDirective::Keep);
    }

    #[tokio::test]
    async fn test_logout_destroys_session() {
        let h = harness();
        let ctx = logged_in(&h).await;
        let token = ctx.session_token.clone().unwrap();

        let reply = h
            .service
            .handle(ctx.clone(), &BoardRequest::get().with_query("action", "logout"))
            .await
            .unwrap();

        assert_eq!(reply.outcome, BoardOutcome::Redirect);
        assert_eq!(reply.session, SessionDirective::Clear);
        assert!(h.sessions.load(&token).await.unwrap().is_none());

        // Replaying the old token gets a fresh, unauthenticated session.
        let reply = h.service.handle(ctx, &BoardRequest::get()).await.unwrap();
        assert_eq!(reply.outcome, BoardOutcome::LoginPage { error: None });
        issued_token(&reply);
    }

    #[tokio::test]
    async fn test_mutations_over_get_are_rejected_before_gate() {
        let h = harness();
        let ctx = logged_in(&h).await;

        for action in ["add", "delete", "login"] {
            let request = BoardRequest::get()
                .with_query("action", action)
                .with_form("text", "sneaky")
                .with_form("id", "abc")
                .with_form("password", PASSWORD);
            let reply = h.service.handle(ctx.clone(), &request).await.unwrap();
            assert_eq!(reply.outcome, BoardOutcome::MethodNotAllowed, "{}", action);
        }

        // Rejected even for anonymous clients, without minting a session.
        let reply = h
            .service
            .handle(
                RequestContext::anonymous(),
                &BoardRequest::get().with_query("action", "add"),
            )
            .await
            .unwrap();
        assert_eq!(reply.outcome, BoardOutcome::MethodNotAllowed);
        assert_eq!(reply.session, SessionDirective::Keep);
        assert_eq!(h.repository.accesses(), 0);
    }

    #[tokio::test]
    async fn test_other_verbs_cannot_mutate() {
        let h = harness();
        let ctx = logged_in(&h).await;

        for verb in ["PUT", "DELETE", "PATCH"] {
            let request = BoardRequest::new(RequestMethod::from_name(verb))
                .with_query("action", "add")
                .with_form("text", "sneaky");
            let reply = h.service.handle(ctx.clone(), &request).await.unwrap();
            assert_eq!(reply.outcome, BoardOutcome::MethodNotAllowed, "{}", verb);
        }
        assert_eq!(h.repository.accesses(), 0);
    }

    #[tokio::test]
    async fn test_anonymous_add_never_touches_store() {
        let h = harness();

        let reply = h
            .service
            .handle(
                RequestContext::anonymous(),
                &BoardRequest::post()
                    .with_form("action", "add")
                    .with_form("text", "spam"),
            )
            .await
            .unwrap();

        assert_eq!(reply.outcome, BoardOutcome::LoginPage { error: None });
        assert_eq!(h.repository.accesses(), 0);
    }

    #[tokio::test]
    async fn test_blank_add_and_empty_delete_are_noops() {
        let h = harness();
        let ctx = logged_in(&h).await;

        let add = BoardRequest::post()
            .with_form("action", "add")
            .with_form("text", "   ");
        let delete = BoardRequest::post().with_form("action", "delete");

        assert_eq!(
            h.service.handle(ctx.clone(), &add).await.unwrap().outcome,
            BoardOutcome::Redirect
        );
        assert_eq!(
            h.service.handle(ctx, &delete).await.unwrap().outcome,
            BoardOutcome::Redirect
        );
        assert_eq!(h.repository.accesses(), 0);
    }

    #[tokio::test]
    async fn test_add_search_delete() {
        let h = harness();
        let ctx = logged_in(&h).await;

        for text in ["buy milk", "call Bob"] {
            let request = BoardRequest::post()
                .with_form("action", "add")
                .with_form("text", text);
            h.service.handle(ctx.clone(), &request).await.unwrap();
        }

        let reply = h
            .service
            .handle(ctx.clone(), &BoardRequest::get().with_query("q", "BOB"))
            .await
            .unwrap();
        let BoardOutcome::Board { notes, query } = reply.outcome else {
            panic!("expected board");
        };
        assert_eq!(query, "BOB");
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].text, "call Bob");

        let milk_id = h
            .repository
            .collection
            .lock()
            .unwrap()
            .iter()
            .find(|n| n.text == "buy milk")
            .unwrap()
            .id
            .clone();
        let request = BoardRequest::post()
            .with_form("action", "delete")
            .with_form("id", milk_id);
        h.service.handle(ctx, &request).await.unwrap();

        let remaining = h.repository.collection.lock().unwrap().clone();
        let texts: Vec<_> = remaining.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, vec!["call Bob"]);
    }

    #[tokio::test]
    async fn test_delete_unknown_id_does_not_save() {
        let h = harness();
        let ctx = logged_in(&h).await;

        let request = BoardRequest::post()
            .with_form("action", "delete")
            .with_form("id", "ffffffffffffffff");
        h.service.handle(ctx, &request).await.unwrap();

        assert_eq!(h.repository.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let h = harness_with(FakeNoteRepository::failing());
        let ctx = logged_in(&h).await;

        let request = BoardRequest::post()
            .with_form("action", "add")
            .with_form("text", "will not persist");
        let err = h.service.handle(ctx, &request).await.unwrap_err();

        assert!(err.is_storage_failure());
    }
}
