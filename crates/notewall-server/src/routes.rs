//! HTTP surface: one board endpoint plus a liveness probe.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Form, Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;

use notewall_application::{
    BoardOutcome, BoardRequest, NoteBoardService, RequestContext, RequestMethod, SessionDirective,
};

use crate::render::Renderer;
use crate::session_cookie;

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<NoteBoardService>,
    pub renderer: Arc<Renderer>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/",
            get(board_without_body)
                .post(board_post)
                .fallback(board_without_body),
        )
        .route("/healthz", get(healthz))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

/// GET, HEAD and any verb other than POST. Only the query string is read.
async fn board_without_body(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let request = BoardRequest {
        method: RequestMethod::from_name(method.as_str()),
        form: HashMap::new(),
        query,
    };
    dispatch(&state, &headers, request).await
}

async fn board_post(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let request = BoardRequest {
        method: RequestMethod::from_name(method.as_str()),
        form,
        query,
    };
    dispatch(&state, &headers, request).await
}

async fn dispatch(state: &AppState, headers: &HeaderMap, request: BoardRequest) -> Response {
    let ctx = RequestContext {
        session_token: session_cookie::read(headers),
    };

    let reply = match state.service.handle(ctx, &request).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!("Request failed: {}", e);
            return internal_error();
        }
    };

    let mut response = match reply.outcome {
        BoardOutcome::Redirect => Redirect::to("/").into_response(),
        BoardOutcome::MethodNotAllowed => {
            (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed").into_response()
        }
        BoardOutcome::LoginPage { error } => html(state.renderer.login_page(error)),
        BoardOutcome::Board { notes, query } => html(state.renderer.board_page(&notes, &query)),
    };

    let cookie = match &reply.session {
        SessionDirective::Keep => None,
        SessionDirective::Issue(token) => session_cookie::issue(token),
        SessionDirective::Clear => Some(session_cookie::clear()),
    };
    if let Some(cookie) = cookie {
        response.headers_mut().append(SET_COOKIE, cookie);
    }

    response
}

fn html(rendered: Result<String, minijinja::Error>) -> Response {
    match rendered {
        Ok(body) => Html(body).into_response(),
        Err(e) => {
            tracing::error!("Template rendering failed: {}", e);
            internal_error()
        }
    }
}

fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}
