//! Connection adapter.
//!
//! Bridges axum to the runtime. Routes:
//!
//! ```text
//!   GET /server?whence=<route>   websocket upgrade, one session per socket
//!   GET /liveframe.js            client script
//!   *                            full document: init + render, no session
//! ```
//!
//! Each socket gets two halves:
//!
//! ```text
//!   socket ──read──> decode ──> SessionHandle::dispatch ──> session task
//!   socket <─write── writer task <── frame channel <──────── session task
//! ```
//!
//! Whichever side finishes first ends the session: a client close or read
//! error closes the session, and a session that closes (shutdown, failed
//! write) ends the read loop.

use std::{collections::HashMap, sync::Arc};

use axum::{
    Router,
    extract::{
        Query, State as AxumState, WebSocketUpgrade,
        ws::{self, WebSocket},
    },
    http::{StatusCode, Uri, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use futures::{SinkExt, StreamExt};
use liveframe_core::{
    ConnectRequest, Connection, Environment, Frame, Message, Runtime, State, view,
};

use crate::document::DocumentShell;

/// Path the client script is served from.
pub const CLIENT_SCRIPT_PATH: &str = "/liveframe.js";

/// Path of the websocket endpoint.
pub const SOCKET_PATH: &str = "/server";

/// Query parameter carrying the route the client is displaying.
pub const WHENCE_PARAM: &str = "whence";

const CLIENT_SCRIPT: &str = include_str!("../assets/liveframe.js");

struct AppState<S: State, E: Environment> {
    runtime: Runtime<S, E>,
    shell: Arc<DocumentShell>,
}

impl<S: State, E: Environment> Clone for AppState<S, E> {
    fn clone(&self) -> Self {
        Self { runtime: self.runtime.clone(), shell: Arc::clone(&self.shell) }
    }
}

/// Router serving `runtime`'s application.
pub fn router<S: State, E: Environment>(runtime: Runtime<S, E>, shell: DocumentShell) -> Router {
    let state = AppState { runtime, shell: Arc::new(shell) };
    Router::new()
        .route(SOCKET_PATH, get(upgrade::<S, E>))
        .route(CLIENT_SCRIPT_PATH, get(client_script))
        .fallback(document::<S, E>)
        .with_state(state)
}

async fn upgrade<S: State, E: Environment>(
    socket: WebSocketUpgrade,
    Query(mut query): Query<HashMap<String, String>>,
    AxumState(app): AxumState<AppState<S, E>>,
) -> Response {
    let route = query.remove(WHENCE_PARAM).unwrap_or_default();
    let request = ConnectRequest { route, query };
    let max_frame_size = app.runtime.config().max_frame_size;

    socket
        .max_message_size(max_frame_size)
        .on_upgrade(move |socket| serve_socket(socket, app.runtime, request))
}

async fn serve_socket<S: State, E: Environment>(
    socket: WebSocket,
    runtime: Runtime<S, E>,
    request: ConnectRequest,
) {
    let (mut sink, mut stream) = socket.split();
    let (connection, mut frames) = Connection::channel();
    let notices = connection.clone();

    let handle = match runtime.open_session(&request, connection) {
        Ok(handle) => handle,
        Err(err) => {
            tracing::warn!(route = %request.route, error = %err, "connection refused");
            let page = Frame::error(view::error_page(&err.to_string()));
            let _ = sink.send(ws::Message::Text(page.into_text().into())).await;
            let _ = sink.close().await;
            return;
        },
    };
    let session = handle.id();

    let writer = tokio::spawn(async move {
        while let Some(frame) = frames.recv().await {
            if let Err(err) = sink.send(ws::Message::Text(frame.into_text().into())).await {
                tracing::debug!(session = %session, error = %err, "socket write failed");
                break;
            }
        }
        let _ = sink.close().await;
    });

    let max_frame_size = runtime.config().max_frame_size;
    loop {
        let inbound = tokio::select! {
            inbound = stream.next() => inbound,
            () = handle.closed() => break,
        };

        let payload = match inbound {
            Some(Ok(ws::Message::Text(text))) => text.as_str().as_bytes().to_vec(),
            Some(Ok(ws::Message::Binary(bytes))) => bytes.to_vec(),
            Some(Ok(ws::Message::Ping(_) | ws::Message::Pong(_))) => continue,
            Some(Ok(ws::Message::Close(_))) | None => break,
            Some(Err(err)) => {
                tracing::debug!(session = %session, error = %err, "socket read failed");
                break;
            },
        };

        match Message::decode(&payload, max_frame_size) {
            Ok(message) => {
                if handle.dispatch(message).is_err() {
                    break;
                }
            },
            Err(err) => {
                tracing::warn!(session = %session, error = %err, "malformed frame");
                let notice = format!("could not decode message: {err}");
                if notices.send(Frame::error(view::error_page(&notice))).is_err() {
                    break;
                }
            },
        }
    }

    handle.close();
    handle.closed().await;
    drop(notices);
    let _ = writer.await;
    tracing::debug!(session = %session, "socket closed");
}

async fn document<S: State, E: Environment>(
    AxumState(app): AxumState<AppState<S, E>>,
    Query(query): Query<HashMap<String, String>>,
    uri: Uri,
) -> Response {
    let route = uri.path_and_query().map_or_else(|| uri.path().to_string(), ToString::to_string);
    let request = ConnectRequest { route, query };

    match app.runtime.render_document(&request) {
        Ok(body) => Html(app.shell.wrap(&body)).into_response(),
        Err(err) => {
            tracing::error!(route = %request.route, error = %err, "document render failed");
            let body = view::error_page(&err.to_string());
            (StatusCode::INTERNAL_SERVER_ERROR, Html(app.shell.wrap(&body))).into_response()
        },
    }
}

async fn client_script() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/javascript; charset=utf-8")], CLIENT_SCRIPT)
}
