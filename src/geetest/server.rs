//! Local relay server for solving a geetest challenge in the browser.

use super::{fetch_challenge, GeetestChallenge, GeetestKind, GeetestResult};
use crate::client::ApiClient;
use crate::error::{BiliError, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

const PAGE_TEMPLATE: &str = include_str!("page.html");

struct RelayState {
    challenge: GeetestChallenge,
    result: RwLock<Option<GeetestResult>>,
}

#[derive(Deserialize)]
struct ValidateForm {
    challenge: String,
    validate: String,
    seccode: String,
}

/// Fill the page template. Values go in as JSON string literals.
fn render_page(challenge: &GeetestChallenge) -> Result<String> {
    Ok(PAGE_TEMPLATE
        .replace("__GT__", &serde_json::to_string(&challenge.gt)?)
        .replace("__CHALLENGE__", &serde_json::to_string(&challenge.challenge)?))
}

async fn page(State(state): State<Arc<RelayState>>) -> impl IntoResponse {
    match render_page(&state.challenge) {
        Ok(html) => Html(html).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn submit(
    State(state): State<Arc<RelayState>>,
    Json(form): Json<ValidateForm>,
) -> impl IntoResponse {
    if form.validate.is_empty() || form.seccode.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"code": -400, "message": "validate and seccode are required"})),
        );
    }

    tracing::info!("Geetest challenge solved: {}", form.challenge);
    *state.result.write() = Some(GeetestResult {
        gt: state.challenge.gt.clone(),
        challenge: form.challenge,
        validate: form.validate,
        seccode: form.seccode,
        token: state.challenge.token.clone(),
    });
    (StatusCode::OK, Json(json!({"code": 0, "message": "0"})))
}

/// Starts geetest relay servers.
pub struct GeetestServer;

impl GeetestServer {
    /// Fetch a challenge for `kind` and serve it on an ephemeral localhost port.
    pub async fn start(client: &ApiClient, kind: GeetestKind) -> Result<GeetestServerHandle> {
        let challenge = fetch_challenge(client, kind).await?;
        Self::start_with_challenge(challenge, ([127, 0, 0, 1], 0).into()).await
    }

    /// Serve an already issued challenge on `bind`.
    pub async fn start_with_challenge(
        challenge: GeetestChallenge,
        bind: SocketAddr,
    ) -> Result<GeetestServerHandle> {
        let state = Arc::new(RelayState {
            challenge,
            result: RwLock::new(None),
        });

        let app = Router::new()
            .route("/", get(page))
            .route("/result", post(submit))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind(bind).await?;
        let addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let worker = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    // resolves on stop() and on handle drop
                    let _ = shutdown_rx.await;
                })
                .await
        });

        tracing::info!("Geetest relay listening on http://{}/", addr);

        Ok(GeetestServerHandle {
            addr,
            state,
            shutdown: Some(shutdown_tx),
            worker: Some(worker),
        })
    }
}

/// Handle to a running relay.
///
/// Call [`stop`](Self::stop) to shut it down and wait for the port to be
/// released. Dropping the handle only signals shutdown.
pub struct GeetestServerHandle {
    addr: SocketAddr,
    state: Arc<RelayState>,
    shutdown: Option<oneshot::Sender<()>>,
    worker: Option<JoinHandle<std::io::Result<()>>>,
}

impl GeetestServerHandle {
    /// Address the relay is bound to.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Page to open in a browser.
    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn challenge(&self) -> &GeetestChallenge {
        &self.state.challenge
    }

    /// Whether the captcha has been solved.
    pub fn is_done(&self) -> bool {
        self.state.result.read().is_some()
    }

    /// The solved captcha, once [`is_done`](Self::is_done).
    pub fn result(&self) -> Option<GeetestResult> {
        self.state.result.read().clone()
    }

    /// Stop the relay and wait until the listener is closed.
    pub async fn stop(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(worker) = self.worker.take() {
            worker
                .await
                .map_err(|e| BiliError::Geetest(format!("relay task failed: {}", e)))??;
        }
        tracing::info!("Geetest relay on {} stopped", self.addr);
        Ok(())
    }
}

impl Drop for GeetestServerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
