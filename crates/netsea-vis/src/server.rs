//! HTTP and WebSocket server for the sandbox UI.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use netsea_cli::{BackendEvent, Completion, Console, ConsoleLine, MissionState, Submission, COMMANDS};
use netsea_topology::{NetEvent, NodeId, RoutingTable, Snapshot};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{debug, error, info, warn};

use crate::backend::{LoopbackBackend, Step};
use crate::config::ServerConfig;
use crate::error::Result;

/// Message pushed to every WebSocket client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamMessage {
    Connected { message: String },
    Net { event: NetEvent },
    Console { node: NodeId, line: String },
    Flag { flag: String },
}

/// Message accepted from a WebSocket client.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Cli { node: String, command: String },
    Focus { node: Option<String> },
    /// Event from an external backend, applied like a loopback one.
    Backend { event: BackendEvent },
}

/// Shared state
pub struct AppState {
    pub console: RwLock<Console>,
    pub events: broadcast::Sender<StreamMessage>,
    pub backend: LoopbackBackend,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(console: Console, config: ServerConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            console: RwLock::new(console),
            events,
            backend: LoopbackBackend::new(config.backend.clone()),
            config,
        }
    }

    /// Push drained store events and `lines` to subscribers. Send errors
    /// only mean nobody is listening.
    fn publish(&self, console: &mut Console, lines: Vec<ConsoleLine>) {
        for event in console.store_mut().drain_events() {
            let _ = self.events.send(StreamMessage::Net { event });
        }
        for ConsoleLine { node, line } in lines {
            let _ = self.events.send(StreamMessage::Console { node, line });
        }
    }

    fn publish_flags(&self, flags: Vec<String>) {
        for flag in flags {
            let _ = self.events.send(StreamMessage::Flag { flag });
        }
    }

    /// Run one console line; forwarded commands are handed to the
    /// loopback backend in the background.
    pub async fn submit(self: &Arc<Self>, node: &str, command: &str) -> Result<Submission> {
        let mut console = self.console.write().await;
        let submission = console.submit(node, command)?;

        let mut lines = vec![ConsoleLine {
            node: submission.node.clone(),
            line: format!("{} {}", submission.prompt, command.trim()),
        }];
        lines.extend(submission.lines.iter().map(|line| ConsoleLine {
            node: submission.node.clone(),
            line: line.clone(),
        }));
        self.publish(&mut console, lines);

        if let Some(cmd) = &submission.forwarded {
            let steps = self.backend.plan(cmd, &console);
            debug!(node = %cmd.node, command = %cmd.command, steps = steps.len(), "forwarded to backend");
            let state = Arc::clone(self);
            tokio::spawn(async move { state.replay(steps).await });
        }
        Ok(submission)
    }

    /// Apply scripted backend events at their offsets.
    pub async fn replay(&self, steps: Vec<Step>) {
        let start = tokio::time::Instant::now();
        for step in steps {
            tokio::time::sleep_until(start + step.at).await;
            self.apply_backend_event(step.event).await;
        }
    }

    pub async fn apply_backend_event(&self, event: BackendEvent) {
        let mut console = self.console.write().await;
        let lines = console.apply_backend_event(event);
        self.publish(&mut console, lines);
    }

    pub async fn complete(&self, node: &str, line: &str, cursor: usize) -> Result<Completion> {
        let mut console = self.console.write().await;
        Ok(console.complete(node, line, cursor)?)
    }

    pub async fn load_snapshot(&self, snapshot: Snapshot) {
        let mut console = self.console.write().await;
        console.store_mut().load_snapshot(snapshot);
        console.prune_sessions();
        self.publish(&mut console, Vec::new());
        info!(nodes = console.store().nodes().len(), "snapshot loaded");
    }

    /// Advance the simulation by `dt` seconds.
    pub async fn tick(&self, dt: f32) {
        let mut console = self.console.write().await;
        let flags = console.tick(dt);
        self.publish(&mut console, Vec::new());
        self.publish_flags(flags);
    }

    async fn handle_client(self: &Arc<Self>, text: &str) {
        let message = match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => message,
            Err(err) => {
                warn!(%err, "ignoring malformed client message");
                return;
            }
        };
        match message {
            ClientMessage::Cli { node, command } => {
                if let Err(err) = self.submit(&node, &command).await {
                    warn!(%node, %err, "websocket command rejected");
                }
            }
            ClientMessage::Focus { node } => {
                let mut console = self.console.write().await;
                console.store_mut().set_cli_focus(node.as_deref());
                self.publish(&mut console, Vec::new());
            }
            ClientMessage::Backend { event } => self.apply_backend_event(event).await,
        }
    }
}

/// Sandbox server
pub struct VisServer {
    state: Arc<AppState>,
}

impl VisServer {
    pub fn new(console: Console, config: ServerConfig) -> Self {
        Self {
            state: Arc::new(AppState::new(console, config)),
        }
    }

    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .route("/api/status", get(get_status))
            .route("/api/snapshot", get(get_snapshot).post(post_snapshot))
            .route("/api/cli", post(post_cli))
            .route("/api/complete", post(post_complete))
            .route("/api/routes", get(get_routes))
            .route("/api/commands", get(get_commands))
            .route("/ws", get(ws_handler));

        if let Some(dir) = &self.state.config.static_dir {
            router = router.fallback_service(ServeDir::new(dir));
        }

        router
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Start the tick loop; it runs until the returned handle is aborted.
    pub fn spawn_ticker(&self) -> JoinHandle<()> {
        let state = self.state();
        let period = state.config.tick_interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                state.tick(period.as_secs_f32()).await;
            }
        })
    }

    pub async fn serve(self) -> Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.port));
        let ticker = self.spawn_ticker();
        let router = self.router();

        tracing::info!("Network Sea server listening on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        let served = axum::serve(listener, router).await;
        ticker.abort();
        Ok(served?)
    }
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    nodes: usize,
    links: usize,
    flows: usize,
    cli_focus: Option<NodeId>,
    mission: MissionState,
}

async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let console = state.console.read().await;
    let store = console.store();
    Json(StatusResponse {
        nodes: store.nodes().len(),
        links: store.links().len(),
        flows: store.flows().count(),
        cli_focus: store.cli_focus().cloned(),
        mission: console.mission().clone(),
    })
}

async fn get_snapshot(State(state): State<Arc<AppState>>) -> Json<Snapshot> {
    Json(state.console.read().await.store().snapshot())
}

async fn post_snapshot(
    State(state): State<Arc<AppState>>,
    Json(snapshot): Json<Snapshot>,
) -> StatusCode {
    state.load_snapshot(snapshot).await;
    StatusCode::NO_CONTENT
}

#[derive(Debug, Deserialize)]
struct CliRequest {
    node: String,
    command: String,
}

async fn post_cli(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CliRequest>,
) -> Result<Json<Submission>> {
    Ok(Json(state.submit(&req.node, &req.command).await?))
}

#[derive(Debug, Deserialize)]
struct CompleteRequest {
    node: String,
    line: String,
    cursor: Option<usize>,
}

async fn post_complete(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CompleteRequest>,
) -> Result<Json<Completion>> {
    let cursor = req.cursor.unwrap_or(req.line.len());
    Ok(Json(state.complete(&req.node, &req.line, cursor).await?))
}

async fn get_routes(State(state): State<Arc<AppState>>) -> Json<RoutingTable> {
    Json(state.console.read().await.store().routing_table().clone())
}

async fn get_commands() -> impl IntoResponse {
    Json(COMMANDS)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn send(socket: &mut WebSocket, message: &StreamMessage) -> bool {
    match serde_json::to_string(message) {
        Ok(json) => socket.send(Message::Text(json.into())).await.is_ok(),
        Err(err) => {
            error!(%err, "failed to serialize stream message");
            true
        }
    }
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let mut rx = state.events.subscribe();
    info!("WebSocket client connected");

    let hello = StreamMessage::Connected {
        message: "Connected to Network Sea backend".to_string(),
    };
    if !send(&mut socket, &hello).await {
        return;
    }

    loop {
        tokio::select! {
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => state.handle_client(text.as_str()).await,
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("WebSocket client disconnected");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("WebSocket error: {}", e);
                        break;
                    }
                }
            }

            event = rx.recv() => {
                match event {
                    Ok(message) => {
                        if !send(&mut socket, &message).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "WebSocket client lagging, events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
}
