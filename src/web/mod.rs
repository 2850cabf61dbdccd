mod assets;

use std::{
    convert::Infallible,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::broadcast};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tracing::{error, info, warn};

use crate::{
    advisor::{AdvisorClient, AdvisorConfig},
    config::FarmConfig,
    crops::CropKind,
    engine::DaySummary,
    farm::FarmError,
    game::{Game, GameError, StateEnvelope},
};

const SWEEP_PERIOD: Duration = Duration::from_millis(500);

pub struct AppState {
    game: Mutex<Game>,
    advisor: AdvisorClient,
    broadcaster: broadcast::Sender<String>,
}

impl AppState {
    pub fn new(game: Game, advisor: AdvisorClient) -> Arc<Self> {
        let (broadcaster, _) = broadcast::channel::<String>(256);
        Arc::new(Self {
            game: Mutex::new(game),
            advisor,
            broadcaster,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.broadcaster.subscribe()
    }

    // Transitions check before they mutate, so state behind a poisoned lock
    // is still whole.
    fn game(&self) -> MutexGuard<'_, Game> {
        self.game.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pushes the current state to every open event stream.
    fn publish(&self, game: &Game) -> StateEnvelope {
        let envelope = game.envelope();
        match serde_json::to_string(&envelope) {
            Ok(payload) => {
                let _ = self.broadcaster.send(payload);
            }
            Err(err) => warn!(error = %err, "failed to encode state for subscribers"),
        }
        envelope
    }
}

pub struct WebServerConfig {
    pub farm: FarmConfig,
    pub advisor: AdvisorConfig,
    pub host: String,
    pub port: u16,
}

pub async fn run(config: WebServerConfig) -> Result<()> {
    let WebServerConfig {
        farm,
        advisor,
        host,
        port,
    } = config;

    let name = farm.display_name().to_string();
    let advisor = AdvisorClient::new(advisor);
    info!(
        model = %advisor.config().model_id,
        region = %advisor.config().region,
        signed = advisor.config().credentials.is_some(),
        "advisor configured"
    );
    let state = AppState::new(Game::new(&farm), advisor);
    spawn_notification_sweeper(state.clone(), SWEEP_PERIOD);

    let router = build_router(state);
    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(farm = %name, "🚜 farm live at http://{addr} (Ctrl+C to stop)");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/styles.css", get(styles))
        .route("/app.js", get(script))
        .route("/api/state", get(current_state))
        .route("/api/select", post(select_crop))
        .route("/api/cells/:row/:col/click", post(click_cell))
        .route("/api/next-day", post(next_day))
        .route("/api/loan/take", post(take_loan))
        .route("/api/loan/repay", post(repay_loan))
        .route("/api/advisor", post(ask_advisor))
        .route("/api/events", get(stream_events))
        .with_state(state)
}

/// Drops expired toasts and tells subscribers when any went.
pub fn spawn_notification_sweeper(
    state: Arc<AppState>,
    period: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            {
                let mut game = state.game();
                if game.sweep_notifications() > 0 {
                    state.publish(&game);
                }
            }
        }
    })
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for Ctrl+C");
    }
    info!("shutting down farm server");
}

#[derive(Debug)]
pub enum ApiError {
    Game(GameError),
    Internal(anyhow::Error),
}

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        Self::Game(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Game(err) => {
                let status = match &err {
                    GameError::Farm(FarmError::InsufficientFunds { .. }) => {
                        StatusCode::PAYMENT_REQUIRED
                    }
                    GameError::AdviceInFlight => StatusCode::CONFLICT,
                    GameError::Farm(_) | GameError::EmptyQuestion => StatusCode::BAD_REQUEST,
                };
                (status, err.to_string())
            }
            Self::Internal(err) => {
                error!(error = ?err, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

fn static_asset(content_type: &'static str, body: &'static str) -> Response {
    (
        [(header::CONTENT_TYPE, content_type)],
        Bytes::from_static(body.as_bytes()),
    )
        .into_response()
}

async fn index() -> Html<&'static str> {
    Html(assets::INDEX_HTML)
}

async fn styles() -> Response {
    static_asset("text/css; charset=utf-8", assets::STYLES_CSS)
}

async fn script() -> Response {
    static_asset("application/javascript; charset=utf-8", assets::APP_JS)
}

async fn current_state(State(state): State<Arc<AppState>>) -> Json<StateEnvelope> {
    Json(state.game().envelope())
}

#[derive(Debug, Deserialize)]
struct SelectRequest {
    kind: CropKind,
}

async fn select_crop(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectRequest>,
) -> Result<Json<StateEnvelope>, ApiError> {
    let mut game = state.game();
    game.select_crop(request.kind)?;
    Ok(Json(state.publish(&game)))
}

async fn click_cell(
    State(state): State<Arc<AppState>>,
    Path((row, col)): Path<(usize, usize)>,
) -> Result<Json<StateEnvelope>, ApiError> {
    let mut game = state.game();
    let outcome = game.click_cell(row, col);
    // Failed plants still queue a toast worth showing.
    let envelope = state.publish(&game);
    outcome?;
    Ok(Json(envelope))
}

#[derive(Debug, Serialize)]
struct NextDayResponse {
    summary: DaySummary,
    state: StateEnvelope,
}

async fn next_day(State(state): State<Arc<AppState>>) -> Result<Json<NextDayResponse>, ApiError> {
    let mut game = state.game();
    let summary = game.next_day()?;
    Ok(Json(NextDayResponse {
        summary,
        state: state.publish(&game),
    }))
}

#[derive(Debug, Deserialize)]
struct LoanRequest {
    amount: u64,
}

#[derive(Debug, Serialize)]
struct LoanResponse {
    amount: u64,
    state: StateEnvelope,
}

async fn take_loan(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoanRequest>,
) -> Result<Json<LoanResponse>, ApiError> {
    let mut game = state.game();
    let amount = game.take_loan(request.amount)?;
    Ok(Json(LoanResponse {
        amount,
        state: state.publish(&game),
    }))
}

async fn repay_loan(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoanRequest>,
) -> Json<LoanResponse> {
    let mut game = state.game();
    let amount = game.repay_loan(request.amount);
    Json(LoanResponse {
        amount,
        state: state.publish(&game),
    })
}

#[derive(Debug, Deserialize)]
struct AdviceRequest {
    question: String,
}

#[derive(Debug, Serialize)]
struct AdviceResponse {
    advice: String,
    state: StateEnvelope,
}

async fn ask_advisor(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AdviceRequest>,
) -> Result<Json<AdviceResponse>, ApiError> {
    let snapshot = {
        let mut game = state.game();
        let snapshot = game.begin_advice(&request.question)?;
        state.publish(&game);
        snapshot
    };

    // The reply lands in the transcript even if this request is dropped.
    let task_state = state.clone();
    let question = request.question.trim().to_string();
    let answer = tokio::spawn(async move {
        let advice = task_state
            .advisor
            .request_advice(&snapshot, &question)
            .await;
        let mut game = task_state.game();
        game.finish_advice(advice.clone());
        let envelope = task_state.publish(&game);
        (advice, envelope)
    });

    let (advice, envelope) = answer
        .await
        .context("advisor task did not complete")?;
    Ok(Json(AdviceResponse {
        advice,
        state: envelope,
    }))
}

async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(payload) => Some(Ok(Event::default().data(payload))),
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(2))
            .text("keep-alive"),
    )
}
