/// Web surface for the planner
/// Serves the trip form, renders results, and exposes a JSON endpoint for scripted clients

use axum::{
    extract::{rejection::JsonRejection, Form, Json, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::Instrument;

use crate::error::PlannerError;
use crate::planner::ItineraryPlanner;
use crate::trip::TripRequest;

#[derive(Clone)]
pub struct AppState {
    pub planner: ItineraryPlanner,
    /// Cancelled on server shutdown; every request waits on a child of it
    pub shutdown: CancellationToken,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// JSON response for `/api/itinerary`
#[derive(Debug, Serialize)]
pub struct ItineraryResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub itinerary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub request_id: String,
}

/// What the page shows under the form
#[derive(Debug)]
enum Outcome {
    Itinerary(String),
    Warning(String),
    Error { message: String, hint: Option<&'static str> },
}

impl From<PlannerError> for Outcome {
    fn from(err: PlannerError) -> Self {
        if err.is_validation() {
            Outcome::Warning(err.user_message())
        } else {
            Outcome::Error {
                message: err.user_message(),
                hint: err.hint(),
            }
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/itinerary", post(itinerary_form))
        .route("/api/itinerary", post(itinerary_api))
        .route("/health", get(health))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn index() -> Html<String> {
    Html(render_page(&TripRequest::default(), None))
}

async fn itinerary_form(
    State(state): State<AppState>,
    Form(request): Form<TripRequest>,
) -> Html<String> {
    let outcome = match run_request(&state, &request).await {
        (_, Ok(text)) => Outcome::Itinerary(text),
        (_, Err(e)) => Outcome::from(e),
    };
    Html(render_page(&request, Some(&outcome)))
}

async fn itinerary_api(
    State(state): State<AppState>,
    payload: Result<Json<TripRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let request_id = new_request_id();
            tracing::info!(%request_id, error = %rejection.body_text(), "malformed itinerary request");
            return (
                StatusCode::BAD_REQUEST,
                Json(ItineraryResponse {
                    success: false,
                    itinerary: None,
                    error: Some(format!("Invalid request: {}", rejection.body_text())),
                    request_id,
                }),
            );
        }
    };

    let (request_id, result) = run_request(&state, &request).await;
    match result {
        Ok(itinerary) => (
            StatusCode::OK,
            Json(ItineraryResponse {
                success: true,
                itinerary: Some(itinerary),
                error: None,
                request_id,
            }),
        ),
        Err(e) => (
            status_for(&e),
            Json(ItineraryResponse {
                success: false,
                itinerary: None,
                error: Some(e.user_message()),
                request_id,
            }),
        ),
    }
}

/// Run one planner request under its own id and cancellation scope
async fn run_request(
    state: &AppState,
    request: &TripRequest,
) -> (String, Result<String, PlannerError>) {
    let request_id = new_request_id();
    let cancel = state.shutdown.child_token();
    let result = state
        .planner
        .plan(request, &cancel)
        .instrument(tracing::info_span!("itinerary", %request_id))
        .await;

    match &result {
        Ok(_) => tracing::info!(%request_id, "itinerary request succeeded"),
        Err(e) if e.is_validation() => tracing::info!(%request_id, error = %e, "itinerary request rejected"),
        Err(e) => tracing::error!(%request_id, error = %e, "itinerary request failed"),
    }
    (request_id, result)
}

fn new_request_id() -> String {
    format!("req_{}", uuid::Uuid::new_v4())
}

fn status_for(err: &PlannerError) -> StatusCode {
    match err {
        PlannerError::MissingFields(_) => StatusCode::BAD_REQUEST,
        PlannerError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        PlannerError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_GATEWAY,
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Itinerary(text) => format!(
            r#"<div class="success">🎉 Your Itinerary:</div>
<div class="itinerary">{}</div>"#,
            escape_html(text)
        ),
        Outcome::Warning(message) => {
            format!(r#"<div class="warning">{}</div>"#, escape_html(message))
        }
        Outcome::Error { message, hint } => {
            let mut html = format!(r#"<div class="error">{}</div>"#, escape_html(message));
            if let Some(hint) = hint {
                html.push_str(&format!(r#"<div class="error">{}</div>"#, escape_html(hint)));
            }
            html
        }
    }
}

fn render_page(request: &TripRequest, outcome: Option<&Outcome>) -> String {
    let date_value = |d: Option<chrono::NaiveDate>| {
        d.map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>AI Travel Planner</title>
<link rel="icon" href="data:image/svg+xml,<svg xmlns=%22http://www.w3.org/2000/svg%22><text y=%22.9em%22 font-size=%2290%22>🧭</text></svg>">
<style>
body {{ font-family: sans-serif; max-width: 720px; margin: 2rem auto; padding: 0 1rem; }}
label {{ display: block; margin-top: 1rem; }}
input {{ width: 100%; padding: .4rem; }}
button {{ margin-top: 1.5rem; padding: .5rem 1rem; }}
.success {{ background: #e6f4ea; padding: .75rem; margin-top: 1.5rem; }}
.warning {{ background: #fff4e5; padding: .75rem; margin-top: 1.5rem; }}
.error {{ background: #fdecea; padding: .75rem; margin-top: .75rem; }}
.itinerary {{ white-space: pre-wrap; margin-top: 1rem; }}
</style>
</head>
<body>
<h1>🧳 AI Travel Planner</h1>
<p>Plan your next adventure with AI-powered itinerary suggestions.</p>
<form method="post" action="/itinerary">
<label>Origin City <input name="origin" placeholder="e.g., Nashville, TN" value="{origin}"></label>
<label>Destination City <input name="destination" placeholder="e.g., Boston, MA" value="{destination}"></label>
<label>Start Date <input type="date" name="start_date" value="{start}"></label>
<label>End Date <input type="date" name="end_date" value="{end}"></label>
<button type="submit">Generate Itinerary</button>
</form>
{outcome}
</body>
</html>
"#,
        origin = escape_html(&request.origin),
        destination = escape_html(&request.destination),
        start = date_value(request.start_date),
        end = date_value(request.end_date),
        outcome = outcome.map(render_outcome).unwrap_or_default(),
    )
}
