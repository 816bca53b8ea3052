use crate::debate::{self, Granularity, Pacing};
use crate::error::DebateError;
use crate::origin::OriginPolicy;
use crate::protocol::{
    DebateEvent, DebateRequest, ErrorResponse, HealthResponse, InfoResponse,
};
use crate::stream::{self, StreamStats};
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::header::{AUTHORIZATION, CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode, request};
use axum::response::sse::{KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use uuid::Uuid;

const X_ACCEL_BUFFERING: &str = "x-accel-buffering";

pub struct ServerConfig {
    pub listen: String,
    pub origins: OriginPolicy,
    pub pacing: Pacing,
    pub granularity: Granularity,
    /// Interval between SSE keep-alive comments. Zero disables them.
    pub keep_alive: Duration,
}

struct ServerState {
    pacing: Pacing,
    granularity: Granularity,
    keep_alive: Duration,
    stats: Arc<StreamStats>,
}

type ServerResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

pub async fn run(config: ServerConfig) -> ServerResult<()> {
    let listener = tokio::net::TcpListener::bind(&config.listen).await?;
    tracing::info!("debate server listening on http://{}", config.listen);
    axum::serve(listener, router(config)).await?;

    Ok(())
}

pub fn router(config: ServerConfig) -> Router {
    let state = Arc::new(ServerState {
        pacing: config.pacing,
        granularity: config.granularity,
        keep_alive: config.keep_alive,
        stats: Arc::new(StreamStats::default()),
    });

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/schema", get(schema))
        .route("/debate", post(start_debate))
        .layer(cors(config.origins))
        .with_state(state)
}

fn cors(policy: OriginPolicy) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &request::Parts| {
                origin
                    .to_str()
                    .map(|origin| policy.allows(origin))
                    .unwrap_or(false)
            },
        ))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
}

async fn root() -> Json<InfoResponse> {
    Json(InfoResponse {
        message: "Welcome to the debate stream API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        schema: "/schema".to_string(),
    })
}

async fn health(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        message: "debate stream API is running".to_string(),
        active_streams: state.stats.active(),
        completed_streams: state.stats.completed(),
        disconnected_streams: state.stats.disconnected(),
        failed_streams: state.stats.failed(),
    })
}

async fn schema() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "request": schemars::schema_for!(DebateRequest),
        "event": schemars::schema_for!(DebateEvent),
    }))
}

async fn start_debate(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<DebateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, DebateError> {
    let Json(request) = payload.map_err(|rejection| DebateError::invalid(rejection.body_text()))?;
    request.validate()?;

    let debate = debate::generate(
        request.topic,
        request.max_rounds,
        state.pacing,
        state.granularity,
    )?;

    let stream_id = Uuid::new_v4();
    tracing::info!(
        %stream_id,
        topic = debate.topic(),
        max_rounds = debate.max_rounds(),
        "starting debate stream"
    );

    let mut sse = Sse::new(stream::into_sse(debate, Arc::clone(&state.stats), stream_id));
    if !state.keep_alive.is_zero() {
        sse = sse.keep_alive(
            KeepAlive::new()
                .interval(state.keep_alive)
                .text("keep-alive"),
        );
    }

    Ok((
        [
            (CACHE_CONTROL, "no-cache"),
            (CONNECTION, "keep-alive"),
            (HeaderName::from_static(X_ACCEL_BUFFERING), "no"),
        ],
        sse,
    ))
}

impl IntoResponse for DebateError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            DebateError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "invalid_argument"),
            DebateError::ClientDisconnected | DebateError::Serialization(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        };
        let message = match self {
            DebateError::InvalidArgument(message) => message,
            other => {
                tracing::error!("{other}");
                other.to_string()
            }
        };
        tracing::debug!(%status, %message, "rejecting request");

        (
            status,
            Json(ErrorResponse {
                error: error.to_string(),
                message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN};
    use tower::ServiceExt;

    fn app() -> Router {
        router(ServerConfig {
            listen: "127.0.0.1:0".to_string(),
            origins: OriginPolicy::new("pages.dev", vec!["https://debate.example.com".to_string()]),
            pacing: Pacing::instant(),
            granularity: Granularity::Char,
            keep_alive: Duration::from_secs(15),
        })
    }

    fn post_debate(body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/debate")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn debate_streams_framed_events() {
        let response = app()
            .oneshot(post_debate(r#"{"topic": "AI regulation", "max_rounds": 1}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[CONTENT_TYPE], "text/event-stream");
        assert_eq!(headers[CACHE_CONTROL], "no-cache");
        assert_eq!(headers[CONNECTION], "keep-alive");
        assert_eq!(headers[X_ACCEL_BUFFERING], "no");

        let body = body_text(response).await;
        assert!(body.starts_with(
            "data: {\"type\":\"status\",\"text\":\"⚡ Waking up the debate engine...\"}\n\n"
        ));

        let events: Vec<DebateEvent> = body
            .split("\n\n")
            .filter(|frame| !frame.is_empty())
            .map(|frame| {
                let json = frame.strip_prefix("data: ").expect("data frame");
                serde_json::from_str(json).unwrap()
            })
            .collect();

        let spoken: String = events
            .iter()
            .filter_map(|event| match event {
                DebateEvent::Token { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(spoken.matches("AI regulation").count(), 2);
        assert_eq!(events.iter().filter(|event| event.kind() == "speaker").count(), 2);
        assert!(events.last().unwrap().is_terminal());
    }

    #[tokio::test]
    async fn default_rounds_apply_when_omitted() {
        let response = app().oneshot(post_debate(r#"{"topic": "tea"}"#)).await.unwrap();
        let body = body_text(response).await;
        assert_eq!(body.matches(r#""type":"speaker_end""#).count(), 6);
    }

    #[tokio::test]
    async fn invalid_requests_get_a_clean_400() {
        for body in [
            r#"{"topic": "tea", "max_rounds": -1}"#,
            r#"{"topic": "tea", "max_rounds": 2.5}"#,
            r#"{"topic": "  ", "max_rounds": 1}"#,
            r#"{"max_rounds": 1}"#,
            "not json",
        ] {
            let response = app().oneshot(post_debate(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
            let error: ErrorResponse = serde_json::from_str(&body_text(response).await).unwrap();
            assert_eq!(error.error, "invalid_argument");
        }
    }

    #[tokio::test]
    async fn health_reports_stream_counters() {
        let app = app();
        let response = app
            .clone()
            .oneshot(post_debate(r#"{"topic": "tea", "max_rounds": 0}"#))
            .await
            .unwrap();
        body_text(response).await;

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let health: HealthResponse = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.active_streams, 0);
        assert_eq!(health.completed_streams, 1);
    }

    #[tokio::test]
    async fn root_and_schema_are_json() {
        let response = app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let info: InfoResponse = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(info.schema, "/schema");

        let response = app()
            .oneshot(Request::get("/schema").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let schema: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(schema.get("request").is_some());
        assert!(schema.get("event").is_some());
    }

    #[tokio::test]
    async fn cors_follows_origin_policy() {
        for (origin, allowed) in [
            ("http://localhost:3000", true),
            ("https://preview.pages.dev", true),
            ("https://debate.example.com", true),
            ("https://evil.example.com", false),
        ] {
            let request = Request::builder()
                .method(Method::OPTIONS)
                .uri("/debate")
                .header(ORIGIN, origin)
                .header("access-control-request-method", "POST")
                .body(Body::empty())
                .unwrap();
            let response = app().oneshot(request).await.unwrap();
            let header = response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN);
            if allowed {
                assert_eq!(header.unwrap(), origin);
            } else {
                assert!(header.is_none(), "{origin}");
            }
        }
    }
}
