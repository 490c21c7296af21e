//! HTTP transport for the messaging gateway
//!
//! - `POST /webhook` - gateway payload (form-encoded or JSON), TwiML reply
//! - `POST /chat` - JSON `{ "from"?, "message" }`, JSON `{ "reply" }`
//! - `GET /health` - liveness probe

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::composer::Composer;
use crate::types::InboundMessage;

/// Sender id used when the gateway omits `From`
const ANONYMOUS_SENDER: &str = "anonymous";
/// Sender id for JSON requests without `from`
const API_SENDER: &str = "api";

/// Twilio posts these as form fields (JSON is accepted too); anything else is ignored
#[derive(Debug, Default, Deserialize)]
pub struct GatewayForm {
    #[serde(rename = "Body", default)]
    pub body: Option<String>,
    #[serde(rename = "From", default)]
    pub from: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub from: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// Wrap a reply in TwiML messaging markup
pub fn twiml(reply: Option<&str>) -> String {
    match reply {
        Some(text) => format!(
            "<Response><Message>{}</Message></Response>",
            html_escape::encode_text(text)
        ),
        None => "<Response></Response>".to_string(),
    }
}

fn xml(body: String) -> Response {
    ([(header::CONTENT_TYPE, "text/xml")], body).into_response()
}

fn is_json(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.trim_start().starts_with("application/json"))
        .unwrap_or(false)
}

/// Decode the gateway payload from either content type
async fn read_gateway_payload(request: Request) -> std::result::Result<GatewayForm, String> {
    if is_json(&request) {
        Json::<GatewayForm>::from_request(request, &())
            .await
            .map(|Json(form)| form)
            .map_err(|e| e.body_text())
    } else {
        Form::<GatewayForm>::from_request(request, &())
            .await
            .map(|Form(form)| form)
            .map_err(|e| e.body_text())
    }
}

/// Always answers 200 with TwiML; unreadable payloads get an empty response
async fn gateway_handler(State(composer): State<Arc<Composer>>, request: Request) -> Response {
    let form = match read_gateway_payload(request).await {
        Ok(form) => form,
        Err(reason) => {
            debug!(%reason, "unreadable gateway payload");
            return xml(twiml(None));
        }
    };

    let text = form.body.as_deref().map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return xml(twiml(None));
    }

    let sender = form
        .from
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(ANONYMOUS_SENDER);

    let reply = composer.respond(&InboundMessage::new(sender, text)).await;
    xml(twiml(Some(&reply)))
}

fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

async fn chat_handler(
    State(composer): State<Arc<Composer>>,
    request: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let request = match request {
        Ok(Json(request)) => request,
        Err(rejection) => return json_error(rejection.status(), rejection.body_text()),
    };

    let text = request.message.trim();
    if text.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "message must not be empty");
    }

    let sender = request
        .from
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(API_SENDER);

    let reply = composer.respond(&InboundMessage::new(sender, text)).await;
    Json(ChatResponse { reply }).into_response()
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Build the application router
pub fn router(composer: Arc<Composer>) -> Router {
    Router::new()
        .route("/webhook", post(gateway_handler))
        .route("/chat", post(chat_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(composer)
}

/// Serve the router on all interfaces until the process is stopped
pub async fn serve(composer: Arc<Composer>, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(%addr, "jarvis listening");
    axum::serve(listener, router(composer))
        .await
        .context("Server error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::tests::{FakeCompletion, FakeEncyclopedia, Fakes};
    use crate::history::HistoryStore;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, String, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn form_post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn test_twiml_escapes_reply() {
        assert_eq!(
            twiml(Some("R&D <ok>")),
            "<Response><Message>R&amp;D &lt;ok&gt;</Message></Response>"
        );
        assert_eq!(twiml(None), "<Response></Response>");
    }

    #[tokio::test]
    async fn test_webhook_replies_with_twiml() {
        let fakes = Fakes {
            encyclopedia: Arc::new(FakeEncyclopedia {
                extract: Some("AT&T is a <company>.".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let app = router(Arc::new(fakes.composer()));

        let (status, content_type, body) = send(
            app,
            form_post("/webhook", "Body=wiki+AT%26T&From=whatsapp%3A%2B40712345678"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(content_type.starts_with("text/xml"));
        assert_eq!(
            body,
            "<Response><Message>AT&amp;T is a &lt;company&gt;.</Message></Response>"
        );

        let history = fakes.history.load("whatsapp:+40712345678").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "wiki AT&T");
    }

    #[tokio::test]
    async fn test_webhook_empty_body_returns_empty_twiml() {
        let fakes = Fakes::default();
        let app = router(Arc::new(fakes.composer()));

        let (status, _, body) = send(app, form_post("/webhook", "Body=++&From=whatsapp%3A%2B1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<Response></Response>");
        assert!(fakes.history.load("whatsapp:+1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_webhook_missing_fields() {
        let fakes = Fakes::default();
        let app = router(Arc::new(fakes.composer()));

        let (status, _, body) = send(app, form_post("/webhook", "SmsSid=SM123")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<Response></Response>");
    }

    #[tokio::test]
    async fn test_webhook_accepts_json_payload() {
        let fakes = Fakes {
            completion: Arc::new(FakeCompletion {
                answer: Some("Hi!".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let app = router(Arc::new(fakes.composer()));

        let (status, content_type, body) = send(
            app,
            json_post("/webhook", serde_json::json!({ "Body": "hello", "From": "x" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(content_type.starts_with("text/xml"));
        assert_eq!(body, "<Response><Message>Hi!</Message></Response>");
        assert_eq!(fakes.history.load("x").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_webhook_unreadable_payload_returns_empty_twiml() {
        let fakes = Fakes::default();
        let app = router(Arc::new(fakes.composer()));

        let request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("hello"))
            .unwrap();
        let (status, _, body) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<Response></Response>");

        let request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, _, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<Response></Response>");
    }

    #[tokio::test]
    async fn test_chat_endpoint() {
        let fakes = Fakes {
            completion: Arc::new(FakeCompletion {
                answer: Some("Hello there".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let app = router(Arc::new(fakes.composer()));

        let (status, content_type, body) = send(
            app,
            json_post("/chat", serde_json::json!({ "message": "hello, how are you?" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(content_type.starts_with("application/json"));
        let response: ChatResponse = serde_json::from_str(&body).unwrap();
        assert_eq!(response.reply, "Hello there");
        assert_eq!(fakes.history.load(API_SENDER).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_chat_endpoint_rejects_empty_message() {
        let fakes = Fakes::default();
        let app = router(Arc::new(fakes.composer()));

        let (status, content_type, body) =
            send(app, json_post("/chat", serde_json::json!({ "message": "  " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(content_type.starts_with("application/json"));
        let error: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(error["error"], "message must not be empty");
    }

    #[tokio::test]
    async fn test_chat_endpoint_missing_message_is_json_error() {
        let fakes = Fakes::default();
        let app = router(Arc::new(fakes.composer()));

        let (status, content_type, body) =
            send(app, json_post("/chat", serde_json::json!({ "from": "x" }))).await;
        assert!(status.is_client_error());
        assert!(content_type.starts_with("application/json"));
        let error: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(error["error"].as_str().unwrap().contains("message"));
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(Arc::new(Fakes::default().composer()));
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let (status, _, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"status":"ok"}"#);
    }
}
