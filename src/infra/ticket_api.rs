use async_trait::async_trait;
use base64::prelude::{BASE64_STANDARD, Engine as _};
use reqwest::{
    Client, RequestBuilder, StatusCode, Url,
    header::{ACCEPT, AUTHORIZATION},
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::domain::ticket::{EditableTicket, Ticket, TicketDraft};
use crate::error::{AppError, AppResult};
use crate::infra::endpoint_url;
use crate::services::TicketService;

#[derive(Debug, Clone)]
pub enum Credentials {
    Bearer(String),
    Basic { user: String, password: String },
}

impl Credentials {
    fn header_value(&self) -> String {
        match self {
            Credentials::Bearer(token) => format!("Bearer {token}"),
            Credentials::Basic { user, password } => {
                let encoded = BASE64_STANDARD.encode(format!("{user}:{password}"));
                format!("Basic {encoded}")
            }
        }
    }
}

/// Client for the ticket service REST API.
pub struct TicketApiClient {
    http: Client,
    base_url: Option<String>,
    credentials: Option<Credentials>,
}

impl TicketApiClient {
    pub fn new(http: Client, base_url: Option<String>, credentials: Option<Credentials>) -> Self {
        Self {
            http,
            base_url,
            credentials,
        }
    }

    fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or_else(|| AppError::Configuration("ticket API URL not configured".to_string()))?;
        endpoint_url(base_url, segments)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(ACCEPT, "application/json");
        match &self.credentials {
            Some(credentials) => request.header(AUTHORIZATION, credentials.header_value()),
            None => request,
        }
    }

    /// Sends the request and unwraps the `{success, message, response}`
    /// envelope. Transport problems are errors; a refusal by the service is
    /// returned as `Reply::Refused` with its message.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> AppResult<Reply<T>> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|err| AppError::Proxy(format!("failed to call ticket API: {err}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| AppError::Proxy(format!("failed to read ticket API response: {err}")))?;
        debug!(%status, bytes = body.len(), "ticket API replied");

        let envelope = serde_json::from_str::<Envelope<T>>(&body);
        if !status.is_success() {
            let message = envelope
                .ok()
                .and_then(|envelope| envelope.message)
                .unwrap_or_else(|| format!("ticket API responded with {status}: {body}"));
            return Ok(Reply::Refused { status, message });
        }

        let envelope = envelope.map_err(|err| {
            AppError::Proxy(format!("failed to parse ticket API response: {err}"))
        })?;
        match (envelope.success, envelope.response) {
            (Some(false), _) | (_, None) => Ok(Reply::Refused {
                status,
                message: envelope
                    .message
                    .unwrap_or_else(|| "ticket API reported a failure".to_string()),
            }),
            (_, Some(payload)) => Ok(Reply::Accepted(payload)),
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, action: &str, prepid: &str) -> AppResult<T> {
        let url = self.endpoint(&["api", "tickets", action, prepid])?;
        match self.send(self.http.get(url)).await? {
            Reply::Accepted(payload) => Ok(payload),
            Reply::Refused { message, .. } => Err(AppError::TicketNotFound {
                prepid: prepid.to_string(),
                message,
            }),
        }
    }

    async fn save(&self, request: RequestBuilder, draft: &TicketDraft) -> AppResult<String> {
        match self.send::<SavedTicket>(request.json(draft)).await? {
            Reply::Accepted(saved) => Ok(saved.prepid),
            Reply::Refused { status, message } => {
                debug!(%status, "ticket API refused the ticket");
                Err(AppError::Proxy(message))
            }
        }
    }
}

#[async_trait]
impl TicketService for TicketApiClient {
    async fn get(&self, prepid: &str) -> AppResult<Ticket> {
        self.fetch("get", prepid).await
    }

    async fn get_editable(&self, prepid: &str) -> AppResult<EditableTicket> {
        self.fetch("get_editable", prepid).await
    }

    async fn create(&self, draft: &TicketDraft) -> AppResult<String> {
        let url = self.endpoint(&["api", "tickets", "create"])?;
        self.save(self.http.put(url), draft).await
    }

    async fn update(&self, draft: &TicketDraft) -> AppResult<String> {
        let url = self.endpoint(&["api", "tickets", "update"])?;
        self.save(self.http.post(url), draft).await
    }

    async fn search(&self, query: &[(String, String)]) -> AppResult<Vec<Ticket>> {
        let url = self.endpoint(&["api", "search"])?;
        let request = self
            .http
            .get(url)
            .query(&[("db_name", "tickets")])
            .query(query);
        match self.send::<SearchResults>(request).await? {
            Reply::Accepted(results) => Ok(results.results),
            Reply::Refused { message, .. } => Err(AppError::Proxy(message)),
        }
    }
}

enum Reply<T> {
    Accepted(T),
    Refused { status: StatusCode, message: String },
}

#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
    response: Option<T>,
}

#[derive(Deserialize)]
struct SavedTicket {
    #[serde(default)]
    prepid: String,
}

#[derive(Deserialize)]
struct SearchResults {
    #[serde(default)]
    results: Vec<Ticket>,
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post, put};
    use axum::{Json, Router};
    use serde_json::{Value, json};
    use tokio::net::TcpListener;

    use super::*;

    #[derive(Clone, Default)]
    struct Seen {
        bodies: Arc<Mutex<Vec<Value>>>,
        auth: Arc<Mutex<Vec<String>>>,
        queries: Arc<Mutex<Vec<Vec<(String, String)>>>>,
    }

    async fn spawn_ticket_api(seen: Seen) -> SocketAddr {
        async fn get_ticket(Path(prepid): Path<String>) -> (StatusCode, Json<Value>) {
            if prepid == "TICKET-1" {
                (
                    StatusCode::OK,
                    Json(json!({
                        "success": true,
                        "message": "",
                        "response": {"prepid": "TICKET-1", "status": "new", "workflow_ids": [6.13]}
                    })),
                )
            } else {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({"success": false, "message": format!("Object {prepid} does not exist")})),
                )
            }
        }

        async fn get_editable(Path(prepid): Path<String>) -> Json<Value> {
            Json(json!({
                "success": true,
                "response": {
                    "object": {"prepid": prepid, "batch_name": "Tracker"},
                    "editing_info": {"batch_name": false, "notes": true}
                }
            }))
        }

        async fn create(
            State(seen): State<Seen>,
            headers: HeaderMap,
            Json(body): Json<Value>,
        ) -> Json<Value> {
            if let Some(value) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
                seen.auth.lock().expect("lock").push(value.to_string());
            }
            seen.bodies.lock().expect("lock").push(body);
            Json(json!({"success": true, "message": "", "response": {"prepid": "TICKET-2"}}))
        }

        async fn update(Json(_body): Json<Value>) -> Json<Value> {
            Json(json!({"success": false, "message": "Ticket TICKET-1 is not editable", "response": null}))
        }

        async fn search(
            State(seen): State<Seen>,
            Query(query): Query<Vec<(String, String)>>,
        ) -> Json<Value> {
            seen.queries.lock().expect("lock").push(query);
            Json(json!({"response": {"results": [{"prepid": "TICKET-1"}, {"prepid": "TICKET-2"}]}}))
        }

        let app = Router::new()
            .route("/api/tickets/get/:prepid", get(get_ticket))
            .route("/api/tickets/get_editable/:prepid", get(get_editable))
            .route("/api/tickets/create", put(create))
            .route("/api/tickets/update", post(update))
            .route("/api/search", get(search))
            .with_state(seen);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind should succeed");
        let addr = listener.local_addr().expect("local_addr should succeed");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        addr
    }

    fn client(addr: SocketAddr, credentials: Option<Credentials>) -> TicketApiClient {
        TicketApiClient::new(Client::new(), Some(format!("http://{addr}/")), credentials)
    }

    #[tokio::test]
    async fn get_unwraps_envelope_and_maps_missing_tickets() {
        let addr = spawn_ticket_api(Seen::default()).await;
        let api = client(addr, None);

        let ticket = api.get("TICKET-1").await.expect("ticket exists");
        assert_eq!(ticket.status, "new");

        match api.get("TICKET-404").await {
            Err(AppError::TicketNotFound { prepid, message }) => {
                assert_eq!(prepid, "TICKET-404");
                assert_eq!(message, "Object TICKET-404 does not exist");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[tokio::test]
    async fn get_editable_returns_draft_and_editing_info() {
        let addr = spawn_ticket_api(Seen::default()).await;

        let editable = client(addr, None)
            .get_editable("TICKET-1")
            .await
            .expect("editable view");

        assert_eq!(editable.object["batch_name"], json!("Tracker"));
        assert_eq!(editable.editing_info.get("batch_name"), Some(&false));
    }

    #[tokio::test]
    async fn prepid_stays_one_path_segment() {
        let addr = spawn_ticket_api(Seen::default()).await;

        let editable = client(addr, None)
            .get_editable("TSG/2022?x=1#top")
            .await
            .expect("editable view");

        assert_eq!(editable.object["prepid"], json!("TSG/2022?x=1#top"));
    }

    #[tokio::test]
    async fn create_sends_json_body_with_credentials() {
        let seen = Seen::default();
        let addr = spawn_ticket_api(seen.clone()).await;
        let api = client(
            addr,
            Some(Credentials::Basic {
                user: "alice".to_string(),
                password: "secret".to_string(),
            }),
        );
        let mut draft = TicketDraft::new();
        draft.insert("batch_name".to_string(), json!("Tracker"));

        let prepid = api.create(&draft).await.expect("create succeeds");

        assert_eq!(prepid, "TICKET-2");
        assert_eq!(
            seen.bodies.lock().expect("lock").as_slice(),
            [json!({"batch_name": "Tracker"})]
        );
        assert_eq!(
            seen.auth.lock().expect("lock").as_slice(),
            ["Basic YWxpY2U6c2VjcmV0".to_string()]
        );
    }

    #[tokio::test]
    async fn update_failure_carries_service_message() {
        let addr = spawn_ticket_api(Seen::default()).await;

        match client(addr, None).update(&TicketDraft::new()).await {
            Err(AppError::Proxy(message)) => assert_eq!(message, "Ticket TICKET-1 is not editable"),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[tokio::test]
    async fn search_scopes_query_to_tickets() {
        let seen = Seen::default();
        let addr = spawn_ticket_api(seen.clone()).await;

        let tickets = client(addr, None)
            .search(&[("status".to_string(), "new".to_string())])
            .await
            .expect("search succeeds");

        assert_eq!(tickets.len(), 2);
        assert_eq!(
            seen.queries.lock().expect("lock")[0],
            vec![
                ("db_name".to_string(), "tickets".to_string()),
                ("status".to_string(), "new".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn missing_base_url_is_a_configuration_error() {
        let api = TicketApiClient::new(Client::new(), None, None);
        assert!(matches!(
            api.get("TICKET-1").await,
            Err(AppError::Configuration(_))
        ));
    }
}
