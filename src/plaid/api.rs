//! JSON endpoints for linking bank accounts through Plaid.
//!
//! These do not call Plaid yet. They return well-formed placeholder
//! responses so that a client can be built against them.

use axum::Json;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{RngCore, rngs::OsRng};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::plaid::db::Account;

/// The number of random bytes in a link token.
const LINK_TOKEN_RANDOM_BYTES: usize = 16;

/// The user a link token is created for when the request does not name one.
const DEFAULT_USER_ID: &str = "1";

/// Every link token starts with this, whichever Plaid environment is configured.
pub const LINK_TOKEN_PREFIX: &str = "link-sandbox-";

#[derive(Debug, Default, Deserialize)]
pub struct LinkTokenRequest {
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LinkTokenResponse {
    pub link_token: String,
}

#[derive(Debug, Deserialize)]
pub struct ExchangeRequest {
    pub public_token: String,
}

#[derive(Debug, Serialize)]
pub struct ExchangeResponse {
    pub access_token_enc: String,
    pub item_id: String,
    pub accounts: Vec<Account>,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub synced: bool,
    pub added: u32,
    pub modified: u32,
    pub removed: u32,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub ok: bool,
}

/// Create a token for starting Plaid Link in the browser.
///
/// The token is [LINK_TOKEN_PREFIX] followed by random URL-safe characters,
/// so successive calls return different tokens.
pub async fn create_link_token(
    request: Option<Json<LinkTokenRequest>>,
) -> Json<LinkTokenResponse> {
    let request = request.map(|Json(request)| request).unwrap_or_default();
    let user_id = request.user_id.as_deref().unwrap_or(DEFAULT_USER_ID);

    let mut random_bytes = [0u8; LINK_TOKEN_RANDOM_BYTES];
    OsRng.fill_bytes(&mut random_bytes);
    let link_token = format!(
        "{LINK_TOKEN_PREFIX}{}",
        URL_SAFE_NO_PAD.encode(random_bytes)
    );

    tracing::info!("Created link token for user {user_id}");

    Json(LinkTokenResponse { link_token })
}

/// Exchange a public token from Plaid Link for an access token.
pub async fn exchange_public_token(Json(request): Json<ExchangeRequest>) -> Json<ExchangeResponse> {
    tracing::info!(
        "Received public token exchange request ({} characters)",
        request.public_token.len()
    );

    Json(ExchangeResponse {
        access_token_enc: "enc_dummy_token".to_owned(),
        item_id: "item_dummy".to_owned(),
        accounts: Vec::new(),
    })
}

/// Sync transactions for the linked items.
pub async fn sync_transactions() -> Json<SyncResponse> {
    tracing::info!("Transaction sync requested");

    Json(SyncResponse {
        synced: true,
        added: 0,
        modified: 0,
        removed: 0,
    })
}

/// Receive a webhook event from Plaid.
pub async fn plaid_webhook(Json(event): Json<Map<String, Value>>) -> Json<WebhookResponse> {
    let webhook_type = event
        .get("webhook_type")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let webhook_code = event
        .get("webhook_code")
        .and_then(Value::as_str)
        .unwrap_or("unknown");

    tracing::info!("Received Plaid webhook {webhook_type}/{webhook_code}");

    Json(WebhookResponse { ok: true })
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::endpoints;

    use super::{
        LINK_TOKEN_PREFIX, LinkTokenResponse, create_link_token, exchange_public_token,
        plaid_webhook, sync_transactions,
    };

    fn get_test_server() -> TestServer {
        let app = Router::new()
            .route(endpoints::PLAID_CREATE_LINK_TOKEN, post(create_link_token))
            .route(endpoints::PLAID_EXCHANGE, post(exchange_public_token))
            .route(endpoints::PLAID_SYNC, post(sync_transactions))
            .route(endpoints::PLAID_WEBHOOK, post(plaid_webhook));

        TestServer::try_new(app).expect("Could not create test server")
    }

    #[tokio::test]
    async fn link_token_has_sandbox_prefix() {
        let server = get_test_server();

        let response = server
            .post(endpoints::PLAID_CREATE_LINK_TOKEN)
            .json(&json!({ "user_id": "42" }))
            .await;

        response.assert_status_ok();
        let body = response.json::<LinkTokenResponse>();
        assert!(
            body.link_token.starts_with("link-sandbox-"),
            "got {}",
            body.link_token
        );
        assert!(body.link_token.len() > LINK_TOKEN_PREFIX.len());
    }

    #[tokio::test]
    async fn link_token_does_not_need_a_body() {
        let server = get_test_server();

        let response = server.post(endpoints::PLAID_CREATE_LINK_TOKEN).await;

        response.assert_status_ok();
        assert!(
            response
                .json::<LinkTokenResponse>()
                .link_token
                .starts_with("link-")
        );
    }

    #[tokio::test]
    async fn successive_link_tokens_differ() {
        let server = get_test_server();

        let first = server
            .post(endpoints::PLAID_CREATE_LINK_TOKEN)
            .json(&json!({}))
            .await
            .json::<LinkTokenResponse>();
        let second = server
            .post(endpoints::PLAID_CREATE_LINK_TOKEN)
            .json(&json!({}))
            .await
            .json::<LinkTokenResponse>();

        assert_ne!(first.link_token, second.link_token);
    }

    #[tokio::test]
    async fn exchange_returns_placeholder_item() {
        let server = get_test_server();

        let response = server
            .post(endpoints::PLAID_EXCHANGE)
            .json(&json!({ "public_token": "public-sandbox-123" }))
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<Value>(),
            json!({
                "access_token_enc": "enc_dummy_token",
                "item_id": "item_dummy",
                "accounts": [],
            })
        );
    }

    #[tokio::test]
    async fn exchange_requires_public_token() {
        let server = get_test_server();

        let response = server
            .post(endpoints::PLAID_EXCHANGE)
            .json(&json!({}))
            .await;

        assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn sync_reports_no_changes() {
        let server = get_test_server();

        let response = server.post(endpoints::PLAID_SYNC).await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<Value>(),
            json!({ "synced": true, "added": 0, "modified": 0, "removed": 0 })
        );
    }

    #[tokio::test]
    async fn webhook_acknowledges_event() {
        let server = get_test_server();

        let response = server
            .post(endpoints::PLAID_WEBHOOK)
            .json(&json!({
                "webhook_type": "TRANSACTIONS",
                "webhook_code": "SYNC_UPDATES_AVAILABLE",
            }))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), json!({ "ok": true }));
    }
}
