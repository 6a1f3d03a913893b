//! Azure Key Vault client tests against an in-process mock
//!
//! The mock serves the secrets REST paths with the `api-version` query
//! parameter, checks the bearer token, and pages list results two at a time.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use keyvault_console::provider::azure::key_vault::StaticTokenCredential;
use keyvault_console::provider::AzureKeyVault;
use keyvault_console::{Console, ConsoleError, SecretStore, SecretValue, VaultRegistry, VaultRegistration};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

const TOKEN: &str = "test-token";
const PAGE_SIZE: usize = 2;

#[derive(Clone)]
struct MockSecret {
    value: String,
    enabled: bool,
    updated: i64,
}

#[derive(Clone)]
struct MockVault {
    base: String,
    secrets: Arc<Mutex<BTreeMap<String, MockSecret>>>,
    /// Message returned (with 403) by the next PUT
    reject_next_set: Arc<Mutex<Option<String>>>,
}

#[derive(serde::Deserialize)]
struct SetSecretRequest {
    value: String,
}

fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({ "error": { "code": code, "message": message.into() } })),
    )
        .into_response()
}

fn check_request(headers: &HeaderMap, query: &HashMap<String, String>) -> Option<Response> {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"));
    if !authorized {
        return Some(error_response(
            StatusCode::UNAUTHORIZED,
            "Unauthorized",
            "AKV10000: Request is missing a Bearer or PoP token.",
        ));
    }
    if !query.contains_key("api-version") {
        return Some(error_response(
            StatusCode::BAD_REQUEST,
            "MissingApiVersionParameter",
            "The api-version query parameter (?api-version=) is required for all requests.",
        ));
    }
    None
}

async fn list_secrets(
    State(vault): State<MockVault>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Some(rejection) = check_request(&headers, &query) {
        return rejection;
    }
    let skip: usize = query.get("skip").and_then(|s| s.parse().ok()).unwrap_or(0);
    let secrets = vault.secrets.lock().await;

    let value: Vec<serde_json::Value> = secrets
        .iter()
        .skip(skip)
        .take(PAGE_SIZE)
        .map(|(name, secret)| {
            json!({
                "id": format!("{}/secrets/{}", vault.base, name),
                "attributes": {
                    "enabled": secret.enabled,
                    "created": 1_700_000_000,
                    "updated": secret.updated,
                }
            })
        })
        .collect();
    let next_link = (skip + PAGE_SIZE < secrets.len()).then(|| {
        format!(
            "{}/secrets?api-version=7.4&skip={}",
            vault.base,
            skip + PAGE_SIZE
        )
    });

    Json(json!({ "value": value, "nextLink": next_link })).into_response()
}

async fn get_secret(
    State(vault): State<MockVault>,
    Path(name): Path<String>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Some(rejection) = check_request(&headers, &query) {
        return rejection;
    }
    let secrets = vault.secrets.lock().await;
    let Some(secret) = secrets.get(&name) else {
        return error_response(
            StatusCode::NOT_FOUND,
            "SecretNotFound",
            format!("A secret with (name/id) {name} was not found in this key vault."),
        );
    };
    if !secret.enabled {
        return error_response(
            StatusCode::FORBIDDEN,
            "Forbidden",
            format!("Operation get is not allowed on a disabled secret: {name}"),
        );
    }

    Json(json!({
        "value": secret.value,
        "id": format!("{}/secrets/{}/abc123", vault.base, name),
        "attributes": {
            "enabled": true,
            "created": 1_700_000_000,
            "updated": secret.updated,
        }
    }))
    .into_response()
}

async fn set_secret(
    State(vault): State<MockVault>,
    Path(name): Path<String>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<SetSecretRequest>,
) -> Response {
    if let Some(rejection) = check_request(&headers, &query) {
        return rejection;
    }
    if let Some(message) = vault.reject_next_set.lock().await.take() {
        return error_response(StatusCode::FORBIDDEN, "Forbidden", message);
    }

    let mut secrets = vault.secrets.lock().await;
    let updated = 1_700_000_100 + i64::try_from(secrets.len()).unwrap();
    secrets.insert(
        name.clone(),
        MockSecret {
            value: body.value.clone(),
            enabled: true,
            updated,
        },
    );

    Json(json!({
        "value": body.value,
        "id": format!("{}/secrets/{}/def456", vault.base, name),
        "attributes": { "enabled": true, "created": updated, "updated": updated }
    }))
    .into_response()
}

/// Start the mock on an ephemeral port
async fn start_mock(seed: &[(&str, &str, bool)]) -> MockVault {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let secrets = seed
        .iter()
        .map(|(name, value, enabled)| {
            (
                (*name).to_string(),
                MockSecret {
                    value: (*value).to_string(),
                    enabled: *enabled,
                    updated: 1_700_000_000,
                },
            )
        })
        .collect();
    let vault = MockVault {
        base,
        secrets: Arc::new(Mutex::new(secrets)),
        reject_next_set: Arc::new(Mutex::new(None)),
    };

    let app = Router::new()
        .route("/secrets", get(list_secrets))
        .route("/secrets/{name}", get(get_secret).put(set_secret))
        .with_state(vault.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    vault
}

fn client(token: &str) -> AzureKeyVault {
    AzureKeyVault::new(Arc::new(StaticTokenCredential::new(token))).unwrap()
}

#[tokio::test]
async fn test_list_follows_next_link() {
    let vault = start_mock(&[
        ("alpha", "1", true),
        ("beta", "2", false),
        ("gamma", "3", true),
        ("delta", "4", true),
        ("epsilon", "5", true),
    ])
    .await;

    let secrets = client(TOKEN).list_secrets(&vault.base).await.unwrap();

    let names: Vec<&str> = secrets.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta", "delta", "epsilon", "gamma"]);
    let beta = secrets.iter().find(|s| s.name == "beta").unwrap();
    assert!(!beta.enabled);
    assert_eq!(beta.updated.unwrap().timestamp(), 1_700_000_000);
}

#[tokio::test]
async fn test_get_returns_value_and_attributes() {
    let vault = start_mock(&[("db-password", "hunter2", true)]).await;

    let detail = client(TOKEN)
        .get_secret(&vault.base, "db-password")
        .await
        .unwrap();

    assert_eq!(detail.name(), "db-password");
    assert!(detail.enabled());
    assert_eq!(detail.value.expose(), "hunter2");
}

#[tokio::test]
async fn test_get_missing_secret_is_not_found() {
    let vault = start_mock(&[]).await;

    let err = client(TOKEN)
        .get_secret(&vault.base, "missing")
        .await
        .unwrap_err();

    assert!(matches!(err, ConsoleError::NotFound { ref name } if name == "missing"));
}

#[tokio::test]
async fn test_service_message_is_passed_through() {
    let vault = start_mock(&[("legacy", "x", false)]).await;

    let err = client(TOKEN)
        .get_secret(&vault.base, "legacy")
        .await
        .unwrap_err();

    assert_eq!(
        err.user_message(),
        "Operation get is not allowed on a disabled secret: legacy"
    );
}

#[tokio::test]
async fn test_bad_token_is_service_error() {
    let vault = start_mock(&[]).await;

    let err = client("wrong").list_secrets(&vault.base).await.unwrap_err();

    assert!(matches!(err, ConsoleError::Service(_)));
    assert!(err.user_message().contains("Bearer"));
}

#[tokio::test]
async fn test_set_creates_new_version() {
    let vault = start_mock(&[("api-key", "old", true)]).await;
    let kv = client(TOKEN);

    let summary = kv
        .set_secret(&vault.base, "api-key", &SecretValue::new("new"))
        .await
        .unwrap();
    assert_eq!(summary.name, "api-key");
    assert!(summary.enabled);

    let detail = kv.get_secret(&vault.base, "api-key").await.unwrap();
    assert_eq!(detail.value.expose(), "new");
}

#[tokio::test]
async fn test_console_round_trip_over_rest() {
    let vault = start_mock(&[("existing", "v", true)]).await;
    let registry = VaultRegistry::from_vaults(vec![VaultRegistration::new("Mock", vault.base.clone())]);
    let mut console = Console::new(Arc::new(client(TOKEN)), registry);
    console.start().await.unwrap();

    console.set_add_form("created", "value");
    console.submit_add_secret().unwrap();
    console.confirm().await.unwrap();

    let names: Vec<&str> = console.secrets().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["created", "existing"]);
}

#[tokio::test]
async fn test_console_keeps_list_when_set_is_rejected() {
    let vault = start_mock(&[("existing", "v", true)]).await;
    *vault.reject_next_set.lock().await =
        Some("The user does not have secrets set permission on key vault".to_string());
    let registry = VaultRegistry::from_vaults(vec![VaultRegistration::new("Mock", vault.base.clone())]);
    let mut console = Console::new(Arc::new(client(TOKEN)), registry);
    console.start().await.unwrap();

    console.set_add_form("created", "value");
    console.submit_add_secret().unwrap();
    assert!(console.confirm().await.is_err());

    assert_eq!(
        console.last_error(),
        Some("The user does not have secrets set permission on key vault")
    );
    assert_eq!(console.secrets().len(), 1);
}
