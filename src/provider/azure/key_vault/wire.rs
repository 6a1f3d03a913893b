//! # Key Vault Wire Models
//!
//! JSON shapes of the Key Vault secrets REST API and their conversion into the
//! console's secret models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{SecretDetail, SecretSummary, SecretValue};

/// `attributes` object shared by bundles and list items
/// Timestamps are Unix seconds
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SecretAttributes {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default)]
    pub updated: Option<i64>,
}

/// Response of get and set
#[derive(Debug, Deserialize)]
pub(crate) struct SecretBundle {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub attributes: SecretAttributes,
}

/// One entry of a list page
#[derive(Debug, Deserialize)]
pub(crate) struct SecretItem {
    pub id: String,
    #[serde(default)]
    pub attributes: SecretAttributes,
}

/// One page of a list call
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SecretListResult {
    #[serde(default)]
    pub value: Vec<SecretItem>,
    #[serde(default)]
    pub next_link: Option<String>,
}

/// Request body of set
#[derive(Debug, Serialize)]
pub(crate) struct SetSecretRequest<'a> {
    pub value: &'a str,
}

/// Azure error envelope: `{"error": {"code": "...", "message": "..."}}`
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

fn timestamp(seconds: Option<i64>) -> Option<DateTime<Utc>> {
    seconds.and_then(|s| DateTime::from_timestamp(s, 0))
}

impl SecretAttributes {
    pub fn into_summary(self, name: String) -> SecretSummary {
        SecretSummary {
            name,
            enabled: self.enabled.unwrap_or(false),
            created: timestamp(self.created),
            updated: timestamp(self.updated),
        }
    }
}

impl SecretItem {
    /// Secret name is the last path segment of the item id
    /// (`https://{vault}/secrets/{name}`)
    pub fn name(&self) -> String {
        self.id
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string()
    }

    pub fn into_summary(self) -> SecretSummary {
        let name = self.name();
        self.attributes.into_summary(name)
    }
}

impl SecretBundle {
    pub fn into_detail(self, name: &str) -> SecretDetail {
        SecretDetail {
            summary: self.attributes.into_summary(name.to_string()),
            value: SecretValue::new(self.value.unwrap_or_default()),
        }
    }
}

/// Extract the human-readable message from an Azure error body
pub(crate) fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|response| response.error)
        .and_then(|error| error.message.or(error.code))
}
