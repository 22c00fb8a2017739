use crate::config::EnvConfig;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub(crate) enum ApiError {
    /// 403 from the backend: the editing session is not (or no longer) unlocked.
    #[error("Access denied")]
    AccessDenied,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request failed ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid response: {0}")]
    Parse(String),
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        Self::Parse(e.to_string())
    }

    /// Non-2xx, non-403 response. The backend reports failures as `{"error": "..."}`;
    /// fall back to the raw body, then to the status reason.
    fn rejected(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .or_else(|| {
                let trimmed = body.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());

        Self::Rejected {
            status: status.as_u16(),
            message,
        }
    }

    /// Message the backend attached to a rejection, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { message, .. } => Some(message.as_str()),
            _ => None,
        }
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct SaveRequest {
    pub content: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub(crate) struct SaveResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct PasswordRequest {
    pub password: String,
}

/// `{success, error?}` shape shared by set_password and check_password.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub(crate) struct AckResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct PrivacyRequest {
    pub is_private: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub(crate) struct PrivacyResponse {
    pub is_private: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct NewDocumentResponse {
    pub doc_id: String,
}

/// Remote document store the editor controller talks to.
pub(crate) trait DocumentStore {
    async fn save(&self, doc_id: &str, content: &str) -> ApiResult<SaveResponse>;

    async fn set_password(&self, doc_id: &str, password: &str) -> ApiResult<AckResponse>;

    async fn set_privacy(&self, doc_id: &str, is_private: bool) -> ApiResult<PrivacyResponse>;

    async fn check_password(&self, doc_id: &str, password: &str) -> ApiResult<AckResponse>;
}

#[derive(Clone, Debug)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_env(env: &EnvConfig) -> Self {
        Self::new(env.api_url.clone())
    }

    pub(crate) fn document_path(endpoint: &str, doc_id: &str) -> String {
        format!("/api/{}/{}", endpoint, urlencoding::encode(doc_id))
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_api<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> ApiResult<T> {
        let client = reqwest::Client::new();
        let url = self.url(path);
        tracing::debug!(%url, "POST");

        let res = client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(ApiError::network)?;

        let status = res.status();
        if status.is_success() {
            res.json().await.map_err(ApiError::parse)
        } else if status == StatusCode::FORBIDDEN {
            Err(ApiError::AccessDenied)
        } else {
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::rejected(status, &body))
        }
    }

    /// Create an empty document; the backend unlocks it for this session.
    pub async fn create_document(&self) -> ApiResult<NewDocumentResponse> {
        self.post_api("/new", &serde_json::json!({})).await
    }
}

impl DocumentStore for ApiClient {
    async fn save(&self, doc_id: &str, content: &str) -> ApiResult<SaveResponse> {
        self.post_api(
            &Self::document_path("save", doc_id),
            &SaveRequest {
                content: content.to_string(),
            },
        )
        .await
    }

    async fn set_password(&self, doc_id: &str, password: &str) -> ApiResult<AckResponse> {
        self.post_api(
            &Self::document_path("set_password", doc_id),
            &PasswordRequest {
                password: password.to_string(),
            },
        )
        .await
    }

    async fn set_privacy(&self, doc_id: &str, is_private: bool) -> ApiResult<PrivacyResponse> {
        self.post_api(
            &Self::document_path("set_privacy", doc_id),
            &PrivacyRequest { is_private },
        )
        .await
    }

    async fn check_password(&self, doc_id: &str, password: &str) -> ApiResult<AckResponse> {
        self.post_api(
            &Self::document_path("check_password", doc_id),
            &PasswordRequest {
                password: password.to_string(),
            },
        )
        .await
    }
}
