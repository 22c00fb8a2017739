use crate::models::SessionState;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use wasm_bindgen::JsValue;

pub(crate) const DEFAULT_SAVE_DELAY_MS: i32 = 1800;
pub(crate) const FALLBACK_API_URL: &str = "http://localhost:5000";
pub(crate) const DEFAULT_LOG_LEVEL: &str = "info";

/// Deployment settings read from `window.ENV`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EnvConfig {
    pub api_url: String,
    pub save_delay_ms: i32,
    pub log_level: String,
}

impl EnvConfig {
    pub fn new() -> Self {
        let origin = web_sys::window().and_then(|w| w.location().origin().ok());

        let env = web_sys::window()
            .and_then(|w| js_sys::Reflect::get(&w, &"ENV".into()).ok())
            .filter(|env| !env.is_undefined() && env.is_object());

        match env {
            Some(env) => Self::from_lookup(
                |key| {
                    js_sys::Reflect::get(&env, &key.into())
                        .ok()
                        .and_then(|v| js_to_json(&v))
                },
                origin,
            ),
            None => Self::from_lookup(|_| None, origin),
        }
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<Value>, origin: Option<String>) -> Self {
        // Both `API_URL` (documented) and `api_url` are accepted.
        let api_url = ["API_URL", "api_url"]
            .iter()
            .find_map(|k| lookup(k).and_then(|v| v.as_str().map(str::to_string)))
            .filter(|s| !s.trim().is_empty())
            .or(origin.filter(|o| o.starts_with("http")))
            .unwrap_or_else(|| FALLBACK_API_URL.to_string());

        let save_delay_ms = lookup("SAVE_DELAY_MS")
            .and_then(|v| match v {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            })
            .filter(|ms| ms.is_finite() && *ms <= i32::MAX as f64)
            .map(|ms| ms.round() as i32)
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_SAVE_DELAY_MS);

        let log_level = lookup("LOG_LEVEL")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Self {
            api_url,
            save_delay_ms,
            log_level,
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Flags the server renders into the page as `window.*` globals.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub(crate) struct PageGlobals {
    pub doc_id: Option<String>,
    pub initial_content: String,
    pub read_only: bool,
    pub needs_password_set: bool,
    pub is_private: bool,
    /// Private document without an unlocked session: only the password prompt is shown.
    pub is_locked: bool,
}

impl PageGlobals {
    pub fn from_window() -> Self {
        let Some(window) = web_sys::window() else {
            return Self::from_lookup(|_| None);
        };
        Self::from_lookup(|key| {
            js_sys::Reflect::get(&window, &key.into())
                .ok()
                .and_then(|v| js_to_json(&v))
        })
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<Value>) -> Self {
        let doc_id = lookup("DOC_ID")
            .and_then(|v| match v {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.trim().is_empty());

        let initial_content = lookup("INITIAL_CONTENT")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();

        // A page that forgets to say whether it is read-only is treated as read-only.
        let read_only = lookup("IS_READ_ONLY").and_then(flag).unwrap_or(true);

        Self {
            doc_id,
            initial_content,
            read_only,
            needs_password_set: lookup("NEEDS_PASSWORD_SET").and_then(flag).unwrap_or(false),
            is_private: lookup("IS_PRIVATE").and_then(flag).unwrap_or(false),
            is_locked: lookup("IS_LOCKED").and_then(flag).unwrap_or(false),
        }
    }

    /// Session for this page. The injected document id wins over the route parameter.
    pub fn session_state(&self, route_doc_id: Option<String>) -> Option<SessionState> {
        let doc_id = self
            .doc_id
            .clone()
            .or(route_doc_id.filter(|s| !s.trim().is_empty()))?;

        Some(SessionState::new(
            doc_id,
            self.read_only,
            self.needs_password_set,
            self.is_private,
        ))
    }
}

fn flag(v: Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn js_to_json(v: &JsValue) -> Option<Value> {
    if v.is_undefined() || v.is_null() {
        None
    } else if let Some(s) = v.as_string() {
        Some(Value::String(s))
    } else if let Some(b) = v.as_bool() {
        Some(Value::Bool(b))
    } else {
        v.as_f64()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
    }
}
