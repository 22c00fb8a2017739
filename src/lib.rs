mod api;
mod app;
mod components;
mod config;
mod controller;
mod dom;
mod logging;
mod models;
mod pages;
mod state;
mod util;

use crate::app::App;
use crate::config::EnvConfig;
use leptos::prelude::*;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use crate::config::{EnvConfig, PageGlobals};
    use crate::util::editor_path;
    use wasm_bindgen::JsValue;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn set_global(key: &str, value: &JsValue) {
        let win = web_sys::window().expect("window");
        js_sys::Reflect::set(&win, &key.into(), value).expect("set global");
    }

    #[wasm_bindgen_test]
    fn test_page_globals_from_window() {
        set_global("DOC_ID", &"abc123".into());
        set_global("INITIAL_CONTENT", &"<p>hi</p>".into());
        set_global("IS_READ_ONLY", &JsValue::FALSE);
        set_global("NEEDS_PASSWORD_SET", &JsValue::TRUE);
        set_global("IS_PRIVATE", &JsValue::TRUE);

        let globals = PageGlobals::from_window();
        assert_eq!(globals.doc_id.as_deref(), Some("abc123"));
        assert_eq!(globals.initial_content, "<p>hi</p>");
        assert!(!globals.read_only);
        assert!(globals.needs_password_set);
        assert!(globals.is_private);

        let session = globals.session_state(None).expect("doc id is injected");
        assert!(!session.editable);
    }

    #[wasm_bindgen_test]
    fn test_env_config_reads_window_env() {
        let env = js_sys::Object::new();
        js_sys::Reflect::set(&env, &"API_URL".into(), &"https://docs.example.com/".into())
            .expect("set API_URL");
        set_global("ENV", &env);

        let config = EnvConfig::new();
        assert_eq!(config.api_url, "https://docs.example.com/");
    }

    #[wasm_bindgen_test]
    fn test_local_time_label_is_not_empty() {
        assert!(!crate::util::local_time_label().is_empty());
        assert_eq!(editor_path("a b"), "/write/a%20b");
    }
}

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();

    let env = EnvConfig::new();
    logging::init_logging(&env.log_level);
    tracing::info!(api_url = %env.api_url, "starting editor");

    mount_to_body(move || view! { <App env /> });
}
