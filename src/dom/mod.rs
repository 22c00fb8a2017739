use crate::controller::Platform;
use crate::models::{FormatCommand, InlineStyle, SelectionState};
use crate::util::local_time_label;
use futures_util::future::LocalBoxFuture;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

/// `Platform` backed by the browser window and the Leptos task executor.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct BrowserPlatform;

impl Platform for BrowserPlatform {
    fn set_timeout(&self, delay_ms: i32, callback: Box<dyn FnOnce()>) -> Option<i32> {
        let win = web_sys::window()?;
        let cb = Closure::once_into_js(move || callback());
        win.set_timeout_with_callback_and_timeout_and_arguments_0(cb.as_ref().unchecked_ref(), delay_ms)
            .ok()
    }

    fn clear_timeout(&self, handle: i32) {
        if let Some(win) = web_sys::window() {
            win.clear_timeout_with_handle(handle);
        }
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        leptos::task::spawn_local(task);
    }

    fn now_label(&self) -> String {
        local_time_label()
    }

    fn page_url(&self) -> Option<String> {
        web_sys::window().and_then(|w| w.location().href().ok())
    }

    fn copy_text(&self, text: String) -> LocalBoxFuture<'static, Result<(), String>> {
        Box::pin(async move {
            let promise = clipboard_write(&text).map_err(|e| js_error(&e))?;
            JsFuture::from(promise)
                .await
                .map(|_| ())
                .map_err(|e| js_error(&e))
        })
    }

    fn reload(&self) {
        if let Some(win) = web_sys::window() {
            let _ = win.location().reload();
        }
    }
}

/// `navigator.clipboard.writeText(text)`, looked up dynamically since the
/// Clipboard API is missing on insecure origins.
fn clipboard_write(text: &str) -> Result<js_sys::Promise, JsValue> {
    let win = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let clipboard = js_sys::Reflect::get(&win.navigator(), &"clipboard".into())?;
    if clipboard.is_undefined() || clipboard.is_null() {
        return Err(JsValue::from_str("clipboard API unavailable"));
    }
    let write_text: js_sys::Function =
        js_sys::Reflect::get(&clipboard, &"writeText".into())?.dyn_into()?;
    write_text
        .call1(&clipboard, &JsValue::from_str(text))?
        .dyn_into::<js_sys::Promise>()
}

pub(crate) fn js_error(e: &JsValue) -> String {
    e.as_string()
        .or_else(|| {
            e.dyn_ref::<js_sys::Error>()
                .map(|err| String::from(err.message()))
        })
        .unwrap_or_else(|| format!("{e:?}"))
}

/// Current document selection, as seen from inside `root`.
///
/// A selection anchored outside the editable region counts as no selection.
pub(crate) fn selection_state(root: &web_sys::HtmlElement) -> SelectionState {
    let Some(range) = current_range() else {
        return SelectionState::None;
    };

    let inside = range
        .common_ancestor_container()
        .map(|node| root.contains(Some(&node)))
        .unwrap_or(false);
    if !inside {
        return SelectionState::None;
    }

    if range.collapsed() {
        SelectionState::Collapsed
    } else {
        SelectionState::Range
    }
}

fn current_range() -> Option<web_sys::Range> {
    let selection = web_sys::window()?.get_selection().ok().flatten()?;
    if selection.range_count() == 0 {
        return None;
    }
    selection.get_range_at(0).ok()
}

/// Wrap the selected nodes in `<span style="property: value">` and reselect the span.
pub(crate) fn wrap_selection(style: &InlineStyle) -> Result<(), String> {
    let win = web_sys::window().ok_or("no window")?;
    let document = win.document().ok_or("no document")?;
    let selection = win
        .get_selection()
        .map_err(|e| js_error(&e))?
        .ok_or("no selection")?;
    let range = selection.get_range_at(0).map_err(|e| js_error(&e))?;

    let span: web_sys::HtmlElement = document
        .create_element("span")
        .map_err(|e| js_error(&e))?
        .dyn_into()
        .map_err(|_| "span is not an HtmlElement".to_string())?;
    span.style()
        .set_property(style.property.as_ref(), &style.value)
        .map_err(|e| js_error(&e))?;

    // extract/insert rather than surroundContents: the latter throws on partial element selections.
    let fragment = range.extract_contents().map_err(|e| js_error(&e))?;
    span.append_child(&fragment).map_err(|e| js_error(&e))?;
    range.delete_contents().map_err(|e| js_error(&e))?;
    range.insert_node(&span).map_err(|e| js_error(&e))?;

    selection.remove_all_ranges().map_err(|e| js_error(&e))?;
    let reselect = document.create_range().map_err(|e| js_error(&e))?;
    reselect.select_node(&span).map_err(|e| js_error(&e))?;
    selection.add_range(&reselect).map_err(|e| js_error(&e))?;
    Ok(())
}

pub(crate) fn exec_command(command: FormatCommand) {
    let Some(document) = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.dyn_into::<web_sys::HtmlDocument>().ok())
    else {
        return;
    };

    if let Err(e) = document.exec_command(command.as_ref()) {
        tracing::warn!(%command, error = %js_error(&e), "execCommand failed");
    }
}

pub(crate) fn alert(message: &str) {
    if let Some(win) = web_sys::window() {
        let _ = win.alert_with_message(message);
    }
}
