use crate::api::ApiClient;
use crate::config::{EnvConfig, PageGlobals};
use crate::controller::{EditorController, EditorView};
use crate::dom::{self, BrowserPlatform};
use crate::models::{CopyFeedback, FormatCommand, InlineStyle, SaveStatus, SelectionState};
use leptos::html;
use leptos::prelude::*;

#[derive(Clone)]
pub(crate) struct AppState {
    pub api_client: ApiClient,
    pub env: EnvConfig,

    /// Server-injected flags for the current page.
    pub globals: PageGlobals,
}

impl AppState {
    pub fn new(env: EnvConfig) -> Self {
        Self {
            api_client: ApiClient::from_env(&env),
            globals: PageGlobals::from_window(),
            env,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(EnvConfig::new())
    }
}

#[derive(Clone)]
pub(crate) struct AppContext(pub AppState);

pub(crate) type PageController = EditorController<ApiClient, EditorSignals, BrowserPlatform>;

/// Reactive UI state of the editor page; the `EditorView` the controller drives.
#[derive(Clone, Copy)]
pub(crate) struct EditorSignals {
    pub content_ref: NodeRef<html::Div>,
    pub editable: RwSignal<bool>,
    pub status: RwSignal<SaveStatus>,
    pub toolbar_enabled: RwSignal<bool>,

    pub privacy_checked: RwSignal<bool>,
    pub privacy_enabled: RwSignal<bool>,
    pub privacy_error: RwSignal<Option<String>>,

    pub password_setup_visible: RwSignal<bool>,
    pub password_error: RwSignal<Option<String>>,
    pub password_busy: RwSignal<bool>,

    pub unlock_error: RwSignal<Option<String>>,
    pub unlock_busy: RwSignal<bool>,

    pub copy_feedback: RwSignal<CopyFeedback>,
}

impl EditorSignals {
    pub fn new(needs_password_set: bool) -> Self {
        Self {
            content_ref: NodeRef::new(),
            editable: RwSignal::new(false),
            status: RwSignal::new(SaveStatus::default()),
            toolbar_enabled: RwSignal::new(false),
            privacy_checked: RwSignal::new(false),
            privacy_enabled: RwSignal::new(false),
            privacy_error: RwSignal::new(None),
            password_setup_visible: RwSignal::new(needs_password_set),
            password_error: RwSignal::new(None),
            password_busy: RwSignal::new(false),
            unlock_error: RwSignal::new(None),
            unlock_busy: RwSignal::new(false),
            copy_feedback: RwSignal::new(CopyFeedback::Idle),
        }
    }
}

impl EditorView for EditorSignals {
    fn set_content_html(&self, html: &str) {
        if let Some(el) = self.content_ref.get_untracked() {
            el.set_inner_html(html);
        }
    }

    fn content_html(&self) -> String {
        self.content_ref
            .get_untracked()
            .map(|el| el.inner_html())
            .unwrap_or_default()
    }

    fn set_editable(&self, editable: bool) {
        self.editable.set(editable);
    }

    fn focus_editor(&self) {
        if let Some(el) = self.content_ref.get_untracked() {
            let _ = el.focus();
        }
    }

    fn set_status(&self, status: SaveStatus) {
        self.status.set(status);
    }

    fn set_toolbar_enabled(&self, enabled: bool) {
        self.toolbar_enabled.set(enabled);
    }

    fn set_privacy_toggle(&self, checked: bool, enabled: bool) {
        self.privacy_checked.set(checked);
        self.privacy_enabled.set(enabled);
    }

    fn set_privacy_error(&self, error: Option<String>) {
        self.privacy_error.set(error);
    }

    fn set_password_error(&self, error: Option<String>) {
        self.password_error.set(error);
    }

    fn set_password_busy(&self, busy: bool) {
        self.password_busy.set(busy);
    }

    fn hide_password_setup(&self) {
        self.password_setup_visible.set(false);
    }

    fn set_unlock_error(&self, error: Option<String>) {
        self.unlock_error.set(error);
    }

    fn set_unlock_busy(&self, busy: bool) {
        self.unlock_busy.set(busy);
    }

    fn set_copy_feedback(&self, feedback: CopyFeedback) {
        self.copy_feedback.set(feedback);
    }

    fn notify(&self, message: &str) {
        dom::alert(message);
    }

    fn selection(&self) -> SelectionState {
        self.content_ref
            .get_untracked()
            .map(|el| dom::selection_state(&el))
            .unwrap_or_default()
    }

    fn wrap_selection(&self, style: &InlineStyle) -> Result<(), String> {
        dom::wrap_selection(style)
    }

    fn exec_command(&self, command: FormatCommand) {
        dom::exec_command(command);
    }
}
