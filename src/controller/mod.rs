mod debounce;

pub(crate) use debounce::Debouncer;

use crate::api::{ApiError, DocumentStore};
use crate::models::{
    CopyFeedback, FormatCommand, InlineStyle, SaveStatus, SelectionState, SessionState,
};
use futures_util::future::LocalBoxFuture;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use thiserror::Error;

pub(crate) const MIN_PASSWORD_LEN: usize = 8;
pub(crate) const COPY_FEEDBACK_MS: i32 = 2000;

const SESSION_EXPIRED_NOTICE: &str =
    "Your editing session might have expired. Please copy any unsaved work and refresh the page.";
const STYLE_FAILED_NOTICE: &str =
    "Could not apply style to the current selection. It might be too complex.";

/// DOM surface the controller drives.
///
/// Everything the page shows or reads back goes through here, so the
/// controller itself never touches `web_sys`.
pub(crate) trait EditorView {
    fn set_content_html(&self, html: &str);
    fn content_html(&self) -> String;
    fn set_editable(&self, editable: bool);
    fn focus_editor(&self);

    fn set_status(&self, status: SaveStatus);
    fn set_toolbar_enabled(&self, enabled: bool);

    fn set_privacy_toggle(&self, checked: bool, enabled: bool);
    fn set_privacy_error(&self, error: Option<String>);

    fn set_password_error(&self, error: Option<String>);
    fn set_password_busy(&self, busy: bool);
    fn hide_password_setup(&self);

    fn set_unlock_error(&self, error: Option<String>);
    fn set_unlock_busy(&self, busy: bool);

    fn set_copy_feedback(&self, feedback: CopyFeedback);

    /// Blocking, user-facing notice (`window.alert` in the browser).
    fn notify(&self, message: &str);

    fn selection(&self) -> SelectionState;
    fn wrap_selection(&self, style: &InlineStyle) -> Result<(), String>;
    fn exec_command(&self, command: FormatCommand);
}

/// Event-loop services: timers, task spawning, clock, navigation, clipboard.
pub(crate) trait Platform {
    fn set_timeout(&self, delay_ms: i32, callback: Box<dyn FnOnce()>) -> Option<i32>;
    fn clear_timeout(&self, handle: i32);
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);

    /// Local wall-clock time for the "Saved ..." status.
    fn now_label(&self) -> String;
    fn page_url(&self) -> Option<String>;
    fn copy_text(&self, text: String) -> LocalBoxFuture<'static, Result<(), String>>;
    fn reload(&self);
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub(crate) enum ActionError {
    #[error("{0}")]
    Validation(String),

    /// The backend answered 2xx but reported `success: false`.
    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Clipboard unavailable: {0}")]
    Clipboard(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SaveOutcome {
    /// Not editable, or another save is still in flight.
    Skipped,
    Saved,
    AccessDenied,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StyleOutcome {
    Ignored,
    NoSelection,
    Applied,
    Cleared,
    Failed,
}

struct Inner<S, V, P> {
    store: S,
    view: V,
    platform: P,
    state: RefCell<SessionState>,
    initial_content: String,
    saving: Cell<bool>,
    autosave: Debouncer,
    copy_reset: Debouncer,
}

/// Clears the in-flight flag however the save future ends.
struct SavingGuard<'a>(&'a Cell<bool>);

impl Drop for SavingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Editor session controller.
///
/// Owns the per-page session state, the autosave debounce and the save
/// in-flight guard. Cheap to clone; all clones share one session.
pub(crate) struct EditorController<S, V, P> {
    inner: Rc<Inner<S, V, P>>,
}

impl<S, V, P> Clone for EditorController<S, V, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S, V, P> EditorController<S, V, P>
where
    S: DocumentStore + 'static,
    V: EditorView + 'static,
    P: Platform + 'static,
{
    pub fn new(
        state: SessionState,
        initial_content: String,
        save_delay_ms: i32,
        store: S,
        view: V,
        platform: P,
    ) -> Self {
        Self {
            inner: Rc::new(Inner {
                store,
                view,
                platform,
                state: RefCell::new(state),
                initial_content,
                saving: Cell::new(false),
                autosave: Debouncer::new(save_delay_ms),
                copy_reset: Debouncer::new(COPY_FEEDBACK_MS),
            }),
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    fn doc_id(&self) -> String {
        self.inner.state.borrow().doc_id.clone()
    }

    pub fn is_editable(&self) -> bool {
        self.inner.state.borrow().editable
    }

    #[cfg(test)]
    pub fn is_saving(&self) -> bool {
        self.inner.saving.get()
    }

    pub fn initialize(&self) {
        let state = self.state();
        let view = &self.inner.view;

        view.set_content_html(&self.inner.initial_content);
        view.set_editable(state.editable);
        view.set_toolbar_enabled(state.editable);
        view.set_privacy_toggle(state.is_private, !state.needs_password_set);
        view.set_status(state.initial_status());

        tracing::info!(
            doc_id = %state.doc_id,
            editable = state.editable,
            read_only = state.read_only,
            needs_password_set = state.needs_password_set,
            "editor initialized"
        );
    }

    /// Input on the content region: mark pending and re-arm the autosave timer.
    pub fn on_content_changed(&self) {
        if !self.is_editable() {
            return;
        }

        self.inner.view.set_status(SaveStatus::Pending);

        let this = self.clone();
        self.inner.autosave.arm(
            &self.inner.platform,
            Box::new(move || {
                this.inner.autosave.fired();
                this.spawn_save();
            }),
        );
        tracing::debug!(delay_ms = self.inner.autosave.delay_ms(), "autosave armed");
    }

    #[cfg(test)]
    pub fn has_pending_save(&self) -> bool {
        self.inner.autosave.is_armed()
    }

    fn spawn_save(&self) {
        let this = self.clone();
        self.inner.platform.spawn(Box::pin(async move {
            this.save().await;
        }));
    }

    pub async fn save(&self) -> SaveOutcome {
        if !self.is_editable() {
            return SaveOutcome::Skipped;
        }
        if self.inner.saving.get() {
            tracing::debug!("save already in flight; dropping trigger");
            return SaveOutcome::Skipped;
        }

        self.inner.saving.set(true);
        let _guard = SavingGuard(&self.inner.saving);

        let view = &self.inner.view;
        view.set_status(SaveStatus::Saving);

        let content = view.content_html();
        let doc_id = self.doc_id();

        match self.inner.store.save(&doc_id, &content).await {
            Ok(resp) if resp.success => {
                view.set_status(SaveStatus::SavedAt(self.inner.platform.now_label()));
                tracing::info!(%doc_id, bytes = content.len(), "document saved");
                SaveOutcome::Saved
            }
            Ok(resp) => {
                view.set_status(SaveStatus::Failed);
                tracing::warn!(%doc_id, message = ?resp.message, "save rejected");
                SaveOutcome::Failed
            }
            Err(ApiError::AccessDenied) => {
                view.set_status(SaveStatus::AccessDenied);
                view.notify(SESSION_EXPIRED_NOTICE);
                tracing::warn!(%doc_id, "save denied");
                SaveOutcome::AccessDenied
            }
            Err(e) => {
                view.set_status(SaveStatus::ConnectionError);
                tracing::error!(%doc_id, error = %e, "save failed");
                SaveOutcome::Failed
            }
        }
    }

    /// Manual save (Ctrl/Cmd+S). Shares the in-flight guard with autosave.
    pub fn save_now(&self) -> bool {
        if !self.is_editable() {
            return false;
        }
        self.inner.view.set_status(SaveStatus::Saving);
        self.spawn_save();
        true
    }

    /// Returns true when the key event was consumed.
    pub fn on_key_down(&self, modifier: bool, key: &str) -> bool {
        if !modifier || !self.is_editable() {
            return false;
        }
        match key {
            "s" | "S" => self.save_now(),
            _ => false,
        }
    }

    pub fn apply_inline_style(&self, style: InlineStyle) -> StyleOutcome {
        if !self.is_editable() {
            return StyleOutcome::Ignored;
        }

        let view = &self.inner.view;
        let selection = view.selection();

        let outcome = if style.is_reset() {
            if selection == SelectionState::None {
                tracing::warn!("no selection to reset style");
                return StyleOutcome::NoSelection;
            }
            // Blunt: also drops bold/italic inside the selection.
            view.exec_command(FormatCommand::RemoveFormat);
            StyleOutcome::Cleared
        } else {
            if selection != SelectionState::Range {
                tracing::warn!(property = %style.property, "select text to apply style");
                return StyleOutcome::NoSelection;
            }
            if let Err(e) = view.wrap_selection(&style) {
                tracing::error!(property = %style.property, error = %e, "applying style failed");
                view.notify(STYLE_FAILED_NOTICE);
                return StyleOutcome::Failed;
            }
            StyleOutcome::Applied
        };

        view.focus_editor();
        self.on_content_changed();
        outcome
    }

    pub fn apply_command(&self, command: FormatCommand) -> bool {
        if !self.is_editable() {
            return false;
        }
        self.inner.view.exec_command(command);
        self.inner.view.focus_editor();
        self.on_content_changed();
        true
    }

    pub async fn set_password(&self, password: &str) -> Result<(), ActionError> {
        let view = &self.inner.view;
        view.set_password_error(None);

        if password.chars().count() < MIN_PASSWORD_LEN {
            let msg = format!("Password must be at least {MIN_PASSWORD_LEN} characters.");
            view.set_password_error(Some(msg.clone()));
            return Err(ActionError::Validation(msg));
        }

        view.set_password_busy(true);
        let doc_id = self.doc_id();
        let result = self.inner.store.set_password(&doc_id, password).await;
        view.set_password_busy(false);

        match result {
            Ok(resp) if resp.success => {
                {
                    let mut state = self.inner.state.borrow_mut();
                    state.needs_password_set = false;
                    state.is_private = true;
                    state.editable = true;
                }

                view.hide_password_setup();
                view.set_editable(true);
                view.set_toolbar_enabled(true);
                view.set_privacy_toggle(true, true);
                view.set_status(SaveStatus::PasswordSet);
                view.focus_editor();

                tracing::info!(%doc_id, "password set; autosave enabled");
                Ok(())
            }
            Ok(resp) => {
                let msg = resp
                    .error
                    .unwrap_or_else(|| "Failed to set password.".to_string());
                view.set_password_error(Some(msg.clone()));
                tracing::warn!(%doc_id, error = %msg, "set password rejected");
                Err(ActionError::Rejected(msg))
            }
            Err(e) => {
                view.set_password_error(Some(user_message(&e, "Failed to set password.")));
                tracing::error!(%doc_id, error = %e, "set password failed");
                Err(e.into())
            }
        }
    }

    /// Returns the privacy flag the backend settled on.
    pub async fn toggle_privacy(&self, desired: bool) -> Result<bool, ActionError> {
        let view = &self.inner.view;
        let (previous, needs_password_set) = {
            let state = self.inner.state.borrow();
            (state.is_private, state.needs_password_set)
        };

        if needs_password_set {
            let msg = "Set a password before changing privacy".to_string();
            view.set_privacy_toggle(previous, false);
            view.set_privacy_error(Some(msg.clone()));
            return Err(ActionError::Validation(msg));
        }

        view.set_privacy_error(None);
        view.set_privacy_toggle(desired, false);

        let doc_id = self.doc_id();
        match self.inner.store.set_privacy(&doc_id, desired).await {
            Ok(resp) => {
                self.inner.state.borrow_mut().is_private = resp.is_private;
                view.set_privacy_toggle(resp.is_private, true);
                tracing::info!(%doc_id, is_private = resp.is_private, "privacy updated");
                Ok(resp.is_private)
            }
            Err(e) => {
                view.set_privacy_toggle(previous, true);
                view.set_privacy_error(Some(user_message(&e, "Failed to update privacy.")));
                tracing::error!(%doc_id, error = %e, "privacy update failed");
                Err(e.into())
            }
        }
    }

    /// Check the password; on success the page reloads into an unlocked session.
    pub async fn unlock(&self, password: &str) -> Result<(), ActionError> {
        let view = &self.inner.view;
        view.set_unlock_error(None);

        if password.is_empty() {
            let msg = "Password required".to_string();
            view.set_unlock_error(Some(msg.clone()));
            return Err(ActionError::Validation(msg));
        }

        view.set_unlock_busy(true);
        let doc_id = self.doc_id();
        let result = self.inner.store.check_password(&doc_id, password).await;

        match result {
            Ok(resp) if resp.success => {
                tracing::info!(%doc_id, "unlocked; reloading");
                self.inner.platform.reload();
                Ok(())
            }
            Ok(resp) => {
                view.set_unlock_busy(false);
                let msg = resp.error.unwrap_or_else(|| "Incorrect password".to_string());
                view.set_unlock_error(Some(msg.clone()));
                Err(ActionError::Rejected(msg))
            }
            Err(e) => {
                view.set_unlock_busy(false);
                view.set_unlock_error(Some(user_message(&e, "Incorrect password")));
                tracing::warn!(%doc_id, error = %e, "unlock failed");
                Err(e.into())
            }
        }
    }

    pub async fn copy_url(&self) -> Result<(), ActionError> {
        let result = match self.inner.platform.page_url() {
            Some(url) => self.inner.platform.copy_text(url).await,
            None => Err("page URL unavailable".to_string()),
        };

        let feedback = if result.is_ok() {
            CopyFeedback::Copied
        } else {
            CopyFeedback::Failed
        };
        self.inner.view.set_copy_feedback(feedback);

        let this = self.clone();
        self.inner.copy_reset.arm(
            &self.inner.platform,
            Box::new(move || {
                this.inner.copy_reset.fired();
                this.inner.view.set_copy_feedback(CopyFeedback::Idle);
            }),
        );

        result.map_err(|e| {
            tracing::warn!(error = %e, "copy URL failed");
            ActionError::Clipboard(e)
        })
    }
}

fn user_message(e: &ApiError, fallback: &str) -> String {
    match e {
        ApiError::Network(_) => "A network error occurred.".to_string(),
        ApiError::AccessDenied => "Access denied. Refresh the page and try again.".to_string(),
        _ => e
            .server_message()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(fallback)
            .to_string(),
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::api::{AckResponse, ApiResult, PrivacyResponse, SaveResponse};
    use crate::models::StyleProperty;
    use tokio::sync::oneshot;

    #[derive(Default)]
    struct FakeStore {
        saved: RefCell<Vec<String>>,
        save_result: RefCell<Option<ApiResult<SaveResponse>>>,
        save_gate: RefCell<Option<oneshot::Receiver<()>>>,
        passwords: RefCell<Vec<String>>,
        password_result: RefCell<Option<ApiResult<AckResponse>>>,
        privacy_calls: RefCell<Vec<bool>>,
        privacy_gate: RefCell<Option<oneshot::Receiver<()>>>,
        privacy_result: RefCell<Option<ApiResult<PrivacyResponse>>>,
        check_result: RefCell<Option<ApiResult<AckResponse>>>,
    }

    impl DocumentStore for Rc<FakeStore> {
        async fn save(&self, _doc_id: &str, content: &str) -> ApiResult<SaveResponse> {
            self.saved.borrow_mut().push(content.to_string());
            let gate = self.save_gate.borrow_mut().take();
            if let Some(rx) = gate {
                let _ = rx.await;
            }
            self.save_result.borrow_mut().take().unwrap_or(Ok(SaveResponse {
                success: true,
                message: Some("Saved".to_string()),
            }))
        }

        async fn set_password(&self, _doc_id: &str, password: &str) -> ApiResult<AckResponse> {
            self.passwords.borrow_mut().push(password.to_string());
            self.password_result.borrow_mut().take().unwrap_or(Ok(AckResponse {
                success: true,
                error: None,
            }))
        }

        async fn set_privacy(&self, _doc_id: &str, is_private: bool) -> ApiResult<PrivacyResponse> {
            self.privacy_calls.borrow_mut().push(is_private);
            let gate = self.privacy_gate.borrow_mut().take();
            if let Some(rx) = gate {
                let _ = rx.await;
            }
            self.privacy_result
                .borrow_mut()
                .take()
                .unwrap_or(Ok(PrivacyResponse {
                    is_private,
                    error: None,
                }))
        }

        async fn check_password(&self, _doc_id: &str, _password: &str) -> ApiResult<AckResponse> {
            self.check_result.borrow_mut().take().unwrap_or(Ok(AckResponse {
                success: true,
                error: None,
            }))
        }
    }

    #[derive(Default)]
    struct FakeView {
        content: RefCell<String>,
        editable: Cell<bool>,
        focused: Cell<usize>,
        statuses: RefCell<Vec<SaveStatus>>,
        toolbar: Cell<bool>,
        privacy: Cell<(bool, bool)>,
        privacy_error: RefCell<Option<String>>,
        password_error: RefCell<Option<String>>,
        password_busy: RefCell<Vec<bool>>,
        setup_hidden: Cell<bool>,
        unlock_error: RefCell<Option<String>>,
        unlock_busy: Cell<bool>,
        copy_feedback: Cell<CopyFeedback>,
        notices: RefCell<Vec<String>>,
        selection: Cell<SelectionState>,
        wrap_fails: Cell<bool>,
        wrapped: RefCell<Vec<InlineStyle>>,
        commands: RefCell<Vec<FormatCommand>>,
    }

    impl FakeView {
        fn status(&self) -> Option<SaveStatus> {
            self.statuses.borrow().last().cloned()
        }
    }

    impl EditorView for Rc<FakeView> {
        fn set_content_html(&self, html: &str) {
            *self.content.borrow_mut() = html.to_string();
        }
        fn content_html(&self) -> String {
            self.content.borrow().clone()
        }
        fn set_editable(&self, editable: bool) {
            self.editable.set(editable);
        }
        fn focus_editor(&self) {
            self.focused.set(self.focused.get() + 1);
        }
        fn set_status(&self, status: SaveStatus) {
            self.statuses.borrow_mut().push(status);
        }
        fn set_toolbar_enabled(&self, enabled: bool) {
            self.toolbar.set(enabled);
        }
        fn set_privacy_toggle(&self, checked: bool, enabled: bool) {
            self.privacy.set((checked, enabled));
        }
        fn set_privacy_error(&self, error: Option<String>) {
            *self.privacy_error.borrow_mut() = error;
        }
        fn set_password_error(&self, error: Option<String>) {
            *self.password_error.borrow_mut() = error;
        }
        fn set_password_busy(&self, busy: bool) {
            self.password_busy.borrow_mut().push(busy);
        }
        fn hide_password_setup(&self) {
            self.setup_hidden.set(true);
        }
        fn set_unlock_error(&self, error: Option<String>) {
            *self.unlock_error.borrow_mut() = error;
        }
        fn set_unlock_busy(&self, busy: bool) {
            self.unlock_busy.set(busy);
        }
        fn set_copy_feedback(&self, feedback: CopyFeedback) {
            self.copy_feedback.set(feedback);
        }
        fn notify(&self, message: &str) {
            self.notices.borrow_mut().push(message.to_string());
        }
        fn selection(&self) -> SelectionState {
            self.selection.get()
        }
        fn wrap_selection(&self, style: &InlineStyle) -> Result<(), String> {
            if self.wrap_fails.get() {
                return Err("HierarchyRequestError".to_string());
            }
            self.wrapped.borrow_mut().push(style.clone());
            Ok(())
        }
        fn exec_command(&self, command: FormatCommand) {
            self.commands.borrow_mut().push(command);
        }
    }

    #[derive(Default)]
    struct FakePlatform {
        next_handle: Cell<i32>,
        timers: RefCell<Vec<(i32, i32, Box<dyn FnOnce()>)>>,
        tasks: RefCell<Vec<LocalBoxFuture<'static, ()>>>,
        reloads: Cell<usize>,
        clipboard: RefCell<Vec<String>>,
        clipboard_fails: Cell<bool>,
    }

    impl FakePlatform {
        fn pending_timers(&self) -> Vec<i32> {
            self.timers.borrow().iter().map(|(_, delay, _)| *delay).collect()
        }

        fn fire_timers(&self) {
            let due = std::mem::take(&mut *self.timers.borrow_mut());
            for (_, _, callback) in due {
                callback();
            }
        }

        async fn run_tasks(&self) {
            loop {
                let tasks = std::mem::take(&mut *self.tasks.borrow_mut());
                if tasks.is_empty() {
                    break;
                }
                for task in tasks {
                    task.await;
                }
            }
        }
    }

    impl Platform for Rc<FakePlatform> {
        fn set_timeout(&self, delay_ms: i32, callback: Box<dyn FnOnce()>) -> Option<i32> {
            let handle = self.next_handle.get() + 1;
            self.next_handle.set(handle);
            self.timers.borrow_mut().push((handle, delay_ms, callback));
            Some(handle)
        }
        fn clear_timeout(&self, handle: i32) {
            self.timers.borrow_mut().retain(|(h, _, _)| *h != handle);
        }
        fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
            self.tasks.borrow_mut().push(task);
        }
        fn now_label(&self) -> String {
            "12:00:00".to_string()
        }
        fn page_url(&self) -> Option<String> {
            Some("https://docs.example/write/abc123".to_string())
        }
        fn copy_text(&self, text: String) -> LocalBoxFuture<'static, Result<(), String>> {
            let result = if self.clipboard_fails.get() {
                Err("NotAllowedError".to_string())
            } else {
                self.clipboard.borrow_mut().push(text);
                Ok(())
            };
            Box::pin(async move { result })
        }
        fn reload(&self) {
            self.reloads.set(self.reloads.get() + 1);
        }
    }

    type TestController = EditorController<Rc<FakeStore>, Rc<FakeView>, Rc<FakePlatform>>;

    struct Harness {
        ctrl: TestController,
        store: Rc<FakeStore>,
        view: Rc<FakeView>,
        platform: Rc<FakePlatform>,
    }

    fn harness(read_only: bool, needs_password_set: bool, is_private: bool) -> Harness {
        let store = Rc::new(FakeStore::default());
        let view = Rc::new(FakeView::default());
        let platform = Rc::new(FakePlatform::default());
        let state = SessionState::new(
            "abc123".to_string(),
            read_only,
            needs_password_set,
            is_private,
        );
        let ctrl = EditorController::new(
            state,
            "<p>draft</p>".to_string(),
            1800,
            store.clone(),
            view.clone(),
            platform.clone(),
        );
        ctrl.initialize();
        Harness {
            ctrl,
            store,
            view,
            platform,
        }
    }

    fn editable() -> Harness {
        harness(false, false, true)
    }

    #[test]
    fn test_initialize_editable_session() {
        let h = editable();
        assert_eq!(*h.view.content.borrow(), "<p>draft</p>");
        assert!(h.view.editable.get());
        assert!(h.view.toolbar.get());
        assert_eq!(h.view.privacy.get(), (true, true));
        assert_eq!(h.view.status(), Some(SaveStatus::Saved));
    }

    #[test]
    fn test_initialize_without_password_disables_editing() {
        let h = harness(false, true, true);
        assert_eq!(*h.view.content.borrow(), "<p>draft</p>");
        assert!(!h.view.editable.get());
        assert!(!h.view.toolbar.get());
        assert_eq!(h.view.privacy.get(), (true, false));
        assert_eq!(h.view.status(), Some(SaveStatus::PasswordRequired));
    }

    #[tokio::test]
    async fn test_edits_while_not_editable_never_schedule_a_save() {
        for h in [harness(true, false, false), harness(false, true, true)] {
            h.ctrl.on_content_changed();
            h.ctrl.on_content_changed();
            assert!(h.platform.pending_timers().is_empty());
            assert!(!h.ctrl.has_pending_save());
            assert_eq!(h.view.statuses.borrow().len(), 1);

            assert_eq!(h.ctrl.save().await, SaveOutcome::Skipped);
            assert!(!h.ctrl.on_key_down(true, "s"));
            h.platform.run_tasks().await;
            assert!(h.store.saved.borrow().is_empty());
        }
    }

    #[tokio::test]
    async fn test_burst_of_edits_saves_once() {
        let h = editable();
        for i in 0..5 {
            h.view.set_content_html(&format!("<p>draft {i}</p>"));
            h.ctrl.on_content_changed();
        }

        assert_eq!(h.platform.pending_timers(), vec![1800]);
        assert_eq!(h.view.status(), Some(SaveStatus::Pending));

        h.platform.fire_timers();
        assert!(!h.ctrl.has_pending_save());
        h.platform.run_tasks().await;

        assert_eq!(*h.store.saved.borrow(), vec!["<p>draft 4</p>".to_string()]);
        assert_eq!(h.view.status(), Some(SaveStatus::SavedAt("12:00:00".to_string())));
        assert!(!h.ctrl.is_saving());
    }

    #[tokio::test]
    async fn test_second_save_is_dropped_while_one_is_in_flight() {
        let h = editable();
        let (release, gate) = oneshot::channel();
        *h.store.save_gate.borrow_mut() = Some(gate);

        let mut first = Box::pin(h.ctrl.save());
        assert!(futures_util::poll!(first.as_mut()).is_pending());
        assert!(h.ctrl.is_saving());

        assert_eq!(h.ctrl.save().await, SaveOutcome::Skipped);
        assert!(h.ctrl.on_key_down(true, "S"));
        h.platform.run_tasks().await;
        assert_eq!(h.store.saved.borrow().len(), 1);

        release.send(()).expect("save is waiting on the gate");
        assert_eq!(first.await, SaveOutcome::Saved);
        assert!(!h.ctrl.is_saving());

        assert_eq!(h.ctrl.save().await, SaveOutcome::Saved);
        assert_eq!(h.store.saved.borrow().len(), 2);
    }

    #[tokio::test]
    async fn test_dropped_save_clears_in_flight_flag() {
        let h = editable();
        let (_release, gate) = oneshot::channel::<()>();
        *h.store.save_gate.borrow_mut() = Some(gate);

        {
            let mut pending = Box::pin(h.ctrl.save());
            assert!(futures_util::poll!(pending.as_mut()).is_pending());
            assert!(h.ctrl.is_saving());
        }
        assert!(!h.ctrl.is_saving());
    }

    #[tokio::test]
    async fn test_manual_save_shortcut() {
        let h = editable();
        assert!(!h.ctrl.on_key_down(false, "s"));
        assert!(!h.ctrl.on_key_down(true, "b"));

        assert!(h.ctrl.on_key_down(true, "s"));
        assert_eq!(h.view.status(), Some(SaveStatus::Saving));
        h.platform.run_tasks().await;

        assert_eq!(h.store.saved.borrow().len(), 1);
        assert_eq!(h.view.status(), Some(SaveStatus::SavedAt("12:00:00".to_string())));
    }

    #[tokio::test]
    async fn test_shortcut_leaves_pending_autosave_armed() {
        let h = editable();
        h.ctrl.on_content_changed();
        assert_eq!(h.platform.pending_timers(), vec![1800]);

        assert!(h.ctrl.on_key_down(true, "s"));
        h.platform.run_tasks().await;
        assert_eq!(h.store.saved.borrow().len(), 1);
        assert_eq!(h.platform.pending_timers(), vec![1800]);
        assert!(h.ctrl.has_pending_save());

        h.platform.fire_timers();
        h.platform.run_tasks().await;
        assert_eq!(h.store.saved.borrow().len(), 2);
        assert!(!h.ctrl.has_pending_save());
    }

    #[tokio::test]
    async fn test_access_denied_keeps_content_and_page() {
        let h = editable();
        h.view.set_content_html("<p>unsaved work</p>");
        *h.store.save_result.borrow_mut() = Some(Err(ApiError::AccessDenied));

        assert_eq!(h.ctrl.save().await, SaveOutcome::AccessDenied);
        assert_eq!(h.view.status(), Some(SaveStatus::AccessDenied));
        assert_eq!(h.view.status().map(|s| s.to_string()).as_deref(), Some("Error: Access denied."));
        assert_eq!(h.view.notices.borrow().len(), 1);
        assert_eq!(*h.view.content.borrow(), "<p>unsaved work</p>");
        assert_eq!(h.platform.reloads.get(), 0);
        assert!(!h.ctrl.is_saving());
        assert!(h.ctrl.is_editable());
    }

    #[tokio::test]
    async fn test_save_failures_are_reported_without_retry() {
        let h = editable();
        *h.store.save_result.borrow_mut() = Some(Err(ApiError::Network("offline".to_string())));
        assert_eq!(h.ctrl.save().await, SaveOutcome::Failed);
        assert_eq!(h.view.status(), Some(SaveStatus::ConnectionError));

        *h.store.save_result.borrow_mut() = Some(Ok(SaveResponse {
            success: false,
            message: None,
        }));
        assert_eq!(h.ctrl.save().await, SaveOutcome::Failed);
        assert_eq!(h.view.status(), Some(SaveStatus::Failed));

        assert!(h.platform.pending_timers().is_empty());
        h.platform.run_tasks().await;
        assert_eq!(h.store.saved.borrow().len(), 2);
    }

    #[test]
    fn test_style_with_collapsed_selection_is_noop() {
        let h = editable();
        h.view.selection.set(SelectionState::Collapsed);

        let outcome = h
            .ctrl
            .apply_inline_style(InlineStyle::new(StyleProperty::FontSize, "18px"));

        assert_eq!(outcome, StyleOutcome::NoSelection);
        assert!(h.view.wrapped.borrow().is_empty());
        assert!(h.view.commands.borrow().is_empty());
        assert!(h.platform.pending_timers().is_empty());
        assert_eq!(h.view.status(), Some(SaveStatus::Saved));
    }

    #[test]
    fn test_style_wraps_selection_and_schedules_save() {
        let h = editable();
        h.view.selection.set(SelectionState::Range);

        let outcome = h
            .ctrl
            .apply_inline_style(InlineStyle::new(StyleProperty::FontFamily, "Georgia"));

        assert_eq!(outcome, StyleOutcome::Applied);
        assert_eq!(
            *h.view.wrapped.borrow(),
            vec![InlineStyle::new(StyleProperty::FontFamily, "Georgia")]
        );
        assert_eq!(h.view.focused.get(), 1);
        assert_eq!(h.platform.pending_timers().len(), 1);
        assert_eq!(h.view.status(), Some(SaveStatus::Pending));
    }

    #[test]
    fn test_style_reset_falls_back_to_remove_format() {
        let h = editable();
        h.view.selection.set(SelectionState::Collapsed);

        let outcome = h
            .ctrl
            .apply_inline_style(InlineStyle::new(StyleProperty::FontSize, ""));

        assert_eq!(outcome, StyleOutcome::Cleared);
        assert_eq!(*h.view.commands.borrow(), vec![FormatCommand::RemoveFormat]);
        assert_eq!(h.platform.pending_timers().len(), 1);
    }

    #[test]
    fn test_style_failure_is_reported() {
        let h = editable();
        h.view.selection.set(SelectionState::Range);
        h.view.wrap_fails.set(true);

        let outcome = h
            .ctrl
            .apply_inline_style(InlineStyle::new(StyleProperty::FontSize, "24px"));

        assert_eq!(outcome, StyleOutcome::Failed);
        assert_eq!(h.view.notices.borrow().len(), 1);
        assert!(h.platform.pending_timers().is_empty());
    }

    #[test]
    fn test_formatting_ignored_when_read_only() {
        let h = harness(true, false, false);
        h.view.selection.set(SelectionState::Range);

        assert_eq!(
            h.ctrl
                .apply_inline_style(InlineStyle::new(StyleProperty::FontSize, "24px")),
            StyleOutcome::Ignored
        );
        assert!(!h.ctrl.apply_command(FormatCommand::Bold));
        assert!(h.view.commands.borrow().is_empty());

        let h = editable();
        assert!(h.ctrl.apply_command(FormatCommand::Italic));
        assert_eq!(*h.view.commands.borrow(), vec![FormatCommand::Italic]);
        assert_eq!(h.platform.pending_timers().len(), 1);
    }

    #[tokio::test]
    async fn test_short_password_rejected_before_network() {
        let h = harness(false, true, true);

        let err = h.ctrl.set_password("short").await.expect_err("too short");
        assert!(matches!(err, ActionError::Validation(_)));
        assert_eq!(
            h.view.password_error.borrow().as_deref(),
            Some("Password must be at least 8 characters.")
        );
        assert!(h.store.passwords.borrow().is_empty());
        assert!(h.view.password_busy.borrow().is_empty());
        assert!(!h.ctrl.is_editable());
    }

    #[tokio::test]
    async fn test_set_password_enables_editing() {
        let h = harness(false, true, false);

        h.ctrl
            .set_password("correct horse")
            .await
            .expect("password accepted");

        assert_eq!(*h.store.passwords.borrow(), vec!["correct horse".to_string()]);
        assert_eq!(*h.view.password_busy.borrow(), vec![true, false]);
        let state = h.ctrl.state();
        assert!(state.editable && state.is_private && !state.needs_password_set);
        assert!(h.view.editable.get());
        assert!(h.view.toolbar.get());
        assert!(h.view.setup_hidden.get());
        assert_eq!(h.view.privacy.get(), (true, true));
        assert_eq!(h.view.status(), Some(SaveStatus::PasswordSet));

        h.ctrl.on_content_changed();
        assert_eq!(h.platform.pending_timers().len(), 1);
    }

    #[tokio::test]
    async fn test_set_password_shows_server_error() {
        let h = harness(false, true, true);
        *h.store.password_result.borrow_mut() = Some(Err(ApiError::Rejected {
            status: 400,
            message: "Password already set".to_string(),
        }));

        assert!(h.ctrl.set_password("12345678").await.is_err());
        assert_eq!(
            h.view.password_error.borrow().as_deref(),
            Some("Password already set")
        );
        assert_eq!(*h.view.password_busy.borrow(), vec![true, false]);
        assert!(!h.ctrl.is_editable());

        *h.store.password_result.borrow_mut() = Some(Err(ApiError::Network("down".to_string())));
        assert!(h.ctrl.set_password("12345678").await.is_err());
        assert_eq!(
            h.view.password_error.borrow().as_deref(),
            Some("A network error occurred.")
        );
    }

    #[tokio::test]
    async fn test_set_password_rejection_without_message_uses_fallback() {
        let h = harness(false, true, true);
        *h.store.password_result.borrow_mut() = Some(Ok(AckResponse {
            success: false,
            error: None,
        }));

        assert_eq!(
            h.ctrl.set_password("12345678").await,
            Err(ActionError::Rejected("Failed to set password.".to_string()))
        );
        assert_eq!(
            h.view.password_error.borrow().as_deref(),
            Some("Failed to set password.")
        );
        assert!(!h.view.setup_hidden.get());
        assert!(!h.ctrl.is_editable());

        *h.store.password_result.borrow_mut() =
            Some(Err(ApiError::Parse("expected value".to_string())));
        assert!(h.ctrl.set_password("12345678").await.is_err());
        assert_eq!(
            h.view.password_error.borrow().as_deref(),
            Some("Failed to set password.")
        );
    }

    #[tokio::test]
    async fn test_privacy_locked_until_password_set() {
        let h = harness(false, true, true);

        let err = h.ctrl.toggle_privacy(false).await.expect_err("no password yet");
        assert!(matches!(err, ActionError::Validation(_)));
        assert!(h.store.privacy_calls.borrow().is_empty());
        assert_eq!(h.view.privacy.get(), (true, false));
    }

    #[tokio::test]
    async fn test_privacy_toggle_success_and_revert() {
        let h = editable();

        assert_eq!(h.ctrl.toggle_privacy(false).await, Ok(false));
        assert!(!h.ctrl.state().is_private);
        assert_eq!(h.view.privacy.get(), (false, true));

        *h.store.privacy_result.borrow_mut() = Some(Err(ApiError::AccessDenied));
        assert!(h.ctrl.toggle_privacy(true).await.is_err());
        assert!(!h.ctrl.state().is_private);
        assert_eq!(h.view.privacy.get(), (false, true));
        assert!(h.view.privacy_error.borrow().is_some());
        assert_eq!(*h.store.privacy_calls.borrow(), vec![false, true]);
    }

    #[tokio::test]
    async fn test_privacy_toggle_disabled_while_in_flight() {
        let h = editable();
        let (release, gate) = oneshot::channel();
        *h.store.privacy_gate.borrow_mut() = Some(gate);

        let mut pending = Box::pin(h.ctrl.toggle_privacy(false));
        assert!(futures_util::poll!(pending.as_mut()).is_pending());
        assert_eq!(h.view.privacy.get(), (false, false));
        assert!(h.ctrl.state().is_private);

        release.send(()).expect("privacy request is waiting on the gate");
        assert_eq!(pending.await, Ok(false));
        assert_eq!(h.view.privacy.get(), (false, true));
    }

    #[tokio::test]
    async fn test_unlock_reloads_on_success() {
        let h = harness(true, false, false);

        h.ctrl.unlock("hunter2hunter2").await.expect("unlocked");
        assert_eq!(h.platform.reloads.get(), 1);
        assert!(h.view.unlock_error.borrow().is_none());
    }

    #[tokio::test]
    async fn test_unlock_failure_shows_error_without_reload() {
        let h = harness(true, false, false);

        assert!(matches!(
            h.ctrl.unlock("").await,
            Err(ActionError::Validation(_))
        ));

        *h.store.check_result.borrow_mut() = Some(Err(ApiError::Rejected {
            status: 401,
            message: "Incorrect password".to_string(),
        }));
        assert!(h.ctrl.unlock("wrong-password").await.is_err());
        assert_eq!(
            h.view.unlock_error.borrow().as_deref(),
            Some("Incorrect password")
        );
        assert!(!h.view.unlock_busy.get());
        assert_eq!(h.platform.reloads.get(), 0);
    }

    #[tokio::test]
    async fn test_unlock_rejection_without_message_uses_fallback() {
        let h = harness(true, false, false);
        *h.store.check_result.borrow_mut() = Some(Ok(AckResponse {
            success: false,
            error: None,
        }));

        assert_eq!(
            h.ctrl.unlock("wrong-password").await,
            Err(ActionError::Rejected("Incorrect password".to_string()))
        );
        assert_eq!(
            h.view.unlock_error.borrow().as_deref(),
            Some("Incorrect password")
        );
        assert!(!h.view.unlock_busy.get());
        assert_eq!(h.platform.reloads.get(), 0);
    }

    #[tokio::test]
    async fn test_copy_url_feedback_resets() {
        let h = harness(true, false, false);

        h.ctrl.copy_url().await.expect("copied");
        assert_eq!(
            *h.platform.clipboard.borrow(),
            vec!["https://docs.example/write/abc123".to_string()]
        );
        assert_eq!(h.view.copy_feedback.get(), CopyFeedback::Copied);
        assert_eq!(h.platform.pending_timers(), vec![COPY_FEEDBACK_MS]);

        h.platform.fire_timers();
        assert_eq!(h.view.copy_feedback.get(), CopyFeedback::Idle);

        h.platform.clipboard_fails.set(true);
        assert!(matches!(
            h.ctrl.copy_url().await,
            Err(ActionError::Clipboard(_))
        ));
        assert_eq!(h.view.copy_feedback.get(), CopyFeedback::Failed);
    }
}
