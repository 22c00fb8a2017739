use std::fmt;
use strum::{AsRefStr, Display, EnumString};

/// Per-page editor state.
///
/// Built once from the server-injected page globals and then owned by the
/// controller; nothing here is persisted client-side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SessionState {
    pub doc_id: String,
    pub read_only: bool,
    pub needs_password_set: bool,
    pub is_private: bool,
    pub editable: bool,
}

impl SessionState {
    pub fn new(doc_id: String, read_only: bool, needs_password_set: bool, is_private: bool) -> Self {
        Self {
            doc_id,
            read_only,
            needs_password_set,
            is_private,
            editable: !(read_only || needs_password_set),
        }
    }

    /// Status line shown right after page load.
    pub fn initial_status(&self) -> SaveStatus {
        if self.read_only {
            SaveStatus::ReadOnly
        } else if self.needs_password_set {
            SaveStatus::PasswordRequired
        } else {
            SaveStatus::Saved
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub(crate) enum SaveStatus {
    #[default]
    Saved,
    ReadOnly,
    PasswordRequired,
    Pending,
    Saving,
    SavedAt(String),
    PasswordSet,
    AccessDenied,
    Failed,
    ConnectionError,
}

impl SaveStatus {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            SaveStatus::AccessDenied | SaveStatus::Failed | SaveStatus::ConnectionError
        )
    }
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveStatus::Saved => write!(f, "Saved"),
            SaveStatus::ReadOnly => write!(f, "Read-only"),
            SaveStatus::PasswordRequired => write!(f, "Set password to enable saving"),
            SaveStatus::Pending => write!(f, "Changes detected..."),
            SaveStatus::Saving => write!(f, "Saving..."),
            SaveStatus::SavedAt(at) => write!(f, "Saved {at}"),
            SaveStatus::PasswordSet => write!(f, "Password set. Auto-save enabled."),
            SaveStatus::AccessDenied => write!(f, "Error: Access denied."),
            SaveStatus::Failed => write!(f, "Error saving"),
            SaveStatus::ConnectionError => write!(f, "Connection error"),
        }
    }
}

/// CSS properties the toolbar selects can apply to a selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, AsRefStr, EnumString)]
pub(crate) enum StyleProperty {
    #[strum(serialize = "font-family")]
    FontFamily,
    #[strum(serialize = "font-size")]
    FontSize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct InlineStyle {
    pub property: StyleProperty,
    pub value: String,
}

impl InlineStyle {
    pub fn new(property: StyleProperty, value: impl Into<String>) -> Self {
        Self {
            property,
            value: value.into(),
        }
    }

    /// An empty value is the "Default" entry of a toolbar select.
    pub fn is_reset(&self) -> bool {
        self.value.trim().is_empty()
    }
}

/// Commands handed to `document.execCommand`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, AsRefStr)]
pub(crate) enum FormatCommand {
    #[strum(serialize = "bold")]
    Bold,
    #[strum(serialize = "italic")]
    Italic,
    #[strum(serialize = "removeFormat")]
    RemoveFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub(crate) enum SelectionState {
    #[default]
    None,
    Collapsed,
    Range,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub(crate) enum CopyFeedback {
    #[default]
    Idle,
    Copied,
    Failed,
}

impl CopyFeedback {
    pub fn label(&self) -> &'static str {
        match self {
            CopyFeedback::Idle => "Copy URL",
            CopyFeedback::Copied => "Copied!",
            CopyFeedback::Failed => "Copy failed",
        }
    }
}
