/// What a button does when pressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    /// Delivered back as [`crate::EventKind::ButtonPress`] with this key.
    Callback(String),
    /// Opens an embedded web app at this URL.
    WebApp(String),
}

/// A single inline button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: ButtonAction,
}

impl Button {
    pub fn callback(label: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Callback(key.into()),
        }
    }

    pub fn web_app(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::WebApp(url.into()),
        }
    }
}

/// Affordances attached to an outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Keyboard {
    /// Leave whatever the client currently shows.
    #[default]
    None,
    /// Buttons attached to the message itself, one `Vec` per row.
    Inline(Vec<Vec<Button>>),
    /// A persistent keyboard of canned text replies, one `Vec` per row.
    Reply(Vec<Vec<String>>),
}

impl Keyboard {
    /// Single-row inline keyboard.
    pub fn inline_row(buttons: Vec<Button>) -> Self {
        Keyboard::Inline(vec![buttons])
    }

    /// Returns the callback keys of all inline buttons.
    pub fn callback_keys(&self) -> Vec<&str> {
        match self {
            Keyboard::Inline(rows) => rows
                .iter()
                .flatten()
                .filter_map(|b| match &b.action {
                    ButtonAction::Callback(key) => Some(key.as_str()),
                    ButtonAction::WebApp(_) => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}
