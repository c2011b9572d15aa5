use std::fmt;

use chrono::{DateTime, Utc};
use photostudio_proto::{ConversationId, ImagePayload};

/// The named states of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    AwaitingReferenceFace,
    AwaitingStyleReference,
    AwaitingStyleSelection,
    AwaitingPhotoForStyle,
    Editing,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::AwaitingReferenceFace => "awaiting_reference_face",
            SessionState::AwaitingStyleReference => "awaiting_style_reference",
            SessionState::AwaitingStyleSelection => "awaiting_style_selection",
            SessionState::AwaitingPhotoForStyle => "awaiting_photo_for_style",
            SessionState::Editing => "editing",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a conversation stands, together with the data valid at that point.
///
/// `Idle` carries nothing and `Editing` always carries the current image,
/// so a reset can never leave data behind and editing can never run without
/// an image to edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Stage {
    #[default]
    Idle,
    AwaitingReferenceFace,
    AwaitingStyleReference {
        face: ImagePayload,
    },
    AwaitingStyleSelection,
    AwaitingPhotoForStyle {
        style: String,
    },
    Editing {
        face: ImagePayload,
        current: ImagePayload,
        style: Option<String>,
    },
}

impl Stage {
    pub fn state(&self) -> SessionState {
        match self {
            Stage::Idle => SessionState::Idle,
            Stage::AwaitingReferenceFace => SessionState::AwaitingReferenceFace,
            Stage::AwaitingStyleReference { .. } => SessionState::AwaitingStyleReference,
            Stage::AwaitingStyleSelection => SessionState::AwaitingStyleSelection,
            Stage::AwaitingPhotoForStyle { .. } => SessionState::AwaitingPhotoForStyle,
            Stage::Editing { .. } => SessionState::Editing,
        }
    }
}

/// Transient data for one conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    conversation: ConversationId,
    stage: Stage,
    started_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(conversation: ConversationId) -> Self {
        Self {
            conversation,
            stage: Stage::Idle,
            started_at: None,
        }
    }

    pub fn conversation(&self) -> ConversationId {
        self.conversation
    }

    pub fn state(&self) -> SessionState {
        self.stage.state()
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// When the current photoshoot was started, if one is running.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn reference_face_image(&self) -> Option<&ImagePayload> {
        match &self.stage {
            Stage::AwaitingStyleReference { face } | Stage::Editing { face, .. } => Some(face),
            _ => None,
        }
    }

    pub fn current_image(&self) -> Option<&ImagePayload> {
        match &self.stage {
            Stage::Editing { current, .. } => Some(current),
            _ => None,
        }
    }

    pub fn selected_style(&self) -> Option<&str> {
        match &self.stage {
            Stage::AwaitingPhotoForStyle { style } => Some(style),
            Stage::Editing {
                style: Some(style), ..
            } => Some(style),
            _ => None,
        }
    }

    /// Drops every piece of user data and returns to `Idle`.
    pub fn reset(&mut self) {
        self.stage = Stage::Idle;
        self.started_at = None;
    }

    /// Starts a fresh photoshoot at `stage`, discarding any previous data.
    pub(crate) fn begin(&mut self, stage: Stage) {
        self.reset();
        self.stage = stage;
        self.started_at = Some(Utc::now());
    }

    /// Moves to `stage` within the running photoshoot.
    pub(crate) fn advance(&mut self, stage: Stage) {
        if matches!(stage, Stage::Idle) {
            self.reset();
        } else {
            self.stage = stage;
        }
    }

    /// Swaps the edited image. Returns `false` outside `Editing`.
    pub(crate) fn replace_current(&mut self, image: ImagePayload) -> bool {
        match &mut self.stage {
            Stage::Editing { current, .. } => {
                *current = image;
                true
            }
            _ => false,
        }
    }
}
