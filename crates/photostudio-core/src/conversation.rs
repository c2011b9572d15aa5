//! The conversation state machine.
//!
//! Every inbound event is handled against the sender's [`Session`]:
//!
//! ```text
//! face-transfer: Idle → AwaitingReferenceFace → AwaitingStyleReference → Editing ⟲
//! style-menu:    Idle → AwaitingStyleSelection → AwaitingPhotoForStyle → Editing ⟲
//! ```
//!
//! `/start` (or its buttons) resets into the first waiting state from
//! anywhere; cancel and restart reset to `Idle`. A failed generation while
//! creating resets to `Idle`, a failed edit keeps the session in `Editing`
//! with the previous image.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use photostudio_proto::{
    ChatAction, ChatEvent, ChatTransport, ConversationId, EventKind, FileRef, GenerationFailure,
    GenerationRequest, GenerationResult, ImageGenerator, ImagePayload, JPEG_MIME, Keyboard,
    MessageRef, TransportResult,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::StudioResult;
use crate::messages;
use crate::prompts;
use crate::session::{Session, SessionState, Stage};
use crate::store::SessionStore;
use crate::styles::StyleCatalog;

/// Which photoshoot flow `/start` opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowMode {
    /// Own face photo, then a reference photo of the target look.
    #[default]
    FaceTransfer,
    /// A style picked from the catalog, then the user's photo.
    StyleMenu,
}

impl FlowMode {
    pub fn as_str(self) -> &'static str {
        match self {
            FlowMode::FaceTransfer => "face-transfer",
            FlowMode::StyleMenu => "style-menu",
        }
    }
}

impl fmt::Display for FlowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown flow {0:?}: expected face-transfer or style-menu")]
pub struct ParseFlowModeError(String);

impl FromStr for FlowMode {
    type Err = ParseFlowModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "face-transfer" | "face" => Ok(FlowMode::FaceTransfer),
            "style-menu" | "styles" => Ok(FlowMode::StyleMenu),
            _ => Err(ParseFlowModeError(s.to_string())),
        }
    }
}

/// Behavior knobs of the state machine.
#[derive(Debug, Clone, Default)]
pub struct ConversationSettings {
    pub flow: FlowMode,
    pub styles: StyleCatalog,
    /// Mini App URL offered in the welcome menu.
    pub web_app_url: Option<String>,
}

/// Drives sessions through the photoshoot flow.
pub struct Conversation {
    transport: Arc<dyn ChatTransport>,
    generator: Arc<dyn ImageGenerator>,
    store: Arc<SessionStore>,
    settings: ConversationSettings,
}

impl Conversation {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        generator: Arc<dyn ImageGenerator>,
        store: Arc<SessionStore>,
        settings: ConversationSettings,
    ) -> Self {
        Self {
            transport,
            generator,
            store,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn settings(&self) -> &ConversationSettings {
        &self.settings
    }

    /// Handles one event to completion while holding the session.
    ///
    /// Sessions that end up `Idle` are released from the store unless another
    /// handler is already waiting on them.
    pub async fn handle(&self, event: ChatEvent) -> StudioResult<()> {
        let conversation = event.conversation;
        let slot = self.store.open(conversation);
        let mut session = slot.lock().await;

        let before = session.state();
        debug!(chat = %conversation, state = %before, event = event.kind.label(), "Handling event");

        let outcome = self.step(&mut session, event.kind).await;

        let after = session.state();
        if before != after {
            info!(chat = %conversation, from = %before, to = %after, "Session transition");
        }
        if after == SessionState::Idle {
            self.store.release(conversation, &slot);
        }
        outcome
    }

    async fn step(&self, session: &mut Session, kind: EventKind) -> StudioResult<()> {
        match kind {
            EventKind::Command { name, .. } => match name.as_str() {
                "start" => self.start(session, true).await,
                "cancel" => self.cancel(session, None).await,
                _ => {
                    self.transport
                        .send_text(session.conversation(), messages::HELP, Keyboard::None)
                        .await?;
                    Ok(())
                }
            },
            EventKind::ButtonPress { key, message } => self.on_button(session, &key, message).await,
            EventKind::Text(text) if messages::is_start_text(&text) => {
                self.start(session, false).await
            }
            other => self.on_input(session, other).await,
        }
    }

    async fn on_button(
        &self,
        session: &mut Session,
        key: &str,
        message: Option<MessageRef>,
    ) -> StudioResult<()> {
        match key {
            messages::CANCEL_KEY | messages::RESTART_KEY => self.cancel(session, message).await,
            messages::START_FLOW_KEY => self.start(session, false).await,
            _ => match key.strip_prefix(messages::STYLE_KEY_PREFIX) {
                Some(style) => self.select_style(session, style).await,
                None => {
                    debug!(chat = %session.conversation(), key, "Ignoring unknown button");
                    Ok(())
                }
            },
        }
    }

    /// Resets the session and opens the first waiting state of the flow.
    async fn start(&self, session: &mut Session, welcome: bool) -> StudioResult<()> {
        let to = session.conversation();
        info!(chat = %to, flow = %self.settings.flow, "Starting photoshoot");

        match self.settings.flow {
            FlowMode::FaceTransfer => session.begin(Stage::AwaitingReferenceFace),
            FlowMode::StyleMenu => session.begin(Stage::AwaitingStyleSelection),
        }

        if welcome {
            let menu = messages::main_menu(self.settings.web_app_url.as_deref());
            self.transport.send_text(to, messages::WELCOME, menu).await?;
        }

        match self.settings.flow {
            FlowMode::FaceTransfer => {
                self.transport
                    .send_text(to, messages::STEP_FACE, messages::cancel_keyboard())
                    .await?;
            }
            FlowMode::StyleMenu => {
                self.transport
                    .send_text(
                        to,
                        messages::STEP_STYLE_MENU,
                        messages::style_menu(&self.settings.styles),
                    )
                    .await?;
            }
        }
        Ok(())
    }

    async fn cancel(&self, session: &mut Session, message: Option<MessageRef>) -> StudioResult<()> {
        let to = session.conversation();
        session.reset();
        if let Some(message) = message {
            best_effort(self.transport.delete(to, message).await, to, "delete prompt");
        }
        self.transport
            .send_text(to, messages::STOPPED, messages::start_keyboard())
            .await?;
        Ok(())
    }

    async fn select_style(&self, session: &mut Session, key: &str) -> StudioResult<()> {
        let to = session.conversation();
        if session.state() != SessionState::AwaitingStyleSelection {
            debug!(chat = %to, state = %session.state(), style = key, "Ignoring style outside selection");
            return Ok(());
        }

        let Some(style) = self.settings.styles.get(key) else {
            warn!(chat = %to, style = key, "Unknown style key");
            self.transport
                .send_text(
                    to,
                    messages::UNKNOWN_STYLE,
                    messages::style_menu(&self.settings.styles),
                )
                .await?;
            return Ok(());
        };

        session.advance(Stage::AwaitingPhotoForStyle {
            style: style.key.clone(),
        });
        self.transport
            .send_text(
                to,
                &messages::style_selected(&style.label),
                messages::cancel_keyboard(),
            )
            .await?;
        Ok(())
    }

    async fn on_input(&self, session: &mut Session, kind: EventKind) -> StudioResult<()> {
        let to = session.conversation();
        match session.state() {
            SessionState::Idle => {
                self.transport
                    .send_text(to, messages::IDLE_HINT, messages::start_keyboard())
                    .await?;
            }
            SessionState::AwaitingStyleSelection => {
                self.transport
                    .send_text(
                        to,
                        messages::NEED_STYLE_CHOICE,
                        messages::style_menu(&self.settings.styles),
                    )
                    .await?;
            }
            SessionState::AwaitingReferenceFace => {
                if let Some(face) = self.receive_image(to, &kind, messages::NEED_FACE_IMAGE).await? {
                    session.advance(Stage::AwaitingStyleReference { face });
                    self.transport
                        .send_text(to, messages::FACE_SAVED, messages::cancel_keyboard())
                        .await?;
                }
            }
            SessionState::AwaitingStyleReference => {
                if let Some(look) = self.receive_image(to, &kind, messages::NEED_STYLE_IMAGE).await? {
                    self.create_from_reference(session, look).await?;
                }
            }
            SessionState::AwaitingPhotoForStyle => {
                if let Some(photo) = self
                    .receive_image(to, &kind, messages::NEED_PORTRAIT_IMAGE)
                    .await?
                {
                    self.create_from_style(session, photo).await?;
                }
            }
            SessionState::Editing => match kind {
                EventKind::Text(instruction) => self.apply_edit(session, &instruction).await?,
                _ => {
                    self.transport
                        .send_text(to, messages::NEED_EDIT_TEXT, messages::editing_keyboard())
                        .await?;
                }
            },
        }
        Ok(())
    }

    /// Extracts an image from the event, re-prompting when there is none.
    ///
    /// Returns `None` after re-prompting; the caller must not transition.
    async fn receive_image(
        &self,
        to: ConversationId,
        kind: &EventKind,
        reprompt: &str,
    ) -> StudioResult<Option<ImagePayload>> {
        let Some((mime_type, file)) = image_attachment(kind) else {
            self.transport
                .send_text(to, reprompt, messages::cancel_keyboard())
                .await?;
            return Ok(None);
        };

        match self.transport.download(file).await {
            Ok(data) if !data.is_empty() => Ok(Some(ImagePayload::new(mime_type, data))),
            Ok(_) => {
                warn!(chat = %to, "Downloaded attachment is empty");
                self.transport
                    .send_text(to, reprompt, messages::cancel_keyboard())
                    .await?;
                Ok(None)
            }
            Err(e) => {
                warn!(chat = %to, error = %e, "Attachment download failed");
                self.transport
                    .send_text(to, messages::DOWNLOAD_FAILED, messages::cancel_keyboard())
                    .await?;
                Ok(None)
            }
        }
    }

    async fn create_from_reference(
        &self,
        session: &mut Session,
        look: ImagePayload,
    ) -> StudioResult<()> {
        let Stage::AwaitingStyleReference { face } = session.stage().clone() else {
            return Ok(());
        };
        let request =
            GenerationRequest::new(prompts::MERGE_INSTRUCTION, vec![face.clone(), look]);
        self.create(session, request, face, None).await
    }

    async fn create_from_style(
        &self,
        session: &mut Session,
        photo: ImagePayload,
    ) -> StudioResult<()> {
        let Stage::AwaitingPhotoForStyle { style } = session.stage().clone() else {
            return Ok(());
        };
        let Some(entry) = self.settings.styles.get(&style) else {
            // Only reachable if the catalog changed under a running session.
            warn!(chat = %session.conversation(), style = %style, "Selected style vanished");
            let failure = GenerationFailure::BackendError(format!("unknown style {style}"));
            return self.fail_creation(session, None, &failure).await;
        };
        let request = GenerationRequest::new(prompts::restyle(entry), vec![photo.clone()]);
        self.create(session, request, photo, Some(style)).await
    }

    /// Runs the first generation. Success enters `Editing`, failure resets to `Idle`.
    async fn create(
        &self,
        session: &mut Session,
        request: GenerationRequest,
        face: ImagePayload,
        style: Option<String>,
    ) -> StudioResult<()> {
        let to = session.conversation();
        let transport = &self.transport;

        let status = best_effort(
            transport
                .send_text(to, messages::PROGRESS_ANALYZING, Keyboard::None)
                .await,
            to,
            "send status",
        );
        best_effort(
            transport.send_action(to, ChatAction::UploadPhoto).await,
            to,
            "send chat action",
        );
        if let Some(status) = status {
            best_effort(
                transport
                    .edit_text(to, status, messages::PROGRESS_STYLING, Keyboard::None)
                    .await,
                to,
                "edit status",
            );
        }

        let image = match self.generate(to, &request).await {
            Ok(image) => image,
            Err(failure) => return self.fail_creation(session, status, &failure).await,
        };

        if let Some(status) = status {
            best_effort(
                transport
                    .edit_text(to, status, messages::PROGRESS_RETOUCH, Keyboard::None)
                    .await,
                to,
                "edit status",
            );
        }

        session.advance(Stage::Editing {
            face,
            current: image.clone(),
            style,
        });
        if let Some(started) = session.started_at() {
            let elapsed = chrono::Utc::now().signed_duration_since(started);
            info!(chat = %to, elapsed_secs = elapsed.num_seconds(), "Portrait created");
        }

        if let Some(status) = status {
            best_effort(transport.delete(to, status).await, to, "delete status");
        }
        transport
            .send_photo(
                to,
                image.data,
                messages::CREATED_CAPTION,
                messages::editing_keyboard(),
            )
            .await?;
        Ok(())
    }

    async fn fail_creation(
        &self,
        session: &mut Session,
        status: Option<MessageRef>,
        failure: &GenerationFailure,
    ) -> StudioResult<()> {
        let to = session.conversation();
        session.reset();
        if let Some(status) = status {
            best_effort(self.transport.delete(to, status).await, to, "delete status");
        }
        self.transport
            .send_text(
                to,
                messages::creation_failure(failure),
                messages::start_keyboard(),
            )
            .await?;
        Ok(())
    }

    /// Applies a text edit. The session stays in `Editing` either way.
    async fn apply_edit(&self, session: &mut Session, instruction: &str) -> StudioResult<()> {
        let to = session.conversation();
        let (face, current) = match session.stage() {
            Stage::Editing { face, current, .. } => (face.clone(), current.clone()),
            _ => return Ok(()),
        };

        let status = best_effort(
            self.transport
                .send_text(to, &messages::edit_progress(instruction), Keyboard::None)
                .await,
            to,
            "send status",
        );
        best_effort(
            self.transport.send_action(to, ChatAction::Typing).await,
            to,
            "send chat action",
        );

        let request = GenerationRequest::new(prompts::edit(instruction), vec![current, face]);
        match self.generate(to, &request).await {
            Ok(image) => {
                session.replace_current(image.clone());
                if let Some(status) = status {
                    best_effort(self.transport.delete(to, status).await, to, "delete status");
                }
                self.transport
                    .send_photo(
                        to,
                        image.data,
                        messages::EDITED_CAPTION,
                        messages::editing_keyboard(),
                    )
                    .await?;
            }
            Err(failure) => {
                let notice = messages::edit_failure(&failure);
                let edited = match status {
                    Some(status) => best_effort(
                        self.transport
                            .edit_text(to, status, notice, messages::editing_keyboard())
                            .await,
                        to,
                        "edit status",
                    ),
                    None => None,
                };
                if edited.is_none() {
                    self.transport
                        .send_text(to, notice, messages::editing_keyboard())
                        .await?;
                }
            }
        }
        Ok(())
    }

    /// Calls the generator, treating an empty image as no image.
    async fn generate(&self, to: ConversationId, request: &GenerationRequest) -> GenerationResult {
        let started = Instant::now();
        let result = match self.generator.generate(request).await {
            Ok(image) if image.is_empty() => Err(GenerationFailure::NoImageReturned),
            other => other,
        };
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match &result {
            Ok(image) => {
                info!(chat = %to, bytes = image.len(), elapsed_ms, "Generation succeeded");
            }
            Err(failure) => {
                warn!(chat = %to, error = %failure, elapsed_ms, "Generation failed");
            }
        }
        result
    }
}

/// The image carried by a photo or an image-typed document.
fn image_attachment(kind: &EventKind) -> Option<(&str, &FileRef)> {
    match kind {
        EventKind::Photo(file) => Some((JPEG_MIME, file)),
        EventKind::Document {
            mime_type: Some(mime),
            file,
        } if mime.starts_with("image/") => Some((mime.as_str(), file)),
        _ => None,
    }
}

/// Logs a failed cosmetic send and carries on.
fn best_effort<T>(result: TransportResult<T>, to: ConversationId, what: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(chat = %to, error = %e, "Failed to {what}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flow_mode_parses_aliases() {
        assert_eq!("face-transfer".parse::<FlowMode>().unwrap(), FlowMode::FaceTransfer);
        assert_eq!("STYLE_MENU".parse::<FlowMode>().unwrap(), FlowMode::StyleMenu);
        assert_eq!("styles".parse::<FlowMode>().unwrap(), FlowMode::StyleMenu);
        assert!("video".parse::<FlowMode>().is_err());
    }

    #[test]
    fn flow_mode_display_round_trips() {
        for mode in [FlowMode::FaceTransfer, FlowMode::StyleMenu] {
            assert_eq!(mode.to_string().parse::<FlowMode>().unwrap(), mode);
        }
    }

    #[test]
    fn image_attachment_accepts_photos_and_image_documents() {
        let photo = EventKind::Photo(FileRef("p".to_string()));
        assert_eq!(image_attachment(&photo).unwrap().0, JPEG_MIME);

        let png = EventKind::Document {
            mime_type: Some("image/png".to_string()),
            file: FileRef("d".to_string()),
        };
        assert_eq!(image_attachment(&png).unwrap().0, "image/png");
    }

    #[test]
    fn image_attachment_rejects_other_payloads() {
        let pdf = EventKind::Document {
            mime_type: Some("application/pdf".to_string()),
            file: FileRef("d".to_string()),
        };
        let untyped = EventKind::Document {
            mime_type: None,
            file: FileRef("d".to_string()),
        };
        assert!(image_attachment(&pdf).is_none());
        assert!(image_attachment(&untyped).is_none());
        assert!(image_attachment(&EventKind::Text("hi".to_string())).is_none());
    }
}
