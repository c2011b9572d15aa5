//! User-facing texts, button keys and keyboards.

use photostudio_proto::{Button, GenerationFailure, Keyboard};

use crate::styles::StyleCatalog;

/// Button key: start the in-chat flow from the welcome menu.
pub const START_FLOW_KEY: &str = "start_chat_flow";
/// Button key: abort photo collection.
pub const CANCEL_KEY: &str = "cancel_action";
/// Button key: drop the current result and start over.
pub const RESTART_KEY: &str = "restart_action";
/// Prefix of style selection button keys (`style:<key>`).
pub const STYLE_KEY_PREFIX: &str = "style:";

/// Reply-keyboard text that starts a photoshoot.
pub const START_TEXT: &str = "🚀 Start photoshoot";

pub const WELCOME: &str = "👋 Welcome to the AI photo studio!\n\n\
    I can put your face into any look. Use the Mini App for convenience or talk to me right here.";
pub const HELP: &str = "/start — begin a new photoshoot\n\
    /cancel — stop and clear your photos\n\
    /help — this message\n\n\
    While editing, describe a change in plain text, e.g. \"make the background a beach\".";

pub const STEP_FACE: &str = "📸 Step 1: send me YOUR photo (face close-up).";
pub const FACE_SAVED: &str = "✅ Face saved!\n\nStep 2: now send a reference photo (the look).";
pub const STEP_STYLE_MENU: &str = "🎨 Step 1: pick a style.";
pub const UNKNOWN_STYLE: &str = "That style is not available any more. Pick one from the list.";

pub const NEED_FACE_IMAGE: &str = "Please send an image.";
pub const NEED_STYLE_IMAGE: &str = "I need a photo of the look you want.";
pub const NEED_PORTRAIT_IMAGE: &str = "Please send your photo as an image.";
pub const NEED_STYLE_CHOICE: &str = "Pick a style using the buttons first.";
pub const NEED_EDIT_TEXT: &str = "Describe the change you want in text, or start over.";
pub const DOWNLOAD_FAILED: &str = "I couldn't download that image. Please send it again.";
pub const IDLE_HINT: &str = "Tap \"🚀 Start photoshoot\" or send /start to begin.";

pub const PROGRESS_ANALYZING: &str = "🔍 [1/3] Analyzing facial features...";
pub const PROGRESS_STYLING: &str = "🎨 [2/3] Applying style and light...";
pub const PROGRESS_RETOUCH: &str = "📸 [3/3] Final retouch...";

pub const CREATED_CAPTION: &str = "✨ Done! Describe an edit in text or tap the button below.";
pub const EDITED_CAPTION: &str = "✅ Changed! Anything else?";

pub const STOPPED: &str = "Process stopped. Start again?";

pub fn style_selected(label: &str) -> String {
    format!("✅ Style: {label}\n\nStep 2: now send your photo (face close-up).")
}

pub fn edit_progress(instruction: &str) -> String {
    format!("🔧 Applying edit: '{}'...", instruction.trim())
}

/// Notice for a failed generation during the creation phase.
pub fn creation_failure(failure: &GenerationFailure) -> &'static str {
    match failure {
        GenerationFailure::NoImageReturned => {
            "❌ The AI couldn't create the photo (possibly because of safety filters)."
        }
        GenerationFailure::RegionRestricted => {
            "❌ Error: the generation service is unavailable in your region without a proxy."
        }
        GenerationFailure::ModelNotFound => "❌ Error: model not found. Check the API settings.",
        GenerationFailure::BackendError(_) => "❌ Technical API error.",
    }
}

/// Notice for a failed edit. The result so far is kept.
pub fn edit_failure(failure: &GenerationFailure) -> &'static str {
    match failure {
        GenerationFailure::NoImageReturned => "❌ Couldn't apply the edit.",
        GenerationFailure::RegionRestricted => {
            "❌ Error: the generation service is unavailable in your region without a proxy."
        }
        GenerationFailure::ModelNotFound => "❌ Error: model not found. Check the API settings.",
        GenerationFailure::BackendError(_) => "❌ Error while editing.",
    }
}

/// Whether free text is the start button of the reply keyboard.
pub fn is_start_text(text: &str) -> bool {
    text.trim() == START_TEXT
}

/// Welcome menu: Mini App (when configured) plus the in-chat entry.
pub fn main_menu(web_app_url: Option<&str>) -> Keyboard {
    let mut rows = Vec::new();
    if let Some(url) = web_app_url {
        rows.push(vec![Button::web_app("🎨 Open the photo studio (Mini App)", url)]);
    }
    rows.push(vec![Button::callback("🚀 Start in chat", START_FLOW_KEY)]);
    Keyboard::Inline(rows)
}

pub fn start_keyboard() -> Keyboard {
    Keyboard::Reply(vec![vec![START_TEXT.to_string()]])
}

pub fn cancel_keyboard() -> Keyboard {
    Keyboard::inline_row(vec![Button::callback("❌ Cancel", CANCEL_KEY)])
}

pub fn editing_keyboard() -> Keyboard {
    Keyboard::inline_row(vec![Button::callback("🔄 Start over", RESTART_KEY)])
}

/// Two styles per row, then a cancel row.
pub fn style_menu(catalog: &StyleCatalog) -> Keyboard {
    let buttons: Vec<Button> = catalog
        .iter()
        .map(|style| Button::callback(&style.label, format!("{STYLE_KEY_PREFIX}{}", style.key)))
        .collect();
    let mut rows: Vec<Vec<Button>> = buttons.chunks(2).map(<[Button]>::to_vec).collect();
    rows.push(vec![Button::callback("❌ Cancel", CANCEL_KEY)]);
    Keyboard::Inline(rows)
}
