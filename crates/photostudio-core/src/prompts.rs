//! Prompt text sent to the image backend.

use crate::styles::Style;

/// Instruction for merging the face of image 1 into the look of image 2.
pub const MERGE_INSTRUCTION: &str =
    "Merge face from image 1 to style of image 2. Preserve identity exactly.";

/// Prompt for the style-menu flow: one user photo, restyled.
pub fn restyle(style: &Style) -> String {
    format!(
        "Re-create the person from this photo as: {}. Preserve facial identity exactly.",
        style.prompt
    )
}

/// Prompt for an edit of the current image.
///
/// Image 1 is the current result, image 2 the reference face.
pub fn edit(instruction: &str) -> String {
    format!(
        "Modify this image: {}. Keep face identical, use image 2 as the identity reference.",
        instruction.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_embeds_trimmed_instruction() {
        let prompt = edit("  make it red \n");
        assert!(prompt.starts_with("Modify this image: make it red."));
        assert!(prompt.contains("image 2"));
    }

    #[test]
    fn restyle_embeds_style_prompt() {
        let style = Style {
            key: "noir".to_string(),
            label: "Noir".to_string(),
            prompt: "film noir portrait".to_string(),
        };
        assert!(restyle(&style).contains("film noir portrait"));
    }
}
