static ENHANCE_TEMPLATE: &str = include_str!("../prompts/enhance.txt");

static OVERLAY_DIRECTIVE: &str =
    "The image must incorporate the exact text '{title}' as a prominent part of its visual design.";

/// Instructions sent to the text model when prompt enhancement is on.
pub fn enhancement_instructions(title: &str, description: &str, with_overlay: bool) -> String {
    let mut instructions = ENHANCE_TEMPLATE
        .replace("{title}", title)
        .replace("{description}", description);
    if with_overlay {
        instructions.push('\n');
        instructions.push_str(&OVERLAY_DIRECTIVE.replace("{title}", title));
    }
    instructions
}

/// Prompt used verbatim when enhancement is off.
pub fn direct_prompt(title: &str, description: &str, with_overlay: bool) -> String {
    let mut prompt = format!("{}, {}", title, description);
    if with_overlay {
        prompt.push_str(&format!(" Text overlay: '{}'", title));
    }
    prompt
}
