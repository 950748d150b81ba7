//! Prompt rendering.

use crate::types::{Prompt, RenderedPrompt};
use docqa_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Instruction block sent with every question.
pub const GROUNDING_INSTRUCTIONS: &str = "\
You are a helpful assistant that answers questions using only the document excerpts below.
- Answer only from the provided excerpts. Do not use outside or general knowledge.
- Cite the source document name for each fact you use, e.g. (From: report.txt).
- If the excerpts do not contain the answer, say explicitly: \"I could not find this information in the provided documents.\"
- Be concise and accurate.";

/// Context block used when retrieval found nothing usable.
pub const NO_EXCERPTS_NOTICE: &str = "\
No relevant excerpts were found in the loaded documents for this question. \
Reply that the information could not be found in the provided documents.";

const SYSTEM_TEMPLATE: &str = "{{instructions}}\n\nDocument excerpts:\n\n{{context}}";
const USER_TEMPLATE: &str = "{{question}}";

/// Render a prompt into system and user messages.
///
/// # Example
/// ```
/// use docqa_prompt::{render_prompt, Prompt, GROUNDING_INSTRUCTIONS};
///
/// let prompt = Prompt {
///     instructions: GROUNDING_INSTRUCTIONS.to_string(),
///     context_block: "[From: alpha.txt]\nAlpha discusses profit margins.".to_string(),
///     question: "What affects profit?".to_string(),
///     citations: vec![],
/// };
/// let rendered = render_prompt(&prompt).unwrap();
/// assert!(rendered.system.contains("[From: alpha.txt]"));
/// assert_eq!(rendered.user, "What affects profit?");
/// ```
pub fn render_prompt(prompt: &Prompt) -> AppResult<RenderedPrompt> {
    let mut handlebars = Handlebars::new();

    // Plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.set_strict_mode(true);

    handlebars
        .register_template_string("system", SYSTEM_TEMPLATE)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;
    handlebars
        .register_template_string("user", USER_TEMPLATE)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let mut variables = HashMap::new();
    variables.insert("instructions", prompt.instructions.as_str());
    variables.insert("context", prompt.context_block.as_str());
    variables.insert("question", prompt.question.as_str());

    let system = handlebars
        .render("system", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;
    let user = handlebars
        .render("user", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    tracing::debug!(
        "Rendered prompt: {} system chars, {} user chars",
        system.chars().count(),
        user.chars().count()
    );

    Ok(RenderedPrompt { system, user })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(context: &str, question: &str) -> Prompt {
        Prompt {
            instructions: GROUNDING_INSTRUCTIONS.to_string(),
            context_block: context.to_string(),
            question: question.to_string(),
            citations: vec![],
        }
    }

    #[test]
    fn test_instructions_carry_grounding_contract() {
        assert!(GROUNDING_INSTRUCTIONS.contains("only from the provided excerpts"));
        assert!(GROUNDING_INSTRUCTIONS.contains("Cite the source document name"));
        assert!(GROUNDING_INSTRUCTIONS.contains("could not find this information"));
    }

    #[test]
    fn test_render_does_not_escape_or_interpret_text() {
        let rendered = prompt(
            "[From: q&a.txt]\nRevenue < costs means \"loss\". {{not a template}}",
            "Is <profit> > 0 & why?",
        );
        let rendered = render_prompt(&rendered).unwrap();

        assert!(rendered.system.starts_with("You are a helpful assistant"));
        assert!(rendered
            .system
            .contains("[From: q&a.txt]\nRevenue < costs means \"loss\". {{not a template}}"));
        assert_eq!(rendered.user, "Is <profit> > 0 & why?");
    }

    #[test]
    fn test_no_excerpts_prompt_still_asks_for_not_found() {
        let rendered = render_prompt(&prompt(NO_EXCERPTS_NOTICE, "Who won?")).unwrap();
        assert!(rendered.system.contains("No relevant excerpts were found"));
        assert!(rendered.system.contains("could not find this information"));
    }
}
