//! Prompt templates for the two generation modes.

use crate::llm::{GenerateRequest, GenerationConfig};

/// Substituted for an empty client message.
pub const NO_CLIENT_MESSAGE: &str = "(no client message provided)";

const KEY_CHECK_PROMPT: &str = "Reply with OK.";

fn client_message_or_placeholder(client_message: &str) -> &str {
    if client_message.trim().is_empty() {
        NO_CLIENT_MESSAGE
    } else {
        client_message
    }
}

/// Prompt text for single-answer mode.
pub fn answer_prompt_text(client_message: &str, short_answer: &str) -> String {
    format!(
        r#"You are helping a freelancer reply to a client. Rewrite the freelancer's short answer into a complete, professional reply to the client's message.

Client's message:
"""
{client}
"""

Freelancer's short answer:
"""
{short}
"""

Requirements:
- Sound natural and human, like the freelancer wrote it themselves. Never robotic or overly formal.
- Keep every fact and commitment from the short answer; do not invent new ones.
- Write in plain text only. No markdown, no bullet points, no bold or italics.
- Use flowing paragraphs, as in a normal chat message.
- Do not add a greeting or a closing/sign-off.

Reply with the finished message only."#,
        client = client_message_or_placeholder(client_message),
        short = short_answer,
    )
}

/// Prompt text for three-suggestion mode.
pub fn suggestions_prompt_text(client_message: &str) -> String {
    format!(
        r#"You are helping a freelancer reply to a client. Read the client's message and propose three different short replies the freelancer could send.

Client's message:
"""
{client}
"""

Requirements:
- Give exactly 3 suggestions.
- Each suggestion is 1-2 sentences, natural and professional, in plain text without markdown.
- Format each suggestion on its own line, starting with its number, a period and a space, like:
1. First suggestion
2. Second suggestion
3. Third suggestion
- Output nothing else: no introduction, no notes, no blank commentary."#,
        client = client_message_or_placeholder(client_message),
    )
}

/// Build the single-answer request.
pub fn build_answer_prompt(
    client_message: &str,
    short_answer: &str,
    config: GenerationConfig,
) -> GenerateRequest {
    GenerateRequest::new(answer_prompt_text(client_message, short_answer), config)
}

/// Build the suggestions request.
pub fn build_suggestions_prompt(client_message: &str, config: GenerationConfig) -> GenerateRequest {
    GenerateRequest::new(suggestions_prompt_text(client_message), config)
}

/// Minimal request used to check that a credential works.
pub fn build_key_check_request() -> GenerateRequest {
    GenerateRequest::new(KEY_CHECK_PROMPT, GenerationConfig::KEY_CHECK)
}
