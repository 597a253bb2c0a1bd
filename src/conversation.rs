//! Message sequence assembly

use crate::{ChatMessage, ConversationRequest};

/// Build the sequence sent to the backend: optional system turn, the
/// caller's history in order, then the new user turn exactly once.
pub fn build_messages(
  request: &ConversationRequest
, system_prompt: Option<&str>
) -> Vec<ChatMessage>
{   let mut messages = Vec::with_capacity(request.history.len() + 2);
    if let Some(prompt) = system_prompt
    {   messages.push(ChatMessage::system(prompt));
    }
    messages.extend(request.history.iter().cloned());
    messages.push(ChatMessage::user(request.current_input.clone()));
    messages
}

/// Flatten messages into a plain-text transcript for completion-style
/// models that take a single prompt string.
pub fn render_transcript(messages: &[ChatMessage]) -> String
{   let mut out = String::new();
    for m in messages
    {   if m.content.is_empty() && m.role == crate::Role::System
        {   continue;
        }
        out.push_str(m.role.as_str());
        out.push_str(": ");
        out.push_str(&m.content);
        out.push('\n');
    }
    out.push_str("assistant:");
    out
}
