//! Prompt composition for both passes of a turn.

use conductor_adapters::{MessageRole, PromptMessage};
use conductor_primitives::{truncate_chars, ToolOutcome};
use conductor_session::{Message, Role};

/// Behavioural guidance prepended to every system prompt.
const BEHAVIOUR_GUIDE: &str = "You are a helpful assistant with access to the tools listed \
below. Use a tool whenever it would make the answer more accurate or current. If no tool \
helps, answer directly.";

/// Wire-format guide the model follows to request a tool.
const WIRE_FORMAT_GUIDE: &str = "To call a tool, emit a fenced block exactly like this, one \
block per call:\n```json\n{\"tool\": \"<name>\", \"params\": {\"<param>\": <value>}}\n```\n\
You may emit several blocks in one reply; they run in the order written.";

/// Instruction added to the second pass.
const NO_MORE_TOOLS: &str = "Do not request any more tools in this turn. Answer the user \
directly using the results above; if a tool failed, explain the failure instead of retrying.";

const RESULTS_TRUNCATION_MARKER: &str = "\n…[tool results truncated]";

/// Renders the full system prompt for the current catalog.
pub(crate) fn system_prompt(catalog: &str) -> String {
    format!("{BEHAVIOUR_GUIDE}\n\nAvailable tools:\n{catalog}\n\n{WIRE_FORMAT_GUIDE}")
}

/// Builds the first-pass message list: system, trimmed history, new message.
pub(crate) fn first_messages(
    system: &str,
    history: &[Message],
    user_message: &str,
) -> Vec<PromptMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(PromptMessage::new(MessageRole::System, system));
    for entry in history {
        let role = match entry.role() {
            Role::User => MessageRole::User,
            Role::Assistant => MessageRole::Assistant,
        };
        messages.push(PromptMessage::new(role, entry.content()));
    }
    messages.push(PromptMessage::new(MessageRole::User, user_message));
    messages
}

/// Builds the second-pass message list: the first pass, the model's tool
/// choice, and the serialized results with the no-more-tools instruction.
pub(crate) fn second_messages(
    first: Vec<PromptMessage>,
    assistant_text: &str,
    results_text: &str,
) -> Vec<PromptMessage> {
    let mut messages = first;
    messages.push(PromptMessage::new(MessageRole::Assistant, assistant_text));
    messages.push(PromptMessage::new(
        MessageRole::User,
        format!("{results_text}\n\n{NO_MORE_TOOLS}"),
    ));
    messages
}

/// Serializes labeled tool results into one text payload.
///
/// Failed results are summarized up front so the model explains them rather
/// than re-invoking tools; the whole payload is capped at `budget_chars`.
pub(crate) fn results_payload(labeled: &[(String, ToolOutcome)], budget_chars: usize) -> String {
    let mut out = String::new();

    let failures: Vec<&(String, ToolOutcome)> = labeled
        .iter()
        .filter(|(_, outcome)| !outcome.success())
        .collect();
    if !failures.is_empty() {
        out.push_str("Some tool calls failed; explain these failures to the user:\n");
        for (label, outcome) in failures {
            let reason = outcome.error().unwrap_or("no detail");
            out.push_str(&format!("- {label}: {reason}\n"));
        }
        out.push('\n');
    }

    out.push_str("Tool results:\n");
    for (label, outcome) in labeled {
        let encoded = serde_json::to_string(outcome).unwrap_or_else(|_| String::new());
        out.push_str(&format!("{label}: {encoded}\n"));
    }

    truncate_chars(&out, budget_chars, RESULTS_TRUNCATION_MARKER)
}
