use chat_provider::{PromptMessage, Role};
use chat_store::Message;

/// Builds the ordered message list for one turn: the system prompt when it is
/// non-blank, then every non-system history entry, then the new user turn.
///
/// `history` must not already contain `new_user`; the controller passes the
/// log as it stood before the turn's own append.
pub fn build_prompt(system_prompt: &str, history: &[Message], new_user: &str) -> Vec<PromptMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);

    if !system_prompt.trim().is_empty() {
        messages.push(PromptMessage::system(system_prompt));
    }

    messages.extend(
        history
            .iter()
            .filter(|message| message.role != Role::System)
            .map(Message::to_prompt),
    );

    messages.push(PromptMessage::user(new_user));
    messages
}

#[cfg(test)]
mod tests {
    use chat_provider::{PromptMessage, Role};
    use chat_store::Message;

    use super::build_prompt;

    fn message(role: Role, content: &str) -> Message {
        Message::new(role, content, "2026-02-14T00:00:00Z")
    }

    #[test]
    fn stray_system_history_entries_are_dropped() {
        let history = vec![
            message(Role::User, "a"),
            message(Role::Assistant, "b"),
            message(Role::System, "x"),
        ];

        assert_eq!(
            build_prompt("S", &history, "c"),
            vec![
                PromptMessage::system("S"),
                PromptMessage::user("a"),
                PromptMessage::assistant("b"),
                PromptMessage::user("c"),
            ]
        );
    }

    #[test]
    fn blank_system_prompt_is_omitted() {
        assert_eq!(
            build_prompt("  \n", &[], "hi"),
            vec![PromptMessage::user("hi")]
        );
    }

    #[test]
    fn system_prompt_is_forwarded_verbatim() {
        let prompt = build_prompt("  Be brief.\n", &[], "hi");
        assert_eq!(prompt[0].content, "  Be brief.\n");
    }
}
