use crate::models::chat::ChatMessage;

pub const TITLE: &str = "AgChat";

pub const CHAT_TIPS: &[&str] = &[
    "\"Hello\" or \"Hi\"",
    "\"How are you?\"",
    "\"What can you do?\"",
    "\"Help\"",
    "\"Bye\"",
];

pub fn render_message(message: &ChatMessage) -> String {
    format!("{} [{}]: {}", message.role.label(), message.timestamp, message.content)
}

/// Full transcript, title first, one line per message.
pub fn render_transcript(messages: &[ChatMessage]) -> String {
    let mut out = String::from(TITLE);
    out.push('\n');
    for message in messages {
        out.push_str(&render_message(message));
        out.push('\n');
    }
    out
}

pub fn render_tips() -> String {
    let mut out = String::from("Try asking me:\n");
    for tip in CHAT_TIPS {
        out.push_str("- ");
        out.push_str(tip);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::Role;

    #[test]
    fn transcript_lists_messages_in_order() {
        let messages = vec![
            ChatMessage::new(Role::User, "hi", "08:15"),
            ChatMessage::new(Role::Assistant, "Hello! How can I help you?", "08:15")
        ];
        assert_eq!(
            render_transcript(&messages),
            "AgChat\nYou [08:15]: hi\nChatBot [08:15]: Hello! How can I help you?\n"
        );
    }

    #[test]
    fn empty_transcript_is_just_the_title() {
        assert_eq!(render_transcript(&[]), "AgChat\n");
    }

    #[test]
    fn tips_are_bulleted() {
        let tips = render_tips();
        assert!(tips.starts_with("Try asking me:\n"));
        assert_eq!(tips.lines().filter(|l| l.starts_with("- ")).count(), CHAT_TIPS.len());
    }
}
