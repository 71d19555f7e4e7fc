use serde::{ Serialize, Deserialize };
use crate::models::chat::ChatMessage;

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "chat")] Chat {
        content: String,
    },
    #[serde(rename = "clear")]
    Clear,
    #[serde(rename = "tips")]
    Tips,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "state")] State {
        conversation_id: String,
        messages: Vec<ChatMessage>,
    },
    #[serde(rename = "tips")] Tips {
        tips: Vec<String>,
    },
    #[serde(rename = "error")] Error {
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_client_frames() {
        let chat: ClientMessage = serde_json::from_str(r#"{"type":"chat","content":"hi"}"#).unwrap();
        assert!(matches!(chat, ClientMessage::Chat { ref content } if content == "hi"));

        let clear: ClientMessage = serde_json::from_str(r#"{"type":"clear"}"#).unwrap();
        assert!(matches!(clear, ClientMessage::Clear));
    }

    #[test]
    fn rejects_unknown_frame_type() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"history"}"#).is_err());
    }

    #[test]
    fn state_frame_carries_type_tag() {
        let msg = ServerMessage::State {
            conversation_id: "abc".into(),
            messages: Vec::new(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "state");
        assert_eq!(json["conversation_id"], "abc");
        assert!(json["messages"].as_array().unwrap().is_empty());
    }
}
