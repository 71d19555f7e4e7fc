//! Keyword intent classification.
//!
//! Rules are checked in order against the lowercased, trimmed input and the
//! first rule with a matching substring wins. Matching is deliberately not
//! word-aware: "hiding" contains "hi" and is a greeting.

use crate::config::replies::ReplyConfig;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

const GREETING_KEYWORDS: &[&str] = &["hello", "hi", "hey"];
const WELLBEING_KEYWORDS: &[&str] = &["how are you"];
const CAPABILITY_KEYWORDS: &[&str] = &["what can you do", "help"];
const FAREWELL_KEYWORDS: &[&str] = &["bye", "goodbye"];
const GRATITUDE_KEYWORDS: &[&str] = &["thanks", "thank you"];

const RULES: &[(&[&str], Intent)] = &[
    (GREETING_KEYWORDS, Intent::Greeting),
    (WELLBEING_KEYWORDS, Intent::Wellbeing),
    (CAPABILITY_KEYWORDS, Intent::Capability),
    (FAREWELL_KEYWORDS, Intent::Farewell),
    (GRATITUDE_KEYWORDS, Intent::Gratitude),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Greeting,
    Wellbeing,
    Capability,
    Farewell,
    Gratitude,
    Fallback,
}

impl Intent {
    pub const ALL: [Intent; 6] = [
        Intent::Greeting,
        Intent::Wellbeing,
        Intent::Capability,
        Intent::Farewell,
        Intent::Gratitude,
        Intent::Fallback,
    ];

    pub fn detect(text: &str) -> Intent {
        let normalized = text.to_lowercase();
        let normalized = normalized.trim();

        RULES.iter()
            .find(|(keywords, _)| keywords.iter().any(|k| normalized.contains(k)))
            .map(|(_, intent)| *intent)
            .unwrap_or(Intent::Fallback)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Greeting => "greeting",
            Intent::Wellbeing => "wellbeing",
            Intent::Capability => "capability",
            Intent::Farewell => "farewell",
            Intent::Gratitude => "gratitude",
            Intent::Fallback => "fallback",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps text to a canned reply from a reply table snapshot.
#[derive(Debug, Clone)]
pub struct Classifier {
    replies: Arc<ReplyConfig>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(ReplyConfig::shared_default())
    }
}

impl Classifier {
    pub fn new(replies: Arc<ReplyConfig>) -> Self {
        Self { replies }
    }

    pub fn classify(&self, text: &str) -> &str {
        self.replies.reply_for(Intent::detect(text))
    }
}

/// Classifies against the built-in reply table.
pub fn classify(text: &str) -> String {
    Classifier::default().classify(text).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::replies::{
        CAPABILITY_REPLY,
        FAREWELL_REPLY,
        GRATITUDE_REPLY,
        GREETING_REPLY,
        WELLBEING_REPLY,
    };

    #[test]
    fn greeting_keywords_match_case_insensitively() {
        for text in ["hello", "Hi there", "HEY!", "well, HeLLo you", "oh hi"] {
            assert_eq!(classify(text), GREETING_REPLY, "input: {text}");
        }
    }

    #[test]
    fn substring_match_is_not_word_aware() {
        assert_eq!(classify("hiding from you"), GREETING_REPLY);
        assert_eq!(Intent::detect("which one"), Intent::Greeting);
    }

    #[test]
    fn wellbeing_question() {
        assert_eq!(classify("How are you?"), WELLBEING_REPLY);
    }

    #[test]
    fn capability_and_help_share_the_default_reply() {
        assert_eq!(classify("WHAT CAN YOU DO"), CAPABILITY_REPLY);
        assert_eq!(classify("help"), CAPABILITY_REPLY);
        assert_eq!(classify("help"), classify("xyzzy"));
    }

    #[test]
    fn farewell_and_gratitude() {
        assert_eq!(classify("bye now"), FAREWELL_REPLY);
        assert_eq!(classify("Goodbye"), FAREWELL_REPLY);
        assert_eq!(classify("thanks a lot"), GRATITUDE_REPLY);
        assert_eq!(classify("Thank you!"), GRATITUDE_REPLY);
    }

    #[test]
    fn empty_and_blank_input_fall_through() {
        assert_eq!(Intent::detect(""), Intent::Fallback);
        assert_eq!(Intent::detect("   \t\n"), Intent::Fallback);
        assert_eq!(classify(""), CAPABILITY_REPLY);
    }

    #[test]
    fn earlier_rules_take_priority() {
        assert_eq!(Intent::detect("help me say goodbye"), Intent::Capability);
        assert_eq!(Intent::detect("hey, how are you"), Intent::Greeting);
        assert_eq!(Intent::detect("how are you? bye"), Intent::Wellbeing);
        assert_eq!(Intent::detect("bye and thanks"), Intent::Farewell);
    }

    #[test]
    fn classification_is_deterministic() {
        let classifier = Classifier::default();
        for text in ["hello", "", "random words", "thank you"] {
            assert_eq!(classifier.classify(text), classifier.classify(text));
        }
    }

    #[test]
    fn custom_table_is_used() {
        let replies = ReplyConfig {
            greeting: "Howdy!".into(),
            ..ReplyConfig::default()
        };
        let classifier = Classifier::new(Arc::new(replies));
        assert_eq!(classifier.classify("hey"), "Howdy!");
        assert_eq!(classifier.classify("bye"), FAREWELL_REPLY);
    }
}
