mod clock;

pub use clock::{ Clock, SystemClock };

use crate::classifier::Classifier;
use crate::models::chat::{ ChatMessage, Role };
use log::debug;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    /// A user/assistant pair was appended; `index` is the user message's position.
    Appended {
        index: usize,
    },
    Cleared,
}

/// Called after every mutation with the full message list.
pub type Observer = Box<dyn FnMut(StateChange, &[ChatMessage]) + Send>;

/// The message log of one session.
///
/// Messages are only ever appended in user/assistant pairs, so the length is
/// always even.
pub struct ConversationState {
    messages: Vec<ChatMessage>,
    classifier: Classifier,
    clock: Arc<dyn Clock>,
    observers: Vec<Observer>,
}

impl ConversationState {
    pub fn new(classifier: Classifier) -> Self {
        Self::with_clock(classifier, Arc::new(SystemClock))
    }

    pub fn with_clock(classifier: Classifier, clock: Arc<dyn Clock>) -> Self {
        Self {
            messages: Vec::new(),
            classifier,
            clock,
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn append_exchange(&mut self, user_text: &str) {
        let index = self.messages.len();
        self.messages.push(ChatMessage::new(Role::User, user_text, self.clock.timestamp()));

        let reply = self.classifier.classify(user_text).to_string();
        debug!("Classified {:?} -> {:?}", user_text, reply);
        self.messages.push(ChatMessage::new(Role::Assistant, reply, self.clock.timestamp()));

        self.notify(StateChange::Appended { index });
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.notify(StateChange::Cleared);
    }

    fn notify(&mut self, change: StateChange) {
        for observer in self.observers.iter_mut() {
            observer(change, &self.messages);
        }
    }
}
