use crate::classifier::{ Classifier, Intent };
use crate::cli::Args;
use crate::config::replies::{ self, ReplyConfig, ReplyConfigError };
use crate::conversation::{ Clock, ConversationState, SystemClock };

use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// One interactive context with its own conversation log.
pub struct Session {
    pub id: String,
    pub state: ConversationState,
}

/// Holds the current reply table and hands out sessions bound to it.
///
/// Sessions keep the snapshot they were created with; a reload only affects
/// sessions started afterwards.
#[derive(Clone)]
pub struct ChatBot {
    replies: Arc<ReplyConfig>,
    replies_path: Option<PathBuf>,
    clock: Arc<dyn Clock>,
}

impl ChatBot {
    pub fn new(args: &Args) -> Result<Self, ReplyConfigError> {
        let replies_path = args.replies_path
            .as_ref()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let replies = match &replies_path {
            Some(path) => {
                let config = replies::load_replies(path)?;
                info!("Loaded reply table from {}", path.display());
                config
            }
            None => {
                info!("Using built-in reply table");
                ReplyConfig::shared_default()
            }
        };

        Ok(Self { replies, replies_path, clock: Arc::new(SystemClock) })
    }

    pub fn with_replies(replies: Arc<ReplyConfig>) -> Self {
        Self { replies, replies_path: None, clock: Arc::new(SystemClock) }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn classifier(&self) -> Classifier {
        Classifier::new(Arc::clone(&self.replies))
    }

    pub fn classify(&self, text: &str) -> (Intent, String) {
        let intent = Intent::detect(text);
        (intent, self.replies.reply_for(intent).to_string())
    }

    pub fn new_session(&self) -> Session {
        Session {
            id: Uuid::new_v4().to_string(),
            state: ConversationState::with_clock(self.classifier(), Arc::clone(&self.clock)),
        }
    }

    /// Returns `Ok(false)` when there is no replies file or it is unchanged.
    pub fn reload_replies_if_changed(&mut self) -> Result<bool, ReplyConfigError> {
        let Some(path) = &self.replies_path else {
            return Ok(false);
        };
        match replies::reload_replies_if_changed(path, &self.replies)? {
            Some(new_config) => {
                self.replies = new_config;
                info!("Reply table reloaded from {}", path.display());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
