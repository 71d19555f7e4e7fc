use crate::classifier::Intent;
use lazy_static::lazy_static;
use log::info;
use serde::Deserialize;
use std::fs;
use std::path::{ Path, PathBuf };
use std::sync::Arc;
use std::time::SystemTime;
use thiserror::Error;

pub const GREETING_REPLY: &str = "Hello! How can I help you?";
pub const WELLBEING_REPLY: &str = "I'm doing well, thanks for asking!";
pub const CAPABILITY_REPLY: &str =
    "I'm a simple chatbot. I can respond to basic greetings and questions.";
pub const FAREWELL_REPLY: &str = "Goodbye! Have a great day!";
pub const GRATITUDE_REPLY: &str = "You're welcome!";

lazy_static! {
    static ref DEFAULT_REPLIES: Arc<ReplyConfig> = Arc::new(ReplyConfig::default());
}

#[derive(Debug, Error)]
pub enum ReplyConfigError {
    #[error("Failed to read replies file '{}': {source}", path.display())] Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse replies file '{}': {source}", path.display())] Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Reply for intent '{0}' is empty")] EmptyReply(Intent),
}

#[derive(Deserialize, Debug)]
struct ReplyFile {
    greeting: Option<String>,
    wellbeing: Option<String>,
    capability: Option<String>,
    farewell: Option<String>,
    gratitude: Option<String>,
    fallback: Option<String>,
}

/// The canned reply table, one entry per intent.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyConfig {
    pub greeting: String,
    pub wellbeing: String,
    pub capability: String,
    pub farewell: String,
    pub gratitude: String,
    pub fallback: String,
    pub last_loaded: Option<SystemTime>,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            greeting: GREETING_REPLY.to_string(),
            wellbeing: WELLBEING_REPLY.to_string(),
            capability: CAPABILITY_REPLY.to_string(),
            farewell: FAREWELL_REPLY.to_string(),
            gratitude: GRATITUDE_REPLY.to_string(),
            fallback: CAPABILITY_REPLY.to_string(),
            last_loaded: None,
        }
    }
}

impl ReplyConfig {
    pub fn shared_default() -> Arc<ReplyConfig> {
        Arc::clone(&DEFAULT_REPLIES)
    }

    pub fn reply_for(&self, intent: Intent) -> &str {
        match intent {
            Intent::Greeting => &self.greeting,
            Intent::Wellbeing => &self.wellbeing,
            Intent::Capability => &self.capability,
            Intent::Farewell => &self.farewell,
            Intent::Gratitude => &self.gratitude,
            Intent::Fallback => &self.fallback,
        }
    }

    fn validate(&self) -> Result<(), ReplyConfigError> {
        for intent in Intent::ALL {
            if self.reply_for(intent).trim().is_empty() {
                return Err(ReplyConfigError::EmptyReply(intent));
            }
        }
        Ok(())
    }

    fn from_file(file: ReplyFile) -> Self {
        let defaults = ReplyConfig::default();
        let capability = file.capability.unwrap_or(defaults.capability);
        // An unset fallback follows the capability text, even when that was overridden.
        let fallback = file.fallback.unwrap_or_else(|| capability.clone());
        Self {
            greeting: file.greeting.unwrap_or(defaults.greeting),
            wellbeing: file.wellbeing.unwrap_or(defaults.wellbeing),
            capability,
            farewell: file.farewell.unwrap_or(defaults.farewell),
            gratitude: file.gratitude.unwrap_or(defaults.gratitude),
            fallback,
            last_loaded: None,
        }
    }
}

pub fn load_replies<P: AsRef<Path>>(path: P) -> Result<Arc<ReplyConfig>, ReplyConfigError> {
    let path = path.as_ref();
    let file_content = fs::read_to_string(path).map_err(|source| ReplyConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: ReplyFile = serde_json::from_str(&file_content).map_err(|source| {
        ReplyConfigError::Json {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let mut config = ReplyConfig::from_file(file);
    config.validate()?;
    config.last_loaded = Some(SystemTime::now());
    Ok(Arc::new(config))
}

/// Returns a freshly loaded table when the file changed after `current` was loaded.
pub fn reload_replies_if_changed<P: AsRef<Path>>(
    path: P,
    current: &Arc<ReplyConfig>
) -> Result<Option<Arc<ReplyConfig>>, ReplyConfigError> {
    let path = path.as_ref();
    let metadata = fs::metadata(path).map_err(|source| ReplyConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if let Ok(modified) = metadata.modified() {
        match current.last_loaded {
            Some(last_loaded) if modified <= last_loaded => {}
            Some(_) => {
                info!("Replies file changed, reloading...");
                return load_replies(path).map(Some);
            }
            None => {
                info!("No last_loaded timestamp, reloading replies...");
                return load_replies(path).map(Some);
            }
        }
    }
    Ok(None)
}
