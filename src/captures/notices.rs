//! User-facing messages produced while handling a request.
//!
//! Views push notices into a `Notices` sequence instead of writing to any
//! request-global store; the HTTP layer decides whether they are rendered
//! immediately or carried over a redirect.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Notices(Vec<Notice>);

impl Notices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<T: Into<String>>(&mut self, level: NoticeLevel, message: T) {
        self.0.push(Notice {
            level,
            message: message.into(),
        });
    }

    pub fn info<T: Into<String>>(&mut self, message: T) {
        self.push(NoticeLevel::Info, message)
    }

    pub fn success<T: Into<String>>(&mut self, message: T) {
        self.push(NoticeLevel::Success, message)
    }

    pub fn error<T: Into<String>>(&mut self, message: T) {
        self.push(NoticeLevel::Error, message)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.0.iter()
    }
}
