// Student ACID Lab - Notices
// Blocking messages the presentation layer shows after an operation

use crate::error::RecordError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub body: String,
}

impl Notice {
    pub fn info(title: &str, body: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.to_string(),
            body: body.into(),
        }
    }

    pub fn warning(title: &str, body: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            title: title.to_string(),
            body: body.into(),
        }
    }
}

impl From<&RecordError> for Notice {
    fn from(err: &RecordError) -> Self {
        match err {
            RecordError::Validation { .. } => Notice::warning("Input Error", "All fields are required!"),
            RecordError::NotFound(_) => {
                Notice::warning("Not Found", "No student found with that information.")
            }
            RecordError::Csv(_) | RecordError::Io(_) => Notice::warning("File Error", err.to_string()),
        }
    }
}
