//! Error types for catalog and option loading.
//!
//! Editing itself never fails: the session maps every collaborator failure to
//! an outcome value. These errors only surface while configuring.

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum EmojiAreaError {
    #[error("io error: {0}")]
    #[diagnostic(code(emojiarea::io))]
    Io(#[from] std::io::Error),

    #[error("invalid TOML configuration: {0}")]
    #[diagnostic(code(emojiarea::config::toml))]
    Toml(#[from] toml::de::Error),

    #[error("invalid JSON configuration: {0}")]
    #[diagnostic(code(emojiarea::config::json))]
    Json(#[from] serde_json::Error),

    #[error("token {token:?} in group {group:?} does not match :[a-z0-9-_+]+:")]
    #[diagnostic(
        code(emojiarea::catalog::invalid_token),
        help("tokens are lowercase ascii letters, digits, '-', '_' or '+'")
    )]
    InvalidToken { group: String, token: String },

    #[error("group {0:?} is defined more than once")]
    #[diagnostic(code(emojiarea::catalog::duplicate_group))]
    DuplicateGroup(String),

    #[error("unsupported configuration format: {0}")]
    #[diagnostic(
        code(emojiarea::config::format),
        help("use a .toml or .json file")
    )]
    UnsupportedFormat(String),
}

pub type Result<T, E = EmojiAreaError> = std::result::Result<T, E>;
