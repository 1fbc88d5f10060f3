use std::fmt;

use markdown_embeds_syntax::ParseError;
use thiserror::Error;

use crate::models::{
    AUTHOR_NAME_LIMIT, DESCRIPTION_LIMIT, EMBED_TEXT_LIMIT, FIELD_VALUE_LIMIT, FOOTER_TEXT_LIMIT,
    TITLE_LIMIT,
};

/// Errors that abort rendering a document.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Limit(#[from] RenderLimitError),
}

/// Which hard ceiling was exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    Title,
    Description,
    FieldValue,
    AuthorName,
    FooterText,
    /// All text in one container, decorations included.
    Container,
}

impl LimitKind {
    pub fn limit(self) -> usize {
        match self {
            LimitKind::Title => TITLE_LIMIT,
            LimitKind::Description => DESCRIPTION_LIMIT,
            LimitKind::FieldValue => FIELD_VALUE_LIMIT,
            LimitKind::AuthorName => AUTHOR_NAME_LIMIT,
            LimitKind::FooterText => FOOTER_TEXT_LIMIT,
            LimitKind::Container => EMBED_TEXT_LIMIT,
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LimitKind::Title => "title",
            LimitKind::Description => "description",
            LimitKind::FieldValue => "field value",
            LimitKind::AuthorName => "author name",
            LimitKind::FooterText => "footer text",
            LimitKind::Container => "container text",
        })
    }
}

/// A single piece of text is longer than its platform ceiling, so no packing
/// decision can make the document fit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} of {length} characters exceeds the {limit} character limit: {preview:?}")]
pub struct RenderLimitError {
    pub kind: LimitKind,
    pub limit: usize,
    pub length: usize,
    pub text: String,
    preview: String,
}

impl RenderLimitError {
    /// Check `text` against the ceiling for `kind`.
    pub fn check(kind: LimitKind, text: &str) -> Result<(), Self> {
        let length = text.chars().count();
        if length <= kind.limit() {
            return Ok(());
        }
        Err(Self::new(kind, length, text))
    }

    /// A container whose content and decorations total `length` characters.
    /// `text` is its leading content, used to identify it.
    pub fn container(length: usize, text: &str) -> Self {
        Self::new(LimitKind::Container, length, text)
    }

    fn new(kind: LimitKind, length: usize, text: &str) -> Self {
        let mut preview: String = text.chars().take(40).collect();
        if length > 40 {
            preview.push('…');
        }
        Self {
            kind,
            limit: kind.limit(),
            length,
            text: text.to_string(),
            preview,
        }
    }
}

/// A command span could not be evaluated. Rendered as literal text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("command `{0}` not found")]
    UnknownCommand(String),

    #[error("command `{name}` failed: {message}")]
    Failed { name: String, message: String },
}
