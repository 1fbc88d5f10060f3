use thiserror::Error;

/// Errors raised while building a syntax tree.
///
/// Unmatched markup never fails: it degrades to literal text. Only input
/// that would exhaust the parser or an undecodable front-matter block does.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Nesting depth {depth} exceeds the limit of {limit}")]
    NestingTooDeep { depth: usize, limit: usize },

    #[error("Failed to decode front-matter: {source}")]
    FrontMatter { source: serde_yaml::Error },
}
