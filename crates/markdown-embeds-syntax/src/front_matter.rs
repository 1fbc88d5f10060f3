//! Splitting a leading `---` metadata block off the document body.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::ParseError;

/// Decoded front-matter: an arbitrary JSON-compatible mapping.
pub type FrontMatter = Map<String, Value>;

fn front_matter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)^\s*---\n(.+?)\n\s*---\s*").expect("Invalid front-matter regex")
    })
}

/// Split `source` into its decoded front-matter (if any) and the remaining
/// body text.
///
/// A block that decodes to something other than a mapping yields an empty
/// mapping.
pub fn split_front_matter(source: &str) -> Result<(Option<FrontMatter>, &str), ParseError> {
    let Some(caps) = front_matter_re().captures(source) else {
        return Ok((None, source));
    };
    let raw = caps.get(1).map_or("", |m| m.as_str());
    let value: Value =
        serde_yaml::from_str(raw).map_err(|source| ParseError::FrontMatter { source })?;
    let data = match value {
        Value::Object(map) => map,
        other => {
            log::warn!("front-matter is not a mapping, ignoring: {other}");
            Map::new()
        }
    };
    Ok((Some(data), &source[caps[0].len()..]))
}
