use std::str::FromStr;

use markdown_embeds_syntax::{DEFAULT_MAX_DEPTH, FrontMatter};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_UNORDERED_MARKER: &str = "• ";
/// `n` is replaced with the 1-based item number.
pub const DEFAULT_ORDERED_MARKER: &str = "n. ";

/// Output text flavor for leaf serialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavor {
    #[default]
    Markdown,
    Html,
}

impl Flavor {
    /// Stand-in for an empty field name or value.
    pub fn placeholder(self) -> &'static str {
        match self {
            Flavor::Markdown => "_ _",
            Flavor::Html => "&nbsp;",
        }
    }

    /// Joiner repeated once per gap line when merging bodies.
    pub fn line_break(self) -> &'static str {
        match self {
            Flavor::Markdown => "\n",
            Flavor::Html => "<br>",
        }
    }
}

impl FromStr for Flavor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(Flavor::Markdown),
            "html" => Ok(Flavor::Html),
            other => Err(format!("unknown flavor `{other}`, expected markdown or html")),
        }
    }
}

/// Settings for one render call.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub flavor: Flavor,
    /// Unordered list marker. Falls back to front-matter `ul`, then the default.
    pub ul: Option<String>,
    /// Ordered list marker template. Falls back to front-matter `ol`, then the default.
    pub ol: Option<String>,
    pub max_depth: usize,
    /// Values visible to command evaluation, taking precedence over front-matter.
    pub variables: Map<String, Value>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            flavor: Flavor::default(),
            ul: None,
            ol: None,
            max_depth: DEFAULT_MAX_DEPTH,
            variables: Map::new(),
        }
    }
}

/// Resolved list markers for a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListMarkers {
    pub ul: String,
    pub ol: String,
}

impl RenderOptions {
    pub fn list_markers(&self, front_matter: Option<&FrontMatter>) -> ListMarkers {
        let seeded = |key: &str| {
            front_matter
                .and_then(|data| data.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        ListMarkers {
            ul: self
                .ul
                .clone()
                .or_else(|| seeded("ul"))
                .unwrap_or_else(|| DEFAULT_UNORDERED_MARKER.to_string()),
            ol: self
                .ol
                .clone()
                .or_else(|| seeded("ol"))
                .unwrap_or_else(|| DEFAULT_ORDERED_MARKER.to_string()),
        }
    }
}
