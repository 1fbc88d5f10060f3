//! Syntax tree produced by the parser.
//!
//! The tree is a closed sum type: every consumer matches exhaustively, so a
//! new node kind cannot be silently ignored downstream.

use std::fmt;

use serde::Serialize;

use crate::front_matter::FrontMatter;
use crate::lexer::{HeadingVariant, StyleKind, mention_re};

/// A parsed document: optional front-matter plus block-level children.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Document {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub front_matter: Option<FrontMatter>,
    pub children: Vec<Node>,
}

/// A syntax node. Block and inline nodes share one enum; which ones appear
/// where is governed by the grammar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Paragraph {
        children: Vec<Node>,
    },
    Heading {
        level: u8,
        variant: HeadingVariant,
        children: Vec<Node>,
    },
    /// One inline sequence per item.
    List {
        ordered: bool,
        items: Vec<Vec<Node>>,
    },
    /// One inline sequence per quoted line.
    Quote {
        items: Vec<Vec<Node>>,
    },
    Link {
        label: Vec<Node>,
        target: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    /// A link whose label is alt text and is never rendered.
    Image {
        alt: Vec<Node>,
        target: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    CodeBlock {
        #[serde(skip_serializing_if = "Option::is_none")]
        language: Option<String>,
        code: String,
    },
    InlineCode {
        code: String,
    },
    /// `marker` is the literal delimiter used, so `_x_` and `*x*` stay apart.
    Style {
        kind: StyleKind,
        marker: String,
        children: Vec<Node>,
    },
    Whitespace {
        newlines: usize,
    },
    Text {
        text: String,
    },
    /// An expression span, evaluated at render time.
    Command {
        expression: String,
    },
    Mention {
        mention: Mention,
    },
}

/// A platform mention, kept by id so it can be written back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mention {
    User { id: String },
    Role { id: String },
    Channel { id: String },
    /// `name` is the command path, up to three space separated words.
    Command { name: String, id: String },
    Emoji { name: String, id: String, animated: bool },
    /// Seconds since the epoch, with an optional display style letter.
    Timestamp { seconds: String, style: Option<char> },
}

impl Mention {
    /// Read a mention from its source form, e.g. `<@&123>`.
    pub fn parse(source: &str) -> Option<Self> {
        let caps = mention_re().captures(source)?;
        if caps[0].len() != source.len() {
            return None;
        }
        let group = |name: &str| caps.name(name).map(|m| m.as_str().to_string());

        if let Some(id) = group("user") {
            return Some(Mention::User { id });
        }
        if let Some(id) = group("role") {
            return Some(Mention::Role { id });
        }
        if let Some(id) = group("channel") {
            return Some(Mention::Channel { id });
        }
        if let (Some(name), Some(id)) = (group("command"), group("command_id")) {
            return Some(Mention::Command { name, id });
        }
        if let (Some(name), Some(id)) = (group("emoji"), group("emoji_id")) {
            return Some(Mention::Emoji {
                name,
                id,
                animated: group("animated").is_some_and(|a| a == "a"),
            });
        }
        let seconds = group("time")?;
        Some(Mention::Timestamp {
            seconds,
            style: caps.name("style").and_then(|m| m.as_str().chars().next()),
        })
    }
}

impl fmt::Display for Mention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mention::User { id } => write!(f, "<@{id}>"),
            Mention::Role { id } => write!(f, "<@&{id}>"),
            Mention::Channel { id } => write!(f, "<#{id}>"),
            Mention::Command { name, id } => write!(f, "</{name}:{id}>"),
            Mention::Emoji { name, id, animated } => {
                let prefix = if *animated { "a" } else { "" };
                write!(f, "<{prefix}:{name}:{id}>")
            }
            Mention::Timestamp { seconds, style } => match style {
                Some(style) => write!(f, "<t:{seconds}:{style}>"),
                None => write!(f, "<t:{seconds}>"),
            },
        }
    }
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text { text: text.into() }
    }

    /// Build a code block from the raw text between the fences.
    ///
    /// The first line is taken as the language when it is a bare word and more
    /// lines follow; one trailing newline before the closing fence is dropped.
    pub fn code_block(raw: &str) -> Self {
        let (language, code) = match raw.split_once('\n') {
            Some((first, rest)) if first.chars().all(|c| c.is_alphanumeric() || c == '_') => {
                ((!first.is_empty()).then(|| first.to_string()), rest)
            }
            _ => (None, raw),
        };
        Node::CodeBlock {
            language,
            code: code.strip_suffix('\n').unwrap_or(code).to_string(),
        }
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(self, Node::Whitespace { .. })
    }
}

/// Append `node`, merging it into a preceding text node when both are text.
pub fn push_node(nodes: &mut Vec<Node>, node: Node) {
    if let Node::Text { text } = &node
        && let Some(Node::Text { text: previous }) = nodes.last_mut()
    {
        previous.push_str(text);
        return;
    }
    nodes.push(node);
}

/// Strip a single leading and a single trailing whitespace node when there
/// are more than two children.
pub fn trim_edges(mut nodes: Vec<Node>) -> Vec<Node> {
    if nodes.len() > 2 && nodes.first().is_some_and(Node::is_whitespace) {
        nodes.remove(0);
    }
    if nodes.len() > 2 && nodes.last().is_some_and(Node::is_whitespace) {
        nodes.pop();
    }
    nodes
}
