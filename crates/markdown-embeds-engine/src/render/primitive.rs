//! Flattening a syntax tree into content primitives.

use markdown_embeds_syntax::{Document, FrontMatter, HeadingVariant, Node};
use serde::Serialize;

use crate::evaluator::Evaluated;
use crate::options::Flavor;
use crate::serialize::Serializer;

/// Gap after paragraphs and block-level commands.
pub const PARAGRAPH_GAP: usize = 2;
/// Gap after lists, quotes and code blocks.
pub const BLOCK_GAP: usize = 1;

/// How a title asks to be packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleKind {
    /// `#` - a field, or a container title when nothing is open yet.
    Plain,
    /// `#-` - an inline field.
    Inline,
    /// `#!` - always a new container.
    Embed,
}

impl From<HeadingVariant> for TitleKind {
    fn from(variant: HeadingVariant) -> Self {
        match variant {
            HeadingVariant::Block => TitleKind::Plain,
            HeadingVariant::Inline => TitleKind::Inline,
            HeadingVariant::EmbedTitle => TitleKind::Embed,
        }
    }
}

/// A container-agnostic unit of content, in document order.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Title {
        text: String,
        kind: TitleKind,
        url: Option<String>,
    },
    /// `gap` is the number of line breaks used when merging with the
    /// neighbouring body.
    Body {
        text: String,
        gap: usize,
    },
    Image {
        url: String,
    },
    FrontMatter(FrontMatter),
}

impl Primitive {
    pub fn body(text: impl Into<String>, gap: usize) -> Self {
        Primitive::Body {
            text: text.into(),
            gap,
        }
    }
}

/// Stage A: walk the document's blocks and emit primitives.
pub fn flatten(document: &Document, serializer: &Serializer<'_>) -> Vec<Primitive> {
    let mut primitives = Vec::new();
    if let Some(data) = &document.front_matter {
        primitives.push(Primitive::FrontMatter(data.clone()));
    }

    for node in &document.children {
        match node {
            Node::Heading {
                variant, children, ..
            } => primitives.push(title(TitleKind::from(*variant), children, serializer)),
            Node::List { ordered, items } => {
                primitives.push(Primitive::body(serializer.list(*ordered, items), BLOCK_GAP))
            }
            Node::Quote { items } => {
                primitives.push(Primitive::body(serializer.quote(items), BLOCK_GAP))
            }
            Node::CodeBlock { language, code } => primitives.push(Primitive::body(
                serializer.code_block(language.as_deref(), code),
                BLOCK_GAP,
            )),
            Node::Paragraph { children } => paragraph(children, serializer, &mut primitives),
            Node::Command { expression } => match serializer.command(expression) {
                Evaluated::Text(text) => {
                    let text = match serializer.flavor() {
                        Flavor::Markdown => text,
                        Flavor::Html => format!("<p>{text}</p>"),
                    };
                    primitives.push(Primitive::body(text, PARAGRAPH_GAP));
                }
                Evaluated::Fragment(fragment) => primitives.extend(fragment),
            },
            other => paragraph(std::slice::from_ref(other), serializer, &mut primitives),
        }
    }

    log::debug!("flattened document into {} primitives", primitives.len());
    primitives
}

/// An embed title that is exactly one link takes the link's target as the
/// container url.
fn title(kind: TitleKind, children: &[Node], serializer: &Serializer<'_>) -> Primitive {
    match (kind, children) {
        (TitleKind::Embed, [Node::Link { label, target, .. }]) => Primitive::Title {
            text: serializer.title(label),
            kind,
            url: Some(target.clone()),
        },
        _ => Primitive::Title {
            text: serializer.title(children),
            kind,
            url: None,
        },
    }
}

/// Images become their own primitives; the text runs between them become
/// bodies.
fn paragraph(children: &[Node], serializer: &Serializer<'_>, out: &mut Vec<Primitive>) {
    let mut start = 0;
    for (i, node) in children.iter().enumerate() {
        if let Node::Image { target, .. } = node {
            text_run(&children[start..i], serializer, out);
            out.push(Primitive::Image {
                url: target.clone(),
            });
            start = i + 1;
        }
    }
    text_run(&children[start..], serializer, out);
}

fn text_run(nodes: &[Node], serializer: &Serializer<'_>, out: &mut Vec<Primitive>) {
    let first = nodes.iter().position(|n| !n.is_whitespace());
    let last = nodes.iter().rposition(|n| !n.is_whitespace());
    if let (Some(first), Some(last)) = (first, last) {
        out.push(Primitive::body(
            serializer.inline(&nodes[first..=last]),
            PARAGRAPH_GAP,
        ));
    }
}
