//! Leaf serialization: syntax nodes back to markdown or HTML text.

use html_escape::{encode_double_quoted_attribute, encode_text};
use markdown_embeds_syntax::{Mention, Node, StyleKind};

use crate::evaluator::{Context, Evaluated, Evaluator};
use crate::options::{Flavor, ListMarkers};
use crate::render::Primitive;

/// Everything needed to turn nodes into output text for one document.
pub struct Serializer<'a> {
    flavor: Flavor,
    markers: ListMarkers,
    evaluator: &'a dyn Evaluator,
    context: Context<'a>,
}

impl<'a> Serializer<'a> {
    pub fn new(
        flavor: Flavor,
        markers: ListMarkers,
        evaluator: &'a dyn Evaluator,
        context: Context<'a>,
    ) -> Self {
        Self {
            flavor,
            markers,
            evaluator,
            context,
        }
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    /// Evaluate a command, turning failures into their message text.
    pub fn command(&self, expression: &str) -> Evaluated {
        match self.evaluator.evaluate(&self.context, expression) {
            Ok(evaluated) => evaluated,
            Err(err) => {
                log::warn!("command `{{{expression}}}` failed: {err}");
                Evaluated::Text(err.to_string())
            }
        }
    }

    /// Serialize an inline sequence.
    pub fn inline(&self, nodes: &[Node]) -> String {
        let mut out = String::new();
        for node in nodes {
            self.node(node, &mut out);
        }
        out
    }

    pub fn title(&self, nodes: &[Node]) -> String {
        match self.flavor {
            Flavor::Markdown => self.inline(nodes),
            Flavor::Html => format!("<h3>{}</h3>", self.inline(nodes)),
        }
    }

    pub fn list(&self, ordered: bool, items: &[Vec<Node>]) -> String {
        match self.flavor {
            Flavor::Markdown => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    let marker = if ordered {
                        self.markers.ol.replacen('n', &(i + 1).to_string(), 1)
                    } else {
                        self.markers.ul.clone()
                    };
                    marker + &self.inline(item)
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Flavor::Html => {
                let tag = if ordered { "ol" } else { "ul" };
                let items: String = items
                    .iter()
                    .map(|item| format!("<li>{}</li>", self.inline(item)))
                    .collect();
                format!("<{tag}>{items}</{tag}>")
            }
        }
    }

    pub fn quote(&self, items: &[Vec<Node>]) -> String {
        match self.flavor {
            Flavor::Markdown => items
                .iter()
                .flat_map(|item| {
                    self.inline(item)
                        .split('\n')
                        .map(|line| format!("> {line}"))
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Flavor::Html => {
                let lines: Vec<String> = items.iter().map(|item| self.inline(item)).collect();
                format!("<blockquote>{}</blockquote>", lines.join("<br>"))
            }
        }
    }

    pub fn code_block(&self, language: Option<&str>, code: &str) -> String {
        let language = language.unwrap_or("plaintext");
        match self.flavor {
            Flavor::Markdown => format!("```{language}\n{code}\n```"),
            Flavor::Html => format!(
                "<pre class=\"language-{}\"><code>{}</code></pre>",
                encode_double_quoted_attribute(language),
                encode_text(code)
            ),
        }
    }

    fn text(&self, text: &str, out: &mut String) {
        match self.flavor {
            Flavor::Markdown => out.push_str(text),
            Flavor::Html => out.push_str(&encode_text(text).replace('\n', "<br>")),
        }
    }

    fn node(&self, node: &Node, out: &mut String) {
        match node {
            Node::Text { text } => self.text(text, out),
            Node::Whitespace { .. } => out.push(' '),
            Node::Style {
                kind,
                marker,
                children,
            } => {
                let inner = self.inline(children);
                match self.flavor {
                    Flavor::Markdown => {
                        out.push_str(marker);
                        out.push_str(&inner);
                        out.push_str(marker);
                    }
                    Flavor::Html => {
                        let tag = html_tag(*kind);
                        out.push_str(&format!("<{tag}>{inner}</{tag}>"));
                    }
                }
            }
            Node::InlineCode { code } => match self.flavor {
                Flavor::Markdown => out.push_str(&format!("`{code}`")),
                Flavor::Html => out.push_str(&format!("<code>{}</code>", encode_text(code))),
            },
            Node::Link {
                label,
                target,
                title,
            } => self.link(&self.inline(label), target, title.as_deref(), false, out),
            Node::Image { alt, target, title } => {
                self.link(&self.inline(alt), target, title.as_deref(), true, out)
            }
            Node::Command { expression } => match self.command(expression) {
                Evaluated::Text(text) => self.text(&text, out),
                Evaluated::Fragment(primitives) => {
                    for primitive in &primitives {
                        if let Primitive::Body { text, .. } = primitive {
                            out.push_str(text);
                        }
                    }
                }
            },
            Node::Mention { mention } => match self.flavor {
                Flavor::Markdown => out.push_str(&mention.to_string()),
                Flavor::Html => out.push_str(&html_mention(mention)),
            },
            Node::CodeBlock { language, code } => {
                out.push_str(&self.code_block(language.as_deref(), code))
            }
            Node::Paragraph { children } | Node::Heading { children, .. } => {
                out.push_str(&self.inline(children))
            }
            Node::List { ordered, items } => out.push_str(&self.list(*ordered, items)),
            Node::Quote { items } => out.push_str(&self.quote(items)),
        }
    }

    fn link(&self, label: &str, target: &str, title: Option<&str>, image: bool, out: &mut String) {
        match self.flavor {
            Flavor::Markdown => {
                let bang = if image { "!" } else { "" };
                match title {
                    Some(title) => out.push_str(&format!(
                        "{bang}[{label}]({target} '{}')",
                        title.replace('\'', "\\'")
                    )),
                    None => out.push_str(&format!("{bang}[{label}]({target})")),
                }
            }
            Flavor::Html => {
                out.push_str(&format!("<a href=\"{}\"", encode_double_quoted_attribute(target)));
                if let Some(title) = title {
                    out.push_str(&format!(" title=\"{}\"", encode_double_quoted_attribute(title)));
                }
                out.push_str(&format!(">{label}</a>"));
            }
        }
    }
}

/// Mentions cannot be resolved to names here, so users, roles and channels
/// get a generic label.
fn html_mention(mention: &Mention) -> String {
    let label = match mention {
        Mention::User { .. } => "@user".to_string(),
        Mention::Role { .. } => "@role".to_string(),
        Mention::Channel { .. } => "#channel".to_string(),
        Mention::Command { name, .. } => format!("/{name}"),
        Mention::Emoji { id, animated, .. } => {
            let extension = if *animated { "gif" } else { "png" };
            return format!(
                "<img class=\"emoji\" src=\"https://cdn.discordapp.com/emojis/{id}.{extension}\">"
            );
        }
        Mention::Timestamp { seconds, style } => {
            return format!(
                "<time data-time=\"{seconds}\" data-format=\"{}\">[Loading]</time>",
                style.unwrap_or('f')
            );
        }
    };
    format!("<span class=\"mention\">{}</span>", encode_text(&label))
}

fn html_tag(kind: StyleKind) -> &'static str {
    match kind {
        StyleKind::Bold => "strong",
        StyleKind::Underline => "u",
        StyleKind::Italic => "em",
        StyleKind::Strikethrough => "s",
    }
}
