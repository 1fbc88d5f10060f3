//! Inline grammar: style spans, links, images, code and text.

use crate::error::ParseError;
use crate::lexer::{StyleKind, Token, TokenKind};
use crate::node::{Mention, Node, push_node, trim_edges};
use crate::parser::{Parser, Scan};

/// Parse every remaining token as inline content.
pub(crate) fn sequence(p: &mut Parser<'_, '_>) -> Result<Vec<Node>, ParseError> {
    let mut nodes = Vec::new();
    while p.current().is_some() {
        if let Some(node) = node(p)? {
            push_node(&mut nodes, node);
        }
    }
    Ok(trim_edges(nodes))
}

/// Parse one inline construct at the cursor, always advancing.
///
/// Returns `None` for trivia that produces no node.
pub(crate) fn node(p: &mut Parser<'_, '_>) -> Result<Option<Node>, ParseError> {
    let Some(token) = p.current() else {
        return Ok(None);
    };
    let node = match token.kind {
        TokenKind::Delimiter(kind) => return style(p, kind).map(Some),
        TokenKind::LinkStart { image } => return link(p, image).map(Some),
        TokenKind::Text => Node::text(token.text),
        TokenKind::Escaped(c) => Node::text(c),
        TokenKind::HardBreak => Node::text('\n'),
        TokenKind::Mention => match Mention::parse(token.text) {
            Some(mention) => Node::Mention { mention },
            None => Node::text(token.text),
        },
        TokenKind::Command(expression) => Node::Command {
            expression: expression.to_string(),
        },
        TokenKind::CodeBlock {
            code,
            terminated: true,
        } => Node::code_block(code),
        TokenKind::InlineCode(code) => Node::InlineCode {
            code: code.to_string(),
        },
        TokenKind::Whitespace { newlines } => Node::Whitespace { newlines },
        TokenKind::Comment => {
            p.bump();
            return Ok(None);
        }
        TokenKind::CodeBlock {
            terminated: false, ..
        }
        | TokenKind::LinkMiddle
        | TokenKind::LinkEnd
        | TokenKind::ListMarker { .. }
        | TokenKind::QuoteMarker
        | TokenKind::Heading { .. } => Node::text(token.text),
    };
    p.bump();
    Ok(Some(node))
}

/// Tokens an inline span may not cross.
fn is_barrier(token: &Token<'_>) -> bool {
    token.is_break(2)
        || matches!(
            token.kind,
            TokenKind::Heading { .. } | TokenKind::ListMarker { .. } | TokenKind::QuoteMarker
        )
}

fn style(p: &mut Parser<'_, '_>, kind: StyleKind) -> Result<Node, ParseError> {
    let start = p.pos();
    let opener = p.tokens()[start];
    if p.known_miss(opener.text) {
        p.bump();
        return Ok(Node::text(opener.text));
    }
    let close = p.seek(start + 1, |token| {
        if is_barrier(token) {
            return Scan::Abort;
        }
        match token.kind {
            // `*x_` is not italic: the closing marker must match.
            TokenKind::Delimiter(other) if other == kind && token.text == opener.text => {
                Scan::Found
            }
            _ => Scan::Continue,
        }
    });

    match close {
        Ok(end) if end > start + 1 => {
            let children = p.nested(start + 1, end)?;
            p.jump(end + 1);
            Ok(Node::Style {
                kind,
                marker: opener.text.to_string(),
                children,
            })
        }
        Ok(_) => {
            p.bump();
            Ok(Node::text(opener.text))
        }
        Err(stop) => {
            p.remember_miss(opener.text, stop);
            p.bump();
            Ok(Node::text(opener.text))
        }
    }
}

fn link(p: &mut Parser<'_, '_>, image: bool) -> Result<Node, ParseError> {
    let start = p.pos();
    let opener = p.tokens()[start];
    if p.known_miss(opener.text) {
        p.bump();
        return Ok(Node::text(opener.text));
    }
    let middle = p.seek(start + 1, |token| {
        if is_barrier(token) {
            Scan::Abort
        } else if token.kind == TokenKind::LinkMiddle {
            Scan::Found
        } else {
            Scan::Continue
        }
    });
    let middle = match middle {
        Ok(middle) => middle,
        Err(stop) => {
            p.remember_miss(opener.text, stop);
            p.bump();
            return Ok(Node::text(opener.text));
        }
    };
    let end = p.scan(middle + 1, |token| {
        if token.is_break(1) {
            Scan::Abort
        } else if token.kind == TokenKind::LinkEnd {
            Scan::Found
        } else {
            Scan::Continue
        }
    });
    // Every opener before `middle` reaches this same middle and fails alike.
    let Some(end) = end else {
        p.remember_miss(opener.text, middle);
        p.bump();
        return Ok(Node::text(opener.text));
    };

    let label = p.nested(start + 1, middle)?;
    let (target, title) = target_and_title(&p.tokens()[middle + 1..end]);
    p.jump(end + 1);

    Ok(if image {
        Node::Image {
            alt: label,
            target,
            title,
        }
    } else {
        Node::Link {
            label,
            target,
            title,
        }
    })
}

/// `url` or `url "title"` or `url 'title'`, split at the first whitespace.
fn target_and_title(tokens: &[Token<'_>]) -> (String, Option<String>) {
    let split = tokens
        .iter()
        .position(|t| t.newlines().is_some())
        .unwrap_or(tokens.len());
    let target = literal(&tokens[..split]);
    let title: String = tokens[split..].iter().map(|t| t.text).collect();
    (target, unquote(&title))
}

fn literal(tokens: &[Token<'_>]) -> String {
    let mut out = String::new();
    for token in tokens {
        match token.kind {
            TokenKind::Escaped(c) => out.push(c),
            TokenKind::HardBreak => out.push('\n'),
            _ => out.push_str(token.text),
        }
    }
    out
}

fn unquote(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let inner = ['\'', '"']
        .into_iter()
        .find_map(|q| raw.strip_prefix(q)?.strip_suffix(q))
        .unwrap_or(raw);
    let title = inner.replace("\\'", "'").replace("\\\"", "\"");
    (!title.is_empty()).then_some(title)
}
