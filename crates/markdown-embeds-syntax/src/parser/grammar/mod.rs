//! # Grammar Rules
//!
//! Each function takes a `&mut Parser`, inspects the current token
//! (`p.current()`, `p.nth()`), advances (`p.bump()`, `p.jump()`) and returns
//! the nodes it built.
//!
//! ## Module Structure
//!
//! - [`block`] - lists, quotes, headings and standalone commands
//! - [`inline`] - style spans, links, code and text
//!
//! ## Paragraphs
//!
//! At document level, inline nodes accumulate into an open run. A blank line
//! (a whitespace run with two or more newlines) or any block starter closes
//! the run into a [`Node::Paragraph`]. Leading content before the first block
//! starter simply becomes the first paragraph.
//!
//! ## Error Recovery
//!
//! Grammar functions are lenient: an opener without a closer is emitted as
//! text equal to its source. The only failure is the nesting limit.

pub(crate) mod block;
pub(crate) mod inline;

use crate::error::ParseError;
use crate::lexer::TokenKind;
use crate::node::{Node, push_node, trim_edges};
use crate::parser::Parser;

/// Parse the whole token stream as a document.
pub(crate) fn document(p: &mut Parser<'_, '_>) -> Result<Vec<Node>, ParseError> {
    let mut blocks = Vec::new();
    let mut run = Vec::new();

    while let Some(token) = p.current() {
        match token.kind {
            TokenKind::Whitespace { newlines } if newlines >= 2 => {
                close_paragraph(&mut blocks, &mut run);
                p.bump();
            }
            TokenKind::ListMarker { ordered, marker } => {
                close_paragraph(&mut blocks, &mut run);
                blocks.push(block::list(p, ordered, marker)?);
            }
            TokenKind::QuoteMarker => {
                close_paragraph(&mut blocks, &mut run);
                blocks.push(block::quote(p)?);
            }
            TokenKind::Heading { level, variant } => {
                close_paragraph(&mut blocks, &mut run);
                blocks.push(block::heading(p, level, variant)?);
            }
            TokenKind::CodeBlock {
                code,
                terminated: true,
            } => {
                close_paragraph(&mut blocks, &mut run);
                blocks.push(Node::code_block(code));
                p.bump();
            }
            TokenKind::Command(expression) if block::is_standalone(p) => {
                close_paragraph(&mut blocks, &mut run);
                blocks.push(Node::Command {
                    expression: expression.to_string(),
                });
                p.bump();
            }
            _ => {
                if let Some(node) = inline::node(p)? {
                    push_node(&mut run, node);
                }
            }
        }
    }
    close_paragraph(&mut blocks, &mut run);

    log::debug!("parsed {} block nodes", blocks.len());
    Ok(trim_edges(blocks))
}

/// Close the open inline run into a paragraph, dropping edge whitespace.
fn close_paragraph(blocks: &mut Vec<Node>, run: &mut Vec<Node>) {
    let mut children = std::mem::take(run);
    while children.last().is_some_and(Node::is_whitespace) {
        children.pop();
    }
    let leading = children.iter().take_while(|n| n.is_whitespace()).count();
    children.drain(..leading);
    if !children.is_empty() {
        blocks.push(Node::Paragraph { children });
    }
}
