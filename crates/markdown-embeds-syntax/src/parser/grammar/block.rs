//! Block-level grammar: lists, quotes, headings and standalone commands.
//!
//! Each block rule starts on its marker token, finds where the block ends by
//! scanning forward, hands the inner token ranges to nested inline parsers,
//! and leaves the cursor on the terminator (or at end of input).

use crate::error::ParseError;
use crate::lexer::{HeadingVariant, Token, TokenKind};
use crate::node::Node;
use crate::parser::{Parser, Scan};

/// A `{...}` command alone on its line.
pub(crate) fn is_standalone(p: &Parser<'_, '_>) -> bool {
    let opens_line = match p.previous() {
        None => true,
        Some(token) => token.is_break(1) || token.kind == TokenKind::HardBreak,
    };
    let closes_line = p.nth(1).is_none_or(|token| token.is_break(1));
    opens_line && closes_line
}

/// Markers that belong to the same list as one opened with `ordered` and
/// `marker`: any ordered marker for ordered lists, the same bullet otherwise.
fn same_list(ordered: bool, marker: &str, token: &Token<'_>) -> bool {
    match token.kind {
        TokenKind::ListMarker {
            ordered: true, ..
        } => ordered,
        TokenKind::ListMarker {
            ordered: false,
            marker: other,
        } => !ordered && other == marker,
        _ => false,
    }
}

pub(crate) fn list(p: &mut Parser<'_, '_>, ordered: bool, marker: &str) -> Result<Node, ParseError> {
    let start = p.pos();
    let end = p
        .scan(start + 1, |token| match token.kind {
            TokenKind::Whitespace { newlines } if newlines >= 2 => Scan::Found,
            TokenKind::Heading { .. }
            | TokenKind::QuoteMarker
            | TokenKind::CodeBlock {
                terminated: true, ..
            } => Scan::Found,
            TokenKind::ListMarker { .. } if !same_list(ordered, marker, token) => Scan::Found,
            _ => Scan::Continue,
        })
        .unwrap_or(p.len());

    let items = split_items(p, start, end, |token| same_list(ordered, marker, token))?;
    p.jump(end);
    log::trace!("list with {} items", items.len());
    Ok(Node::List { ordered, items })
}

pub(crate) fn quote(p: &mut Parser<'_, '_>) -> Result<Node, ParseError> {
    let start = p.pos();
    let end = p
        .scan(start + 1, |token| match token.kind {
            TokenKind::Whitespace { newlines } if newlines >= 2 => Scan::Found,
            TokenKind::Heading { .. }
            | TokenKind::ListMarker { .. }
            | TokenKind::CodeBlock {
                terminated: true, ..
            } => Scan::Found,
            _ => Scan::Continue,
        })
        .unwrap_or(p.len());

    let items = split_items(p, start, end, |token| token.kind == TokenKind::QuoteMarker)?;
    p.jump(end);
    Ok(Node::Quote { items })
}

pub(crate) fn heading(
    p: &mut Parser<'_, '_>,
    level: u8,
    variant: HeadingVariant,
) -> Result<Node, ParseError> {
    let start = p.pos() + 1;
    let end = p
        .scan(start, |token| {
            if token.is_break(1) {
                Scan::Found
            } else {
                Scan::Continue
            }
        })
        .unwrap_or(p.len());

    let (from, to) = trim_range(p.tokens(), start, end);
    let children = p.nested(from, to)?;

    // A single newline belongs to the heading; a blank line is left for the
    // document to close the paragraph on.
    let consumed = match p.tokens().get(end).and_then(Token::newlines) {
        Some(1) => end + 1,
        _ => end,
    };
    p.jump(consumed);
    Ok(Node::Heading {
        level,
        variant,
        children,
    })
}

/// Split `start..end` at every token `is_marker` accepts and parse each item.
/// The token at `start` is always a marker.
fn split_items(
    p: &Parser<'_, '_>,
    start: usize,
    end: usize,
    is_marker: impl Fn(&Token<'_>) -> bool,
) -> Result<Vec<Vec<Node>>, ParseError> {
    let tokens = p.tokens();
    let mut markers: Vec<usize> = (start..end)
        .filter(|&i| i == start || is_marker(&tokens[i]))
        .collect();
    markers.push(end);

    markers
        .windows(2)
        .map(|pair| {
            let (from, to) = trim_range(tokens, pair[0] + 1, pair[1]);
            p.nested(from, to)
        })
        .collect()
}

/// Shrink `start..end` past whitespace tokens on both ends.
fn trim_range(tokens: &[Token<'_>], mut start: usize, mut end: usize) -> (usize, usize) {
    while start < end && tokens[start].newlines().is_some() {
        start += 1;
    }
    while end > start && tokens[end - 1].newlines().is_some() {
        end -= 1;
    }
    (start, end)
}

#[cfg(test)]
mod tests {
    use crate::lexer::{HeadingVariant, StyleKind, lex};
    use crate::node::Node;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn parse_str(input: &str) -> Vec<Node> {
        parse(&lex(input)).unwrap()
    }

    fn text(s: &str) -> Node {
        Node::text(s)
    }

    #[test]
    fn unordered_list_items() {
        assert_eq!(
            parse_str("- one\n- two\n\nafter"),
            vec![
                Node::List {
                    ordered: false,
                    items: vec![vec![text("one")], vec![text("two")]],
                },
                Node::Paragraph {
                    children: vec![text("after")],
                },
            ]
        );
    }

    #[test]
    fn contrary_marker_starts_a_new_list() {
        assert_eq!(
            parse_str("1. a\n2. b\n- c"),
            vec![
                Node::List {
                    ordered: true,
                    items: vec![vec![text("a")], vec![text("b")]],
                },
                Node::List {
                    ordered: false,
                    items: vec![vec![text("c")]],
                },
            ]
        );
    }

    #[test]
    fn different_bullet_is_contrary() {
        let nodes = parse_str("- a\n* b");
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn list_items_hold_inline_styles() {
        assert_eq!(
            parse_str("- **bold** item"),
            vec![Node::List {
                ordered: false,
                items: vec![vec![
                    Node::Style {
                        kind: StyleKind::Bold,
                        marker: "**".into(),
                        children: vec![text("bold")],
                    },
                    Node::Whitespace { newlines: 0 },
                    text("item"),
                ]],
            }]
        );
    }

    #[test]
    fn list_stops_at_heading() {
        assert_eq!(
            parse_str("- a\n# H"),
            vec![
                Node::List {
                    ordered: false,
                    items: vec![vec![text("a")]],
                },
                Node::Heading {
                    level: 1,
                    variant: HeadingVariant::Block,
                    children: vec![text("H")],
                },
            ]
        );
    }

    #[test]
    fn quote_lines_are_items() {
        assert_eq!(
            parse_str("> a\n> b"),
            vec![Node::Quote {
                items: vec![vec![text("a")], vec![text("b")]],
            }]
        );
    }

    #[rstest]
    #[case("# x", 1, HeadingVariant::Block)]
    #[case("### x", 3, HeadingVariant::Block)]
    #[case("##-x", 2, HeadingVariant::Inline)]
    #[case("#- x", 1, HeadingVariant::Inline)]
    #[case("#!x", 1, HeadingVariant::EmbedTitle)]
    fn heading_levels_and_variants(
        #[case] input: &str,
        #[case] level: u8,
        #[case] variant: HeadingVariant,
    ) {
        assert_eq!(
            parse_str(input),
            vec![Node::Heading {
                level,
                variant,
                children: vec![text("x")],
            }]
        );
    }

    #[test]
    fn heading_followed_by_blank_line() {
        assert_eq!(
            parse_str("# a\n\nb"),
            vec![
                Node::Heading {
                    level: 1,
                    variant: HeadingVariant::Block,
                    children: vec![text("a")],
                },
                Node::Paragraph {
                    children: vec![text("b")],
                },
            ]
        );
    }

    #[test]
    fn command_after_escaped_newline_is_standalone() {
        assert_eq!(
            parse_str("a\\\n{cmd}"),
            vec![
                Node::Paragraph {
                    children: vec![text("a\n")],
                },
                Node::Command {
                    expression: "cmd".into(),
                },
            ]
        );
    }
}
