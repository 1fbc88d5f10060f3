//! # markdown-embeds-syntax
//!
//! Tokenizer and syntax tree for the chat-flavored markdown dialect used to
//! author embed payloads.
//!
//! ## Architecture Overview
//!
//! ```text
//! Source Text → front-matter split → Lexer → Tokens → Parser → Document
//!               (serde_yaml)         (regex)          (grammar)
//! ```
//!
//! ### 1. Front-matter ([`front_matter`] module)
//!
//! A leading `---` block is decoded as YAML into a JSON-compatible mapping
//! and cut off the body before lexing.
//!
//! ### 2. Lexer ([`lexer`] module)
//!
//! Priority-ordered, context-sensitive rules produce a flat token list.
//! Every byte of the body lands in exactly one token.
//!
//! ```text
//! "# Hi **you**" → [Heading, Text("Hi"), Whitespace, Delimiter(Bold),
//!                   Text("you"), Delimiter(Bold)]
//! ```
//!
//! ### 3. Parser ([`parser`] module)
//!
//! Paired constructs are matched by scanning forward over tokens. Anything
//! unmatched degrades to literal text, so parsing only fails past the
//! nesting limit.
//!
//! ## Module Structure
//!
//! ```text
//! markdown-embeds-syntax/
//! ├── lib.rs            # This file - public API
//! ├── error.rs          # ParseError
//! ├── front_matter.rs   # `---` block splitting and decoding
//! ├── lexer.rs          # Tokenizer
//! ├── node.rs           # Document and Node types
//! └── parser/
//!     ├── mod.rs        # Parser cursor, scan helper, nesting limit
//!     └── grammar/
//!         ├── mod.rs    # Document loop and paragraphs
//!         ├── block.rs  # Lists, quotes, headings, standalone commands
//!         └── inline.rs # Styles, links, code
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use markdown_embeds_syntax::{Node, parse_document};
//!
//! let doc = parse_document("---\ncolor: 3\n---\n# Hello\nworld").unwrap();
//!
//! assert_eq!(doc.front_matter.unwrap()["color"], 3);
//! assert!(matches!(doc.children[0], Node::Heading { level: 1, .. }));
//! assert!(matches!(doc.children[1], Node::Paragraph { .. }));
//! ```

pub mod error;
pub mod front_matter;
pub mod lexer;
pub mod node;
pub mod parser;

pub use error::ParseError;
pub use front_matter::{FrontMatter, split_front_matter};
pub use lexer::{HeadingVariant, StyleKind, Token, TokenKind, lex};
pub use node::{Document, Mention, Node};
pub use parser::{DEFAULT_MAX_DEPTH, parse};

/// Parse a full source document, front-matter included.
pub fn parse_document(source: &str) -> Result<Document, ParseError> {
    parse_document_with_limit(source, DEFAULT_MAX_DEPTH)
}

/// [`parse_document`] with an explicit nesting limit.
pub fn parse_document_with_limit(source: &str, max_depth: usize) -> Result<Document, ParseError> {
    let (front_matter, body) = split_front_matter(source)?;
    let tokens = lex(body);
    let children = parser::Parser::with_max_depth(&tokens, max_depth).parse()?;
    Ok(Document {
        front_matter,
        children,
    })
}
