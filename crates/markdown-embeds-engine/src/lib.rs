//! # markdown-embeds-engine
//!
//! Turns chat-flavored markdown into size-bounded embed containers and
//! messages, and turns containers back into markdown.
//!
//! ## Architecture Overview
//!
//! ```text
//! source → syntax::parse_document → flatten → pack → decorate → Rendered
//!                                      │                          │
//!                                 Serializer                 messages()
//!                              (leaf text, commands)
//!
//! Vec<Embed> | Message → reverse → markdown
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! markdown-embeds-engine/
//! ├── lib.rs          # This file - public API
//! ├── error.rs        # RenderError, RenderLimitError, EvalError
//! ├── evaluator.rs    # Evaluator trait, layered Context, CommandTable
//! ├── options.rs      # RenderOptions, Flavor, list markers
//! ├── serialize.rs    # Node → text per flavor
//! ├── reverse.rs      # Containers → markdown
//! ├── models/         # Embed and Message payload types
//! └── render/         # flatten, pack, decorate, group
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use markdown_embeds_engine::{CommandTable, RenderOptions, render};
//!
//! let rendered = render("# Title\nBody text", &RenderOptions::default(), &CommandTable::new()).unwrap();
//!
//! assert_eq!(rendered.embeds[0].title.as_deref(), Some("Title"));
//! assert_eq!(rendered.embeds[0].description.as_deref(), Some("Body text"));
//! assert_eq!(rendered.messages().len(), 1);
//! ```

pub mod error;
pub mod evaluator;
pub mod models;
pub mod options;
pub mod render;
pub mod reverse;
pub mod serialize;

pub use error::{EvalError, LimitKind, RenderError, RenderLimitError};
pub use evaluator::{Command, CommandFn, CommandTable, Context, Evaluated, Evaluator};
pub use models::*;
pub use options::{Flavor, ListMarkers, RenderOptions};
pub use render::{Primitive, Rendered, TitleKind, render_document};
pub use reverse::{reverse_embeds, reverse_message, reverse_value};

use markdown_embeds_syntax::parse_document_with_limit;

/// Parse and render `source` in one call.
pub fn render(
    source: &str,
    options: &RenderOptions,
    evaluator: &dyn Evaluator,
) -> Result<Rendered, RenderError> {
    let document = parse_document_with_limit(source, options.max_depth)?;
    render_document(&document, options, evaluator)
}
