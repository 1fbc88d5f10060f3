/*!
 * # Rendering Pipeline
 *
 * A parsed [`Document`] becomes embed containers in four stages:
 *
 * 1. **Flatten** ([`primitive`]): block nodes become an ordered list of
 *    [`Primitive`]s (titles, bodies, images, front-matter). Commands are
 *    evaluated here.
 * 2. **Pack** ([`pack`]): a greedy single pass places primitives into
 *    containers under the per-field, per-container and field-count limits.
 * 3. **Decorate** ([`decorate`]): front-matter `color`, `footer`,
 *    `thumbnail` and `timestamp` are applied by their targeting rules.
 * 4. **Group** ([`messages`]): containers are bundled into messages on
 *    demand through [`Rendered::messages`].
 *
 * Each stage takes the previous stage's output by reference and returns a
 * new value; nothing is shared across documents.
 */

pub mod decorate;
pub mod messages;
pub mod pack;
pub mod primitive;

pub use decorate::{Anchor, Decorations, Targeting};
pub use messages::group_messages;
pub use pack::pack;
pub use primitive::{Primitive, TitleKind, flatten};

use markdown_embeds_syntax::Document;
use serde::Serialize;

use crate::error::RenderError;
use crate::evaluator::{Context, Evaluator};
use crate::models::{Embed, Message};
use crate::options::RenderOptions;
use crate::serialize::Serializer;

/// The containers produced for one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Rendered {
    pub embeds: Vec<Embed>,
    #[serde(skip)]
    decorations: Decorations,
}

impl Rendered {
    /// Group the containers into messages.
    pub fn messages(&self) -> Vec<Message> {
        group_messages(&self.embeds, &self.decorations)
    }

    pub fn decorations(&self) -> &Decorations {
        &self.decorations
    }
}

/// Render an already parsed document.
pub fn render_document(
    document: &Document,
    options: &RenderOptions,
    evaluator: &dyn Evaluator,
) -> Result<Rendered, RenderError> {
    let front_matter = document.front_matter.as_ref();
    let serializer = Serializer::new(
        options.flavor,
        options.list_markers(front_matter),
        evaluator,
        Context::new(front_matter, Some(&options.variables)),
    );

    let primitives = flatten(document, &serializer);
    let (mut embeds, decorations) = pack(&primitives, options.flavor)?;
    decorations.apply(&mut embeds);

    Ok(Rendered {
        embeds,
        decorations,
    })
}
