//! Stage B: greedy packing of primitives into embed containers.
//!
//! Primitives are first paired up: a title takes the body that immediately
//! follows it. The pairs are then placed one at a time against a single open
//! container:
//!
//! | unit | placement |
//! |------|-----------|
//! | image | image slot of the open container (a new one if none or taken) |
//! | `#!` title | always a new container with title + description |
//! | `#` title, nothing open | new container with title + description |
//! | titled pair that fits | appended as a field |
//! | titled pair that overflows | new container (`#-` keeps its field shape) |
//! | body | merged into the description or last field, else a blank-named field, else a new container |
//!
//! A container overflows when it has an image, 25 fields, or would pass
//! 6000 characters. A merge must also keep the description within 4096 or
//! the field value within 1024.
//!
//! Author and footer text count toward the 6000. The author is attached when
//! a container opens. Footers are applied later, so each container reserves
//! room for the footer it may receive: its cyclic entry, the `all` footer, or
//! a scalar footer (which lands on the last container, not yet known).
//! A container whose opening content plus decorations already passes 6000
//! is a [`LimitKind::Container`] error.

use crate::error::{LimitKind, RenderLimitError};
use crate::models::{
    Author, DESCRIPTION_LIMIT, EMBED_TEXT_LIMIT, Embed, FIELD_COUNT_LIMIT, FIELD_VALUE_LIMIT,
    Field, Footer, Image,
};
use crate::options::Flavor;

use super::decorate::{Anchor, Decorations, Targeting};
use super::primitive::{Primitive, TitleKind};

/// Minimum packed length charged for the blank-field placeholder.
pub const PLACEHOLDER_WEIGHT: usize = 3;

/// Packed length of the placeholder: never below [`PLACEHOLDER_WEIGHT`], and
/// never below what the platform will count.
fn placeholder_len(flavor: Flavor) -> usize {
    PLACEHOLDER_WEIGHT.max(chars(flavor.placeholder()))
}

#[derive(Debug, Clone, Copy)]
struct BodyRef<'p> {
    text: &'p str,
    gap: usize,
}

#[derive(Debug)]
enum Unit<'p> {
    Image(&'p str),
    Titled {
        text: &'p str,
        kind: TitleKind,
        url: Option<&'p str>,
        body: Option<BodyRef<'p>>,
    },
    Body(BodyRef<'p>),
}

fn chars(text: &str) -> usize {
    text.chars().count()
}

/// Pair titles with their bodies. The last front-matter primitive wins.
fn units(primitives: &[Primitive]) -> (Vec<Unit<'_>>, Decorations) {
    let mut units = Vec::new();
    let mut decorations = Decorations::default();
    let mut iter = primitives.iter().peekable();

    while let Some(primitive) = iter.next() {
        match primitive {
            Primitive::FrontMatter(data) => decorations = Decorations::from_front_matter(data),
            Primitive::Image { url } => units.push(Unit::Image(url)),
            Primitive::Title { text, kind, url } => {
                let body = match iter.peek() {
                    Some(Primitive::Body { text, gap }) => {
                        iter.next();
                        Some(BodyRef { text, gap: *gap })
                    }
                    _ => None,
                };
                units.push(Unit::Titled {
                    text,
                    kind: *kind,
                    url: url.as_deref(),
                    body,
                });
            }
            Primitive::Body { text, gap } => units.push(Unit::Body(BodyRef { text, gap: *gap })),
        }
    }
    (units, decorations)
}

/// Pack `primitives` into containers, returning them with the decorations
/// found in the front-matter. The author decoration is applied here because
/// it counts toward each container's size.
pub fn pack(
    primitives: &[Primitive],
    flavor: Flavor,
) -> Result<(Vec<Embed>, Decorations), RenderLimitError> {
    let (units, decorations) = units(primitives);
    decorations.check_limits()?;
    let mut packer = Packer {
        flavor,
        author: decorations.author.as_ref(),
        footer: decorations.footer.as_ref(),
        embeds: Vec::new(),
        current: None,
        gap: 0,
    };

    for unit in units {
        match unit {
            Unit::Image(url) => packer.image(url)?,
            Unit::Titled {
                text,
                kind,
                url,
                body,
            } => packer.titled(text, kind, url, body)?,
            Unit::Body(body) => packer.body(body)?,
        }
    }

    let embeds = packer.finish();
    log::debug!("packed {} containers", embeds.len());
    Ok((embeds, decorations))
}

struct Packer<'a> {
    flavor: Flavor,
    author: Option<&'a Targeting<Author>>,
    footer: Option<&'a Targeting<Footer>>,
    embeds: Vec<Embed>,
    current: Option<Embed>,
    /// Gap of the most recently placed body.
    gap: usize,
}

/// Length of `embed` as the packer accounts for it.
fn packed_len(flavor: Flavor, embed: &Embed) -> usize {
    let weight = |text: &str| {
        if text == flavor.placeholder() {
            placeholder_len(flavor)
        } else {
            chars(text)
        }
    };
    embed.title.as_deref().map_or(0, chars)
        + embed.description.as_deref().map_or(0, chars)
        + embed
            .fields
            .iter()
            .map(|f| weight(&f.name) + weight(&f.value))
            .sum::<usize>()
        + embed.author.as_ref().map_or(0, |a| chars(&a.name))
}

impl Packer<'_> {
    /// Footer characters container `index` keeps free.
    fn reserved(&self, index: usize) -> usize {
        match self.footer {
            None => 0,
            Some(Targeting::Single(footer)) => chars(&footer.text),
            Some(targeting) => targeting
                .pick(index, Anchor::Every)
                .map_or(0, |footer| chars(&footer.text)),
        }
    }

    /// Flush the open container and start `embed`.
    fn open(&mut self, mut embed: Embed) -> Result<(), RenderLimitError> {
        if let Some(done) = self.current.take() {
            self.embeds.push(done);
        }
        let index = self.embeds.len();
        if let Some(author) = self.author.and_then(|a| a.pick(index, Anchor::First)) {
            embed.author = Some(author);
        }

        let length = packed_len(self.flavor, &embed) + self.reserved(index);
        if length > EMBED_TEXT_LIMIT {
            let text = embed
                .title
                .as_deref()
                .or(embed.description.as_deref())
                .or(embed.fields.first().map(|f| f.value.as_str()))
                .unwrap_or("");
            return Err(RenderLimitError::container(length, text));
        }

        log::trace!("opened container {index}");
        self.current = Some(embed);
        Ok(())
    }

    fn finish(mut self) -> Vec<Embed> {
        if let Some(done) = self.current.take() {
            self.embeds.push(done);
        }
        self.embeds
    }

    fn field(&self, name: &str, body: Option<BodyRef<'_>>, inline: bool) -> Field {
        Field {
            name: name.to_string(),
            value: body
                .map(|b| b.text)
                .filter(|text| !text.is_empty())
                .unwrap_or(self.flavor.placeholder())
                .to_string(),
            inline,
        }
    }

    fn image(&mut self, url: &str) -> Result<(), RenderLimitError> {
        if self.current.as_ref().is_none_or(|e| e.image.is_some()) {
            self.open(Embed::default())?;
        }
        if let Some(embed) = self.current.as_mut() {
            embed.image = Some(Image {
                url: url.to_string(),
            });
        }
        Ok(())
    }

    fn titled(
        &mut self,
        text: &str,
        kind: TitleKind,
        url: Option<&str>,
        body: Option<BodyRef<'_>>,
    ) -> Result<(), RenderLimitError> {
        RenderLimitError::check(LimitKind::Title, text)?;
        if let Some(body) = body {
            RenderLimitError::check(LimitKind::Description, body.text)?;
        }
        let body_len = body.map_or(0, |b| chars(b.text));
        let field_len = chars(text) + if body_len == 0 {
            placeholder_len(self.flavor)
        } else {
            body_len
        };
        self.gap = body.map_or(0, |b| b.gap);

        let titled_embed = || Embed {
            title: Some(text.to_string()),
            description: body.map(|b| b.text.to_string()),
            url: url.map(str::to_string),
            ..Default::default()
        };

        if kind == TitleKind::Embed || (self.current.is_none() && kind == TitleKind::Plain) {
            return self.open(titled_embed());
        }

        let reserve = self.reserved(self.embeds.len());
        let overflows = match &self.current {
            None => true,
            Some(embed) => {
                embed.image.is_some()
                    || embed.fields.len() >= FIELD_COUNT_LIMIT
                    || body_len > FIELD_VALUE_LIMIT
                    || packed_len(self.flavor, embed) + reserve + field_len > EMBED_TEXT_LIMIT
            }
        };

        if overflows {
            if kind == TitleKind::Inline {
                if let Some(body) = body {
                    RenderLimitError::check(LimitKind::FieldValue, body.text)?;
                }
                log::trace!("inline title {text:?} overflows, new container");
                let field = self.field(text, body, true);
                return self.open(Embed {
                    fields: vec![field],
                    ..Default::default()
                });
            }
            log::trace!("title {text:?} overflows, new container");
            return self.open(titled_embed());
        }

        let field = self.field(text, body, kind == TitleKind::Inline);
        if let Some(embed) = self.current.as_mut() {
            embed.fields.push(field);
        }
        Ok(())
    }

    fn body(&mut self, body: BodyRef<'_>) -> Result<(), RenderLimitError> {
        RenderLimitError::check(LimitKind::Description, body.text)?;
        let len = chars(body.text);
        let joiner = self.flavor.line_break().repeat(self.gap.min(body.gap));
        let joiner_len = chars(&joiner);
        let flavor = self.flavor;
        let reserve = self.reserved(self.embeds.len());
        self.gap = body.gap;

        if let Some(embed) = self.current.as_mut()
            && embed.image.is_none()
        {
            let total = packed_len(flavor, embed) + reserve;
            if embed.fields.is_empty() {
                let (current_len, added) = match &embed.description {
                    Some(description) => (chars(description), joiner_len + len),
                    None => (0, len),
                };
                if current_len + added <= DESCRIPTION_LIMIT && total + added <= EMBED_TEXT_LIMIT {
                    match &mut embed.description {
                        Some(description) => {
                            description.push_str(&joiner);
                            description.push_str(body.text);
                        }
                        None => embed.description = Some(body.text.to_string()),
                    }
                    return Ok(());
                }
            } else if let Some(last) = embed.fields.last_mut() {
                // A placeholder value is replaced rather than extended.
                let blank = last.value == flavor.placeholder();
                let (current_len, added, freed) = if blank {
                    (0, len, placeholder_len(flavor))
                } else {
                    (chars(&last.value), joiner_len + len, 0)
                };
                if current_len + added <= FIELD_VALUE_LIMIT
                    && total - freed + added <= EMBED_TEXT_LIMIT
                {
                    if blank {
                        last.value = body.text.to_string();
                    } else {
                        last.value.push_str(&joiner);
                        last.value.push_str(body.text);
                    }
                    return Ok(());
                }
            }
        }

        let overflows = match &self.current {
            None => true,
            Some(embed) => {
                embed.image.is_some()
                    || len > FIELD_VALUE_LIMIT
                    || embed.fields.len() >= FIELD_COUNT_LIMIT
                    || packed_len(flavor, embed) + reserve + placeholder_len(flavor) + len
                        > EMBED_TEXT_LIMIT
            }
        };

        if overflows {
            log::trace!("body of {len} chars overflows, new container");
            return self.open(Embed {
                description: Some(body.text.to_string()),
                ..Default::default()
            });
        }

        let field = Field {
            name: flavor.placeholder().to_string(),
            value: body.text.to_string(),
            inline: false,
        };
        if let Some(embed) = self.current.as_mut() {
            embed.fields.push(field);
        }
        Ok(())
    }
}
