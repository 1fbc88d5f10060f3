//! Stage C: front-matter decorations and their targeting rules.
//!
//! Every decoration key accepts three shapes:
//!
//! - a scalar (or plain object) - placed on one boundary container, except
//!   `color`, which goes everywhere
//! - an object with `all: true` - placed on every container
//! - an array - entry `i % len` goes on container `i`; `null` entries skip
//!
//! | key | scalar lands on |
//! |-----|-----------------|
//! | `author` | first container (applied while packing) |
//! | `thumbnail` | first container |
//! | `footer`, `timestamp` | last container |
//! | `color` | every container |
//! | `content` | first message |

use markdown_embeds_syntax::FrontMatter;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{LimitKind, RenderLimitError};
use crate::models::{Author, Embed, Footer, Thumbnail};

/// Where a scalar decoration lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    First,
    /// The last of this many targets.
    Last(usize),
    Every,
}

/// A decoration value with its targeting rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Targeting<T> {
    Single(T),
    All(T),
    Cycle(Vec<Option<T>>),
}

impl<T> Targeting<T> {
    /// Read a front-matter value, decoding each entry with `entry`.
    pub fn parse(value: &Value, entry: impl Fn(&Value) -> Option<T>) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Array(items) if items.is_empty() => None,
            Value::Array(items) => Some(Targeting::Cycle(
                items
                    .iter()
                    .map(|item| if item.is_null() { None } else { entry(item) })
                    .collect(),
            )),
            Value::Object(map) if map.get("all").and_then(Value::as_bool) == Some(true) => {
                entry(value).map(Targeting::All)
            }
            other => entry(other).map(Targeting::Single),
        }
    }

    /// Every value this can place, in order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        let (single, cycle): (Option<&T>, &[Option<T>]) = match self {
            Targeting::Single(value) | Targeting::All(value) => (Some(value), &[][..]),
            Targeting::Cycle(entries) => (None, entries.as_slice()),
        };
        single.into_iter().chain(cycle.iter().flatten())
    }
}

impl<T: Clone> Targeting<T> {
    /// The value for target `index`, if any.
    pub fn pick(&self, index: usize, anchor: Anchor) -> Option<T> {
        match self {
            Targeting::Single(value) => {
                let hit = match anchor {
                    Anchor::First => index == 0,
                    Anchor::Last(count) => index + 1 == count,
                    Anchor::Every => true,
                };
                hit.then(|| value.clone())
            }
            Targeting::All(value) => Some(value.clone()),
            Targeting::Cycle(entries) => entries.get(index % entries.len().max(1))?.clone(),
        }
    }
}

/// Everything front-matter contributes beyond the body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decorations {
    pub author: Option<Targeting<Author>>,
    pub footer: Option<Targeting<Footer>>,
    pub thumbnail: Option<Targeting<Thumbnail>>,
    pub color: Option<Targeting<u32>>,
    pub timestamp: Option<Targeting<String>>,
    pub content: Option<Targeting<String>>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub allowed_mentions: Option<Value>,
    pub ephemeral: Option<bool>,
}

fn decode<T: DeserializeOwned>(key: &str, value: &Value) -> Option<T> {
    serde_json::from_value(value.clone())
        .map_err(|err| log::warn!("ignoring front-matter `{key}` entry: {err}"))
        .ok()
}

fn author_entry(value: &Value) -> Option<Author> {
    match value {
        Value::String(name) => Some(Author {
            name: name.clone(),
            ..Default::default()
        }),
        other => decode("author", other),
    }
}

fn footer_entry(value: &Value) -> Option<Footer> {
    match value {
        Value::String(text) => Some(Footer {
            text: text.clone(),
            ..Default::default()
        }),
        other => decode("footer", other),
    }
}

fn thumbnail_entry(value: &Value) -> Option<Thumbnail> {
    match value {
        Value::String(url) => Some(Thumbnail { url: url.clone() }),
        other => decode("thumbnail", other),
    }
}

/// An integer, or a `#rrggbb` string.
pub fn parse_color(value: &Value) -> Option<u32> {
    let color = match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => {
            let hex = s.strip_prefix('#').unwrap_or(s);
            if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
                u32::from_str_radix(hex, 16).ok()
            } else {
                None
            }
        }
        _ => None,
    };
    if color.is_none() {
        log::warn!("ignoring front-matter color {value}");
    }
    color
}

fn timestamp_entry(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        other => {
            log::warn!("ignoring front-matter timestamp {other}");
            None
        }
    }
}

fn content_entry(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("text").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn targeted<T>(
    data: &FrontMatter,
    key: &str,
    entry: impl Fn(&Value) -> Option<T>,
) -> Option<Targeting<T>> {
    data.get(key).and_then(|value| Targeting::parse(value, entry))
}

impl Decorations {
    pub fn from_front_matter(data: &FrontMatter) -> Self {
        let string = |key: &str| data.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            author: targeted(data, "author", author_entry),
            footer: targeted(data, "footer", footer_entry),
            thumbnail: targeted(data, "thumbnail", thumbnail_entry),
            color: targeted(data, "color", parse_color),
            timestamp: targeted(data, "timestamp", timestamp_entry),
            content: targeted(data, "content", content_entry),
            username: string("username"),
            avatar_url: string("avatar_url"),
            allowed_mentions: data.get("allowed_mentions").filter(|v| !v.is_null()).cloned(),
            ephemeral: data.get("ephemeral").and_then(Value::as_bool),
        }
    }

    /// Reject author names and footer texts over their platform ceilings.
    pub fn check_limits(&self) -> Result<(), RenderLimitError> {
        for author in self.author.iter().flat_map(|t| t.values()) {
            RenderLimitError::check(LimitKind::AuthorName, &author.name)?;
        }
        for footer in self.footer.iter().flat_map(|t| t.values()) {
            RenderLimitError::check(LimitKind::FooterText, &footer.text)?;
        }
        Ok(())
    }

    /// Apply color, footer, thumbnail and timestamp to packed containers.
    pub fn apply(&self, embeds: &mut [Embed]) {
        let count = embeds.len();
        for (i, embed) in embeds.iter_mut().enumerate() {
            if let Some(color) = self.color.as_ref().and_then(|t| t.pick(i, Anchor::Every)) {
                embed.color = Some(color);
            }
            if let Some(footer) = self.footer.as_ref().and_then(|t| t.pick(i, Anchor::Last(count))) {
                embed.footer = Some(footer);
            }
            if let Some(thumbnail) = self.thumbnail.as_ref().and_then(|t| t.pick(i, Anchor::First)) {
                embed.thumbnail = Some(thumbnail);
            }
            if let Some(timestamp) = self
                .timestamp
                .as_ref()
                .and_then(|t| t.pick(i, Anchor::Last(count)))
            {
                embed.timestamp = Some(timestamp);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn front(value: Value) -> FrontMatter {
        serde_json::from_value(value).unwrap()
    }

    #[rstest]
    #[case(json!(0xff0000), Some(0xff0000))]
    #[case(json!("#ff0000"), Some(0xff0000))]
    #[case(json!("00FF7f"), Some(0x00ff7f))]
    #[case(json!("#fff"), None)]
    #[case(json!("red"), None)]
    #[case(json!(-1), None)]
    fn colors(#[case] value: Value, #[case] expected: Option<u32>) {
        assert_eq!(parse_color(&value), expected);
    }

    #[test]
    fn targeting_shapes() {
        assert_eq!(
            Targeting::parse(&json!("x"), timestamp_entry),
            Some(Targeting::Single("x".to_string()))
        );
        assert_eq!(
            Targeting::parse(&json!({"name": "Bot", "all": true}), author_entry),
            Some(Targeting::All(Author {
                name: "Bot".into(),
                ..Default::default()
            }))
        );
        assert_eq!(
            Targeting::parse(&json!(["a", null]), timestamp_entry),
            Some(Targeting::Cycle(vec![Some("a".to_string()), None]))
        );
        assert_eq!(Targeting::parse(&json!([]), timestamp_entry), None);
    }

    #[test]
    fn pick_by_anchor() {
        let single = Targeting::Single(1);
        assert_eq!(single.pick(0, Anchor::First), Some(1));
        assert_eq!(single.pick(1, Anchor::First), None);
        assert_eq!(single.pick(2, Anchor::Last(3)), Some(1));
        assert_eq!(single.pick(0, Anchor::Last(3)), None);
        assert_eq!(Targeting::All(1).pick(7, Anchor::First), Some(1));
        let cycle = Targeting::Cycle(vec![Some(1), Some(2)]);
        assert_eq!(cycle.pick(3, Anchor::First), Some(2));
    }

    #[test]
    fn apply_scalar_decorations() {
        let decorations = Decorations::from_front_matter(&front(json!({
            "color": "#00ff00",
            "footer": "bye",
            "thumbnail": "https://x/t.png",
            "timestamp": "2024-01-01T00:00:00Z"
        })));
        let mut embeds = vec![Embed::default(), Embed::default(), Embed::default()];
        decorations.apply(&mut embeds);

        assert!(embeds.iter().all(|e| e.color == Some(0x00ff00)));
        assert_eq!(embeds[0].thumbnail.as_ref().unwrap().url, "https://x/t.png");
        assert_eq!(embeds[1].thumbnail, None);
        assert_eq!(embeds[2].footer.as_ref().unwrap().text, "bye");
        assert_eq!(embeds[0].footer, None);
        assert_eq!(embeds[2].timestamp.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn apply_all_and_cyclic() {
        let decorations = Decorations::from_front_matter(&front(json!({
            "footer": {"text": "f", "all": true},
            "color": [1, 2]
        })));
        let mut embeds = vec![Embed::default(); 3];
        decorations.apply(&mut embeds);

        assert!(embeds.iter().all(|e| e.footer.as_ref().unwrap().text == "f"));
        let colors: Vec<_> = embeds.iter().map(|e| e.color).collect();
        assert_eq!(colors, vec![Some(1), Some(2), Some(1)]);
    }

    #[test]
    fn overlong_decoration_text_is_a_limit_error() {
        let decorations = Decorations::from_front_matter(&front(json!({
            "author": [null, "a".repeat(257)]
        })));
        let err = decorations.check_limits().unwrap_err();
        assert_eq!(err.kind, LimitKind::AuthorName);

        let decorations = Decorations::from_front_matter(&front(json!({
            "footer": {"text": "f".repeat(2049), "all": true}
        })));
        assert_eq!(decorations.check_limits().unwrap_err().kind, LimitKind::FooterText);

        let decorations = Decorations::from_front_matter(&front(json!({
            "author": "a".repeat(256),
            "footer": "f".repeat(2048)
        })));
        assert!(decorations.check_limits().is_ok());
    }

    #[test]
    fn message_keys_are_read() {
        let decorations = Decorations::from_front_matter(&front(json!({
            "username": "bot",
            "ephemeral": true,
            "allowed_mentions": {"parse": []},
            "content": {"text": "hi", "all": true}
        })));
        assert_eq!(decorations.username.as_deref(), Some("bot"));
        assert_eq!(decorations.ephemeral, Some(true));
        assert_eq!(decorations.allowed_mentions, Some(json!({"parse": []})));
        assert_eq!(decorations.content, Some(Targeting::All("hi".into())));
    }
}
