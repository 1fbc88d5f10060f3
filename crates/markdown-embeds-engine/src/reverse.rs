//! Turning containers back into markdown.
//!
//! The output is a front-matter block (when any decoration is present)
//! followed by the body. Re-rendering it yields containers with the same
//! title, description and field text for containers this crate packed; it
//! is not a syntax round-trip.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::models::{Embed, Field, Message};
use crate::options::Flavor;

const FENCE: &str = "```";

fn line_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\s*)([-*+] |\d+\. |#|>)").expect("Invalid line-start regex")
    })
}

/// Spans that re-render as written: inline code and link targets.
fn verbatim_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"`[^`\n]+`|\]\([^)\n]*\)").expect("Invalid verbatim regex"))
}

/// Backslash-escape what would otherwise re-render as an escape, a command
/// or a comment. Inline code and link targets are left alone.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for span in verbatim_re().find_iter(text) {
        out.push_str(&escape_plain(&text[last..span.start()]));
        out.push_str(span.as_str());
        last = span.end();
    }
    out.push_str(&escape_plain(&text[last..]));
    out
}

fn escape_plain(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('{', "\\{")
        .replace("<!--", "\\<!--")
}

/// Reverse a sequence of containers.
pub fn reverse_embeds(embeds: &[Embed]) -> String {
    let data = front_matter(embeds);
    assemble(&data, embeds)
}

/// Reverse a message, including its message-level settings.
pub fn reverse_message(message: &Message) -> String {
    let mut data = front_matter(&message.embeds);
    let mut put = |key: &str, value: Option<Value>| {
        if let Some(value) = value {
            data.insert(key.to_string(), value);
        }
    };
    put("content", message.content.clone().map(Value::String));
    put("username", message.username.clone().map(Value::String));
    put("avatar_url", message.avatar_url.clone().map(Value::String));
    put("allowed_mentions", message.allowed_mentions.clone());
    put("ephemeral", message.ephemeral.map(Value::Bool));
    assemble(&data, &message.embeds)
}

/// Reverse platform JSON: an array of containers, a message object with
/// `embeds`, or a single container object.
pub fn reverse_value(value: &Value) -> Result<String, serde_json::Error> {
    match value {
        Value::Array(_) => {
            let embeds: Vec<Embed> = serde_json::from_value(value.clone())?;
            Ok(reverse_embeds(&embeds))
        }
        Value::Object(map) if map.contains_key("embeds") => {
            let message: Message = serde_json::from_value(value.clone())?;
            Ok(reverse_message(&message))
        }
        _ => {
            let embed: Embed = serde_json::from_value(value.clone())?;
            Ok(reverse_embeds(std::slice::from_ref(&embed)))
        }
    }
}

fn assemble(data: &Map<String, Value>, embeds: &[Embed]) -> String {
    let body = embeds
        .iter()
        .map(container)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    if data.is_empty() {
        return body;
    }
    match serde_yaml::to_string(data) {
        Ok(yaml) => format!("---\n{yaml}---\n\n{body}"),
        Err(err) => {
            log::warn!("could not encode front-matter, dropping it: {err}");
            body
        }
    }
}

/// Body markdown for one container.
fn container(embed: &Embed) -> String {
    let mut parts = Vec::new();

    let title = embed.title.as_deref().map(escape_text).map(|title| match &embed.url {
        Some(url) => format!("#![{title}]({url})"),
        None => format!("#!{title}"),
    });
    let description = embed.description.as_deref().map(hard_breaks);
    match (title, description) {
        (Some(title), Some(description)) => parts.push(format!("{title}\n{description}")),
        (Some(title), None) => parts.push(title),
        (None, Some(description)) => parts.push(description),
        (None, None) => {}
    }

    parts.extend(embed.fields.iter().filter_map(field));

    if let Some(image) = &embed.image {
        parts.push(format!("![image]({})", image.url));
    }
    parts.join("\n\n")
}

fn is_placeholder(text: &str) -> bool {
    text == Flavor::Markdown.placeholder() || text == Flavor::Html.placeholder()
}

fn field(field: &Field) -> Option<String> {
    let value = (!is_placeholder(&field.value)).then(|| hard_breaks(&field.value));
    if is_placeholder(&field.name) {
        return value;
    }
    let name = escape_text(&field.name);
    let heading = if field.inline {
        format!("#-{name}")
    } else {
        format!("# {name}")
    };
    Some(match value {
        Some(value) => format!("{heading}\n{value}"),
        None => heading,
    })
}

/// Rewrite single newlines as escaped hard breaks and escape line-start
/// markers and [`escape_text`] characters. Lines in or next to a code fence
/// keep plain newlines and are not escaped.
fn hard_breaks(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut out = String::with_capacity(text.len());
    let mut in_fence = false;

    for (i, line) in lines.iter().enumerate() {
        let fenced = line.contains(FENCE);
        if i > 0 {
            let prev = lines[i - 1];
            let plain = in_fence
                || fenced
                || prev.contains(FENCE)
                || line.trim().is_empty()
                || prev.trim().is_empty();
            out.push_str(if plain { "\n" } else { "\\\n" });
        }
        if in_fence || fenced {
            out.push_str(line);
        } else {
            out.push_str(&line_start_re().replace(&escape_text(line), "$1\\$2"));
        }
        if line.matches(FENCE).count() % 2 == 1 {
            in_fence = !in_fence;
        }
    }
    out
}

/// Which container a scalar decoration lands on.
#[derive(Clone, Copy)]
enum Boundary {
    First,
    Last,
}

/// Rebuild a targeted decoration from what each container carries.
///
/// `compact` gives the scalar form; `object` the form that can carry
/// `all: true`, when the key has one.
fn targeting<T: PartialEq>(
    values: &[Option<&T>],
    boundary: Boundary,
    compact: impl Fn(&T) -> Value,
    object: impl Fn(&T) -> Option<Map<String, Value>>,
) -> Option<Value> {
    let present: Vec<usize> = (0..values.len()).filter(|&i| values[i].is_some()).collect();
    let first = values.iter().flatten().next()?;

    let boundary_index = match boundary {
        Boundary::First => 0,
        Boundary::Last => values.len() - 1,
    };
    if present == [boundary_index] {
        return Some(compact(*first));
    }

    let uniform = present.len() == values.len() && values.iter().flatten().all(|v| v == first);
    if uniform && let Some(mut map) = object(*first) {
        map.insert("all".to_string(), Value::Bool(true));
        return Some(Value::Object(map));
    }

    Some(Value::Array(
        values
            .iter()
            .map(|v| v.map_or(Value::Null, &compact))
            .collect(),
    ))
}

/// An object, or just its primary string when nothing else is set.
fn compact_entry(value: &impl Serialize, primary: &str) -> Value {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) if map.len() == 1 && map.contains_key(primary) => {
            map.get(primary).cloned().unwrap_or(Value::Null)
        }
        Ok(other) => other,
        Err(_) => Value::Null,
    }
}

fn object_entry(value: &impl Serialize) -> Option<Map<String, Value>> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn color(embeds: &[Embed]) -> Option<Value> {
    let colors: Vec<Option<u32>> = embeds.iter().map(|e| e.color).collect();
    let first = colors.iter().flatten().next()?;
    let hex = |c: u32| json!(format!("#{c:06x}"));
    if colors.iter().all(|c| c.as_ref() == Some(first)) {
        Some(hex(*first))
    } else {
        Some(Value::Array(
            colors.iter().map(|c| c.map_or(Value::Null, hex)).collect(),
        ))
    }
}

fn front_matter(embeds: &[Embed]) -> Map<String, Value> {
    let mut data = Map::new();
    if embeds.is_empty() {
        return data;
    }

    let authors: Vec<_> = embeds.iter().map(|e| e.author.as_ref()).collect();
    let footers: Vec<_> = embeds.iter().map(|e| e.footer.as_ref()).collect();
    let thumbnails: Vec<_> = embeds.iter().map(|e| e.thumbnail.as_ref()).collect();
    let timestamps: Vec<_> = embeds.iter().map(|e| e.timestamp.as_ref()).collect();

    let entries = [
        (
            "author",
            targeting(
                &authors,
                Boundary::First,
                |a| compact_entry(a, "name"),
                object_entry,
            ),
        ),
        (
            "footer",
            targeting(
                &footers,
                Boundary::Last,
                |f| compact_entry(f, "text"),
                object_entry,
            ),
        ),
        (
            "thumbnail",
            targeting(
                &thumbnails,
                Boundary::First,
                |t| compact_entry(t, "url"),
                object_entry,
            ),
        ),
        ("color", color(embeds)),
        (
            "timestamp",
            targeting(
                &timestamps,
                Boundary::Last,
                |t| Value::String(t.clone()),
                |_| None,
            ),
        ),
    ];
    for (key, value) in entries {
        if let Some(value) = value {
            data.insert(key.to_string(), value);
        }
    }
    data
}
