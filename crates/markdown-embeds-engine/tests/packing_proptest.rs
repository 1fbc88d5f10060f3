//! Packing limits hold for arbitrary mixes of titles, bodies, lists and
//! images, under arbitrary author, footer and content decorations.

use markdown_embeds_engine::{
    CommandTable, DESCRIPTION_LIMIT, EMBED_TEXT_LIMIT, FIELD_COUNT_LIMIT, FIELD_VALUE_LIMIT, Flavor,
    MESSAGE_EMBED_LIMIT, MESSAGE_TEXT_LIMIT, RenderError, RenderOptions, TITLE_LIMIT, render,
};
use proptest::prelude::*;
use serde_json::{Map, Value, json};

fn block_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z ]{1,60}".prop_map(|t| format!("# {t}")),
        "[a-z ]{1,60}".prop_map(|t| format!("#-{t}")),
        "[a-z ]{1,60}".prop_map(|t| format!("#!{t}")),
        (1usize..1000).prop_map(|n| "w".repeat(n)),
        prop::collection::vec("[a-z]{1,12}", 1..6).prop_map(|words| words.join(" ")),
        prop::collection::vec("[a-z]{1,10}", 1..5).prop_map(|items| {
            items
                .iter()
                .map(|item| format!("- {item}"))
                .collect::<Vec<_>>()
                .join("\n")
        }),
        "[a-z]{1,12}".prop_map(|name| format!("![img](https://x/{name}.png)")),
    ]
}

/// A decoration value in any targeting shape: scalar, `all` object or cycle.
fn decoration_strategy(max_len: usize) -> impl Strategy<Value = Option<Value>> {
    let text = prop_oneof![1usize..40, 1..=max_len].prop_map(|n| Value::String("d".repeat(n)));
    prop_oneof![
        Just(None),
        text.clone().prop_map(Some),
        text.clone()
            .prop_map(|t| Some(json!({"name": t.clone(), "text": t, "all": true}))),
        prop::collection::vec(prop::option::of(text), 1..4).prop_map(|entries| {
            Some(Value::Array(
                entries
                    .into_iter()
                    .map(|entry| entry.unwrap_or(Value::Null))
                    .collect(),
            ))
        }),
    ]
}

fn front_matter_strategy() -> impl Strategy<Value = String> {
    (
        decoration_strategy(300),
        decoration_strategy(2100),
        decoration_strategy(100),
    )
        .prop_map(|(author, footer, content)| {
            let mut data = Map::new();
            for (key, value) in [("author", author), ("footer", footer), ("content", content)] {
                if let Some(value) = value {
                    data.insert(key.to_string(), value);
                }
            }
            match serde_yaml::to_string(&data) {
                Ok(yaml) if !data.is_empty() => format!("---\n{yaml}---\n\n"),
                _ => String::new(),
            }
        })
}

fn document_strategy() -> impl Strategy<Value = String> {
    (
        front_matter_strategy(),
        prop::collection::vec(block_strategy(), 0..120),
    )
        .prop_map(|(front_matter, blocks)| front_matter + &blocks.join("\n\n"))
}

fn check_limits(source: &str, flavor: Flavor) -> Result<(), TestCaseError> {
    let options = RenderOptions {
        flavor,
        ..Default::default()
    };
    let rendered = match render(source, &options, &CommandTable::new()) {
        Ok(rendered) => rendered,
        Err(RenderError::Limit(_)) => return Ok(()),
        Err(other) => return Err(TestCaseError::fail(other.to_string())),
    };

    for embed in &rendered.embeds {
        let chars = |s: &Option<String>| s.as_deref().map_or(0, |s| s.chars().count());
        prop_assert!(chars(&embed.title) <= TITLE_LIMIT);
        prop_assert!(chars(&embed.description) <= DESCRIPTION_LIMIT);
        prop_assert!(embed.fields.len() <= FIELD_COUNT_LIMIT);
        for field in &embed.fields {
            prop_assert!(field.value.chars().count() <= FIELD_VALUE_LIMIT);
        }
        prop_assert!(embed.text_len() <= EMBED_TEXT_LIMIT);
    }

    let messages = rendered.messages();
    let total: usize = messages.iter().map(|m| m.embeds.len()).sum();
    prop_assert_eq!(total, rendered.embeds.len());
    for message in &messages {
        prop_assert!(!message.embeds.is_empty());
        prop_assert!(message.embeds.len() <= MESSAGE_EMBED_LIMIT);
        prop_assert!(message.text_len() <= MESSAGE_TEXT_LIMIT);
    }
    Ok(())
}

#[test]
fn footer_and_author_stay_within_the_container_total() {
    let source = format!(
        "---\nauthor: {}\nfooter: {}\n---\n\n{}\n\n{}\n\n{}",
        "a".repeat(100),
        "f".repeat(200),
        "x".repeat(4000),
        "y".repeat(1000),
        "z".repeat(900),
    );
    let rendered = render(&source, &RenderOptions::default(), &CommandTable::new()).unwrap();

    assert_eq!(rendered.embeds.len(), 2);
    for embed in &rendered.embeds {
        assert!(embed.text_len() <= EMBED_TEXT_LIMIT, "{}", embed.text_len());
    }
    for message in rendered.messages() {
        assert!(message.text_len() <= MESSAGE_TEXT_LIMIT);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn markdown_containers_respect_limits(source in document_strategy()) {
        check_limits(&source, Flavor::Markdown)?;
    }

    #[test]
    fn html_containers_respect_limits(source in document_strategy()) {
        check_limits(&source, Flavor::Html)?;
    }

    #[test]
    fn rendering_is_deterministic(source in document_strategy()) {
        let first = render(&source, &RenderOptions::default(), &CommandTable::new()).ok();
        let second = render(&source, &RenderOptions::default(), &CommandTable::new()).ok();
        prop_assert_eq!(first, second);
    }
}
