use markdown_embeds_engine::{
    CommandTable, Embed, RenderOptions, reverse_embeds, reverse_message, reverse_value, render,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

/// The text the platform shows: title, description and every field.
fn visible_text(embeds: &[Embed]) -> Vec<(Option<String>, Option<String>, Vec<(String, String, bool)>)> {
    embeds
        .iter()
        .map(|e| {
            (
                e.title.clone(),
                e.description.clone(),
                e.fields
                    .iter()
                    .map(|f| (f.name.clone(), f.value.clone(), f.inline))
                    .collect(),
            )
        })
        .collect()
}

fn render_with(source: &str, options: &RenderOptions) -> Vec<Embed> {
    render(source, options, &CommandTable::new()).unwrap().embeds
}

#[rstest]
#[case::fields(
    "#!Intro\nWelcome to the server.\nRead the rules.\n\n#-Rules\nBe nice\n\n#-Links\nSee docs\n\n# Notes\n- one\n- two"
)]
#[case::code_block("#!Code\nIntro line\n```rust\nfn main() {}\n```\nafter")]
#[case::quote_and_markup("#!Quote\n> wise words\n> more\n\n**bold** and `code`")]
#[case::linked_title("#![Docs](https://docs.rs)\nRead them")]
#[case::paragraphs("#!A\none\n\ntwo\n\n#!B\nthree")]
#[case::escapes("#!Escapes\nuse \\{name\\} literally\n\na\\\\b and keep \\<!-- this -->")]
#[case::escaped_title_and_field("#!Set \\{x\\}\nintro\n\n#-a\\\\b\nvalue \\{y\\}")]
#[case::mentions("#!Ping\nhey <@42>, see <#7> at <t:1700000000:R>")]
#[case::trailing_space_breaks("#!Breaks\nline one  \nline two")]
fn content_survives_a_round_trip(#[case] source: &str) {
    let options = RenderOptions::default();
    let original = render_with(source, &options);
    let markdown = reverse_embeds(&original);
    let again = render_with(&markdown, &options);
    assert_eq!(visible_text(&again), visible_text(&original), "reversed:\n{markdown}");
}

#[test]
fn literal_braces_backslashes_and_comments_stay_literal() {
    let options = RenderOptions::default();
    let original = render_with(r"use \{name\} and a\\b and \<!-- this -->", &options);
    assert_eq!(
        original[0].description.as_deref(),
        Some(r"use {name} and a\b and <!-- this -->")
    );

    let markdown = reverse_embeds(&original);
    assert_eq!(markdown, r"use \{name} and a\\b and \<!-- this -->");
    assert_eq!(render_with(&markdown, &options), original);
}

#[test]
fn line_start_markers_are_escaped() {
    let options = RenderOptions {
        ul: Some("- ".into()),
        ..Default::default()
    };
    let original = render_with("#!List\n- a\n- b", &options);
    assert_eq!(original[0].description.as_deref(), Some("- a\n- b"));

    let markdown = reverse_embeds(&original);
    assert_eq!(markdown, "#!List\n\\- a\\\n\\- b");
    assert_eq!(render_with(&markdown, &options), original);
}

#[test]
fn decorations_round_trip() {
    let source = "---\n\
        author: Bot\n\
        footer: bye\n\
        color: \"#00ff00\"\n\
        ---\n\
        #!One\nfirst\n\n#!Two\nsecond\n\n![pic](https://x/p.png)";
    let options = RenderOptions::default();
    let original = render_with(source, &options);
    assert_eq!(original.len(), 2);

    let again = render_with(&reverse_embeds(&original), &options);
    assert_eq!(again, original);
}

#[test]
fn message_round_trip_keeps_settings() {
    let source = "---\ncontent: hi there\nusername: bot\n---\n#!Only\nbody";
    let rendered = render(source, &RenderOptions::default(), &CommandTable::new()).unwrap();
    let message = &rendered.messages()[0];

    let markdown = reverse_message(message);
    let again = render(&markdown, &RenderOptions::default(), &CommandTable::new()).unwrap();
    assert_eq!(&again.messages()[0], message);
}

#[test]
fn platform_json_reverses() {
    let value = serde_json::json!({
        "embeds": [
            {"title": "Status", "description": "All good", "color": 65280},
            {"fields": [{"name": "Uptime", "value": "99%", "inline": true}]}
        ]
    });
    let markdown = reverse_value(&value).unwrap();
    let again = render_with(&markdown, &RenderOptions::default());
    assert_eq!(again[0].title.as_deref(), Some("Status"));
    assert_eq!(again[0].color, Some(65280));
}
