use markdown_embeds_engine::{
    CommandTable, Evaluated, Flavor, LimitKind, Primitive, RenderError, RenderOptions, TitleKind,
    render,
};
use pretty_assertions::assert_eq;

fn render_default(source: &str) -> markdown_embeds_engine::Rendered {
    render(source, &RenderOptions::default(), &CommandTable::new()).unwrap()
}

#[test]
fn title_and_body_make_one_container() {
    let rendered = render_default("# Title\nBody text");
    let json = serde_json::to_string(&rendered).unwrap();
    insta::assert_snapshot!(json, @r#"[{"title":"Title","description":"Body text"}]"#);
}

#[test]
fn front_matter_color_applies() {
    let rendered = render_default("---\ncolor: \"#ff0000\"\n---\nHello");
    let json = serde_json::to_string(&rendered).unwrap();
    insta::assert_snapshot!(json, @r#"[{"description":"Hello","color":16711680}]"#);
}

#[test]
fn oversized_description_is_a_limit_error() {
    let source = "a".repeat(4097);
    let err = render(&source, &RenderOptions::default(), &CommandTable::new()).unwrap_err();
    let RenderError::Limit(limit) = err else {
        panic!("expected a limit error");
    };
    assert_eq!(limit.kind, LimitKind::Description);
    assert_eq!(limit.limit, 4096);
    assert_eq!(limit.length, 4097);
    assert!(limit.to_string().contains("4096"));
}

#[test]
fn thirty_fields_split_at_twenty_five() {
    let mut source = String::from("# Title\n");
    for i in 0..30 {
        source.push_str(&format!("\n#-field {i}\nvalue {i}\n"));
    }
    let rendered = render_default(&source);

    let counts: Vec<_> = rendered.embeds.iter().map(|e| e.fields.len()).collect();
    assert_eq!(counts, vec![25, 5]);
    assert_eq!(rendered.embeds[0].title.as_deref(), Some("Title"));
    assert_eq!(rendered.embeds[1].fields[0].name, "field 25");
    assert!(rendered.embeds.iter().all(|e| e.text_len() <= 6000));
}

#[test]
fn escaped_asterisks_stay_literal() {
    let rendered = render_default("\\*not italic\\*");
    assert_eq!(
        rendered.embeds[0].description.as_deref(),
        Some("*not italic*")
    );
}

#[test]
fn markup_is_kept_in_markdown_flavor() {
    let rendered = render_default("**bold** and *soft* and [docs](https://docs.rs)");
    assert_eq!(
        rendered.embeds[0].description.as_deref(),
        Some("**bold** and *soft* and [docs](https://docs.rs)")
    );
}

#[test]
fn html_flavor_uses_tags() {
    let options = RenderOptions {
        flavor: Flavor::Html,
        ..Default::default()
    };
    let rendered = render(
        "# Notes\n**a** < b\n\nnext",
        &options,
        &CommandTable::new(),
    )
    .unwrap();
    let embed = &rendered.embeds[0];
    assert_eq!(embed.title.as_deref(), Some("<h3>Notes</h3>"));
    assert_eq!(
        embed.description.as_deref(),
        Some("<strong>a</strong> &lt; b<br><br>next")
    );
}

#[test]
fn lists_use_front_matter_markers() {
    let rendered = render_default("---\nul: \"- \"\nol: \"(n) \"\n---\n- a\n- b\n\n1. x\n2. y");
    assert_eq!(
        rendered.embeds[0].description.as_deref(),
        Some("- a\n- b\n(1) x\n(2) y")
    );
}

#[test]
fn embed_titles_split_containers_and_group_into_messages() {
    let source: Vec<String> = (0..12).map(|i| format!("#!Part {i}\nbody {i}")).collect();
    let rendered = render_default(&source.join("\n\n"));
    assert_eq!(rendered.embeds.len(), 12);

    let messages = rendered.messages();
    let sizes: Vec<_> = messages.iter().map(|m| m.embeds.len()).collect();
    assert_eq!(sizes, vec![10, 2]);
}

#[test]
fn decorations_follow_targeting_rules() {
    let source = "---\n\
        author: [A, null, C]\n\
        footer: bye\n\
        thumbnail:\n  url: https://x/t.png\n  all: true\n\
        content: hello\n\
        username: bot\n\
        ---\n\
        #!one\n\n#!two\n\n#!three";
    let rendered = render_default(source);
    let authors: Vec<_> = rendered
        .embeds
        .iter()
        .map(|e| e.author.as_ref().map(|a| a.name.as_str()))
        .collect();
    assert_eq!(authors, vec![Some("A"), None, Some("C")]);

    let footers: Vec<_> = rendered.embeds.iter().map(|e| e.footer.is_some()).collect();
    assert_eq!(footers, vec![false, false, true]);
    assert!(rendered.embeds.iter().all(|e| e.thumbnail.is_some()));

    let messages = rendered.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content.as_deref(), Some("hello"));
    assert_eq!(messages[0].username.as_deref(), Some("bot"));
}

#[test]
fn commands_expand_inline_and_as_blocks() {
    let table = CommandTable::new()
        .with_text("greeting", "Welcome!")
        .with_function("shout", |_, args| {
            Ok(Evaluated::Text(args.join(" ").to_uppercase()))
        })
        .with_function("card", |context, _| {
            let name = context.scalar("name").unwrap_or_default();
            Ok(Evaluated::Fragment(vec![
                Primitive::Title {
                    text: name,
                    kind: TitleKind::Embed,
                    url: None,
                },
                Primitive::body("from a card", 2),
            ]))
        });
    let source = "---\nname: Ferris\n---\n{greeting} say {shout:hi,there}\n\n{card}";
    let rendered = render(source, &RenderOptions::default(), &table).unwrap();

    assert_eq!(rendered.embeds.len(), 2);
    assert_eq!(
        rendered.embeds[0].description.as_deref(),
        Some("Welcome! say HI THERE")
    );
    assert_eq!(rendered.embeds[1].title.as_deref(), Some("Ferris"));
    assert_eq!(
        rendered.embeds[1].description.as_deref(),
        Some("from a card")
    );
}

#[test]
fn unknown_command_renders_its_error() {
    let rendered = render_default("see {nothing}");
    assert_eq!(
        rendered.embeds[0].description.as_deref(),
        Some("see command `nothing` not found")
    );
}

#[test]
fn unmatched_markup_is_literal() {
    let rendered = render_default("a **b and [c and `d");
    assert_eq!(
        rendered.embeds[0].description.as_deref(),
        Some("a **b and [c and `d")
    );
}

#[test]
fn empty_document_renders_nothing() {
    let rendered = render_default("");
    assert!(rendered.embeds.is_empty());
    assert!(rendered.messages().is_empty());
}
