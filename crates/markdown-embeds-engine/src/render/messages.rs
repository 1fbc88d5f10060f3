//! Stage D: grouping containers into messages.

use crate::models::{Embed, MESSAGE_EMBED_LIMIT, MESSAGE_TEXT_LIMIT, Message};

use super::decorate::{Anchor, Decorations};

/// Group `embeds` in order, starting a new message when the next container
/// would pass the aggregate text limit or the current one is full.
pub fn group_messages(embeds: &[Embed], decorations: &Decorations) -> Vec<Message> {
    let mut chunks: Vec<Vec<Embed>> = Vec::new();
    let mut length = 0;

    for embed in embeds {
        let len = embed.text_len();
        let start_new = chunks.last().is_none_or(|chunk| {
            chunk.len() >= MESSAGE_EMBED_LIMIT || length + len > MESSAGE_TEXT_LIMIT
        });
        if start_new {
            chunks.push(Vec::new());
            length = 0;
        }
        length += len;
        if let Some(chunk) = chunks.last_mut() {
            chunk.push(embed.clone());
        }
    }

    log::debug!(
        "grouped {} containers into {} messages",
        embeds.len(),
        chunks.len()
    );

    chunks
        .into_iter()
        .enumerate()
        .map(|(i, embeds)| Message {
            embeds,
            content: decorations
                .content
                .as_ref()
                .and_then(|content| content.pick(i, Anchor::First)),
            username: decorations.username.clone(),
            avatar_url: decorations.avatar_url.clone(),
            allowed_mentions: decorations.allowed_mentions.clone(),
            ephemeral: decorations.ephemeral,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Targeting;
    use pretty_assertions::assert_eq;

    fn embed(len: usize) -> Embed {
        Embed {
            description: Some("x".repeat(len)),
            ..Default::default()
        }
    }

    #[test]
    fn no_containers_no_messages() {
        assert!(group_messages(&[], &Decorations::default()).is_empty());
    }

    #[test]
    fn splits_on_aggregate_length() {
        let embeds = vec![embed(3000), embed(3000), embed(1)];
        let messages = group_messages(&embeds, &Decorations::default());
        let sizes: Vec<_> = messages.iter().map(|m| m.embeds.len()).collect();
        assert_eq!(sizes, vec![2, 1]);
        assert!(messages.iter().all(|m| m.text_len() <= MESSAGE_TEXT_LIMIT));
    }

    #[test]
    fn splits_on_container_count() {
        let embeds = vec![embed(1); 23];
        let messages = group_messages(&embeds, &Decorations::default());
        let sizes: Vec<_> = messages.iter().map(|m| m.embeds.len()).collect();
        assert_eq!(sizes, vec![10, 10, 3]);
    }

    #[test]
    fn content_targets_first_message_and_keys_copy_through() {
        let decorations = Decorations {
            content: Some(Targeting::Single("hello".into())),
            username: Some("bot".into()),
            ephemeral: Some(true),
            ..Default::default()
        };
        let messages = group_messages(&vec![embed(1); 11], &decorations);
        assert_eq!(messages[0].content.as_deref(), Some("hello"));
        assert_eq!(messages[1].content, None);
        assert!(messages.iter().all(|m| m.username.as_deref() == Some("bot")));
        assert!(messages.iter().all(|m| m.ephemeral == Some(true)));
    }

    #[test]
    fn cyclic_content_per_message() {
        let decorations = Decorations {
            content: Some(Targeting::Cycle(vec![Some("a".into()), Some("b".into())])),
            ..Default::default()
        };
        let messages = group_messages(&vec![embed(1); 25], &decorations);
        let contents: Vec<_> = messages.iter().map(|m| m.content.clone()).collect();
        assert_eq!(
            contents,
            vec![Some("a".into()), Some("b".into()), Some("a".into())]
        );
    }
}
