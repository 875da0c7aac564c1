//! Mention markup in chat text
//!
//! Slack renders user mentions as `<@U123>` or `<@U123|label>`. Mentions of
//! the bot itself are dropped; every other mention is replaced by the user's
//! name so it reads naturally when spoken.

use std::collections::HashMap;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::Result;

static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<@([^>\s|]+)(?:\|[^>]*)?>").expect("valid regex"));

/// Looks up user names by id
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Name to speak for `user_id`
    async fn user_name(&self, user_id: &str) -> Result<String>;
}

/// Remove every mention of `bot_user_id`
#[must_use]
pub fn strip_bot_mention(text: &str, bot_user_id: &str) -> String {
    MENTION
        .replace_all(text, |caps: &regex::Captures<'_>| {
            if &caps[1] == bot_user_id {
                String::new()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// User ids mentioned in `text`, first occurrence order, without repeats
#[must_use]
pub fn mentioned_users(text: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for caps in MENTION.captures_iter(text) {
        let id = &caps[1];
        if !ids.iter().any(|seen| seen == id) {
            ids.push(id.to_string());
        }
    }
    ids
}

/// Replace each user mention with the name `directory` reports
///
/// Mentions whose lookup fails are left as they are.
pub async fn resolve_mentions(text: &str, directory: &dyn UserDirectory) -> String {
    let mut names = HashMap::new();
    for id in mentioned_users(text) {
        match directory.user_name(&id).await {
            Ok(name) => {
                names.insert(id, name);
            }
            Err(e) => tracing::warn!(user_id = %id, error = %e, "failed to get user details"),
        }
    }

    MENTION
        .replace_all(text, |caps: &regex::Captures<'_>| {
            names
                .get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Turn raw mention text into what should be spoken
pub async fn prepare_text(
    text: &str,
    bot_user_id: Option<&str>,
    directory: &dyn UserDirectory,
) -> String {
    let stripped = match bot_user_id {
        Some(bot) => strip_bot_mention(text, bot),
        None => text.to_string(),
    };
    resolve_mentions(&stripped, directory).await.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    struct Directory;

    #[async_trait]
    impl UserDirectory for Directory {
        async fn user_name(&self, user_id: &str) -> Result<String> {
            match user_id {
                "U1" => Ok("alice".to_string()),
                "U2" => Ok("bob".to_string()),
                other => Err(Error::Channel(format!("user_not_found: {other}"))),
            }
        }
    }

    #[test]
    fn bot_mentions_are_removed() {
        assert_eq!(strip_bot_mention("<@B0T> hello <@B0T>", "B0T"), " hello ");
        assert_eq!(strip_bot_mention("<@B0T|voicecast> hi", "B0T"), " hi");
        assert_eq!(strip_bot_mention("<@U1> hi", "B0T"), "<@U1> hi");
    }

    #[test]
    fn mentioned_users_are_unique_and_ordered() {
        assert_eq!(
            mentioned_users("<@U2> and <@U1|al> and <@U2>"),
            vec!["U2".to_string(), "U1".to_string()]
        );
        assert!(mentioned_users("no mentions, <@ broken>").is_empty());
    }

    #[tokio::test]
    async fn user_mentions_become_names() {
        let text = resolve_mentions("<@U1> meet <@U2|bobby>, <@U1>", &Directory).await;
        assert_eq!(text, "alice meet bob, alice");
    }

    #[tokio::test]
    async fn failed_lookup_keeps_the_token() {
        let text = resolve_mentions("hi <@U9>", &Directory).await;
        assert_eq!(text, "hi <@U9>");
    }

    #[tokio::test]
    async fn prepared_text_is_trimmed() {
        let text = prepare_text("<@BOT> <@U1> is home ", Some("BOT"), &Directory).await;
        assert_eq!(text, "alice is home");
    }
}
