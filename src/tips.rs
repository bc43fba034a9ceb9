use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::utils::{split_sentences, strip_enumeration};

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 400;
const MIN_SENTENCE_CHARS: usize = 10;

/// Anything that can answer a single prompt with free text.
#[async_trait]
pub trait TipSource: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[async_trait]
impl<T: TipSource + ?Sized> TipSource for Box<T> {
    async fn complete(&self, prompt: &str) -> Result<String> {
        (**self).complete(prompt).await
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// OpenAI-compatible `/chat/completions` client.
pub struct OpenAiChat {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl OpenAiChat {
    pub fn new(api_base: &str, api_key: &str, model: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            api_base: api_base.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl TipSource for OpenAiChat {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.api_base);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            return Err(Error::Api {
                service: "chat completion",
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&text)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(Error::EmptyCompletion)
    }
}

pub struct TipGenerator<S> {
    source: S,
}

impl<S: TipSource> TipGenerator<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Asks for `count` tips in one request. May return fewer than asked
    /// for, never more.
    pub async fn generate(&self, count: usize) -> Result<Vec<String>> {
        info!("Requesting {} tech tips", count);
        let reply = self.source.complete(&tips_prompt(count)).await?;
        debug!("Completion reply: {}", reply);

        let tips = parse_tips(&reply, count);
        if tips.len() < count {
            warn!("Only {} of {} requested tips could be parsed", tips.len(), count);
        }
        Ok(tips)
    }
}

pub fn tips_prompt(count: usize) -> String {
    format!(
        "Write {} short, punchy tech tips for a 15-30 second vertical video. \
         Keep each tip to one or two short sentences and number them.",
        count
    )
}

/// Turns a completion reply into at most `count` tips: one per non-blank
/// line with list markers removed, or, when the reply has too few lines,
/// one per sentence longer than ten characters.
pub fn parse_tips(text: &str, count: usize) -> Vec<String> {
    let mut tips: Vec<String> = text
        .lines()
        .map(strip_enumeration)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if tips.len() < count {
        debug!("Reply has {} usable lines; splitting into sentences", tips.len());
        tips = split_sentences(text)
            .iter()
            .map(|s| strip_enumeration(s))
            .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
            .map(str::to_string)
            .collect();
    }

    tips.truncate(count);
    tips
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) struct CannedReply(pub &'static str);

    #[async_trait]
    impl TipSource for CannedReply {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn numbered_lines_lose_their_markers() {
        let reply = "1. Use keyboard shortcuts.\n\n2) Turn on 2FA everywhere.\n3. Update your OS.";
        assert_eq!(
            parse_tips(reply, 3),
            vec!["Use keyboard shortcuts.", "Turn on 2FA everywhere.", "Update your OS."]
        );
    }

    #[test]
    fn extra_lines_are_truncated() {
        let reply = "1. A tip.\n2. B tip.\n3. C tip.\n4. D tip.";
        assert_eq!(parse_tips(reply, 2), vec!["A tip.", "B tip."]);
    }

    #[test]
    fn paragraph_falls_back_to_sentences() {
        let reply = "Clear your browser cache monthly. Use a password manager for everything. \
                     Enable automatic backups today. Learn three new shortcuts a week. \
                     Restart your router when speeds drop. Keep your desk cables labelled.";
        let tips = parse_tips(reply, 5);
        assert_eq!(tips.len(), 5);
        assert_eq!(tips[0], "Clear your browser cache monthly.");
        assert_eq!(tips[4], "Restart your router when speeds drop.");
        assert!(tips.iter().all(|t| t == t.trim() && !t.is_empty()));
    }

    #[test]
    fn version_numbers_and_domains_survive_sentence_fallback() {
        let reply = "Python 3.12 starts faster than older releases. \
                     Visit example.com for free icon packs. \
                     Use Ctrl+Shift+T to reopen closed tabs. \
                     Turn on two-factor authentication now. \
                     Back up your photos weekly.";
        assert_eq!(
            parse_tips(reply, 5),
            vec![
                "Python 3.12 starts faster than older releases.",
                "Visit example.com for free icon packs.",
                "Use Ctrl+Shift+T to reopen closed tabs.",
                "Turn on two-factor authentication now.",
                "Back up your photos weekly.",
            ]
        );
    }

    #[test]
    fn short_fragments_are_dropped_and_never_padded() {
        let reply = "Tip one. Ok. Another useful tip here!";
        let tips = parse_tips(reply, 5);
        assert_eq!(tips, vec!["Another useful tip here!"]);
    }

    #[test]
    fn result_is_never_longer_than_count() {
        for count in 1..=6 {
            let tips = parse_tips("1. Tip A.\n2. Tip B.\n3. Tip C.\n4. Tip D.\n5. Tip E.", count);
            assert!(tips.len() <= count);
            assert!(tips.iter().all(|t| !t.is_empty() && !t.starts_with(char::is_numeric)));
        }
    }

    #[tokio::test]
    async fn generator_parses_source_reply() {
        let generator = TipGenerator::new(CannedReply("1. Tip A.\n2. Tip B."));
        let tips = generator.generate(2).await.unwrap();
        assert_eq!(tips, vec!["Tip A.", "Tip B."]);
    }
}
