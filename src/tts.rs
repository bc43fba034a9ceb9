use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{error, info};

use crate::error::{Error, Result};

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Speaks `text` into a WAV file at `out_path`.
    async fn synthesize(&self, text: &str, out_path: &Path) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
    speed: f32,
}

/// OpenAI-compatible `/audio/speech` endpoint.
pub struct OpenAiSpeech {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    voice: String,
}

impl OpenAiSpeech {
    const MODEL: &'static str = "tts-1";

    pub fn new(api_base: &str, api_key: &str, voice: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            api_base: api_base.to_string(),
            api_key: api_key.to_string(),
            voice: voice.to_string(),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeech {
    async fn synthesize(&self, text: &str, out_path: &Path) -> Result<()> {
        let url = format!("{}/audio/speech", self.api_base);
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&SpeechRequest {
                model: Self::MODEL,
                input: text,
                voice: &self.voice,
                response_format: "wav",
                speed: 1.0,
            })
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(Error::Api {
                service: "speech synthesis",
                status: status.as_u16(),
                body,
            });
        }

        let audio = res.bytes().await?;
        tokio::fs::write(out_path, &audio).await?;
        info!("Narration written to {} ({} bytes)", out_path.display(), audio.len());
        Ok(())
    }
}

/// Local Piper voice; text goes in on stdin, WAV comes out at the given path.
pub struct PiperSpeech {
    model: PathBuf,
}

impl PiperSpeech {
    pub fn new(model: impl Into<PathBuf>) -> Self {
        Self {
            model: model.into(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for PiperSpeech {
    async fn synthesize(&self, text: &str, out_path: &Path) -> Result<()> {
        let mut child = Command::new("piper")
            .arg("--model")
            .arg(&self.model)
            .arg("--output_file")
            .arg(out_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Error::Tool {
                tool: "piper",
                reason: format!("failed to spawn: {}", e),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
        }

        let status = child.wait().await?;
        if !status.success() {
            error!("Piper TTS command failed for {}", out_path.display());
            return Err(Error::Tool {
                tool: "piper",
                reason: format!("exited with {}", status),
            });
        }
        info!("Narration written to {}", out_path.display());
        Ok(())
    }
}
