use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::args::{Args, CaptionStyle, TtsBackend};
use crate::background::Rgb;
use crate::error::{Error, Result};

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const API_BASE_ENV: &str = "OPENAI_BASE_URL";
const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const MANIFEST_FILE: &str = "videos_log.json";

/// Everything the batch needs, resolved once at startup from flags and the
/// environment.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_key: String,
    pub api_base: String,
    pub tip_count: usize,
    pub out_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub chat_model: String,
    pub tts: TtsBackend,
    pub voice: String,
    pub piper_model: PathBuf,
    pub captions: CaptionStyle,
    pub font: String,
    pub cta: String,
    pub bg_color: Rgb,
    pub duration: Option<f64>,
    pub pause: Duration,
    pub fail_fast: bool,
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self> {
        Self::from_args_with(args, |key| std::env::var(key).ok())
    }

    pub fn from_args_with(args: Args, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = env(API_KEY_ENV)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::MissingApiKey {
                env_var: API_KEY_ENV.to_string(),
            })?;
        let api_base = env(API_BASE_ENV)
            .map(|b| b.trim().trim_end_matches('/').to_string())
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        if args.count == 0 {
            return Err(Error::InvalidArgument("--count must be at least 1".into()));
        }
        if let Some(d) = args.duration {
            if !(d.is_finite() && d > 0.0) {
                return Err(Error::InvalidArgument(format!(
                    "--duration must be a positive number of seconds, got {}",
                    d
                )));
            }
        }

        Ok(Self {
            api_key,
            api_base,
            tip_count: args.count,
            out_dir: PathBuf::from(args.out_dir),
            assets_dir: PathBuf::from(args.assets_dir),
            chat_model: args.model,
            tts: args.tts,
            voice: args.voice,
            piper_model: PathBuf::from(args.piper_model),
            captions: args.captions,
            font: args.font,
            cta: args.cta,
            bg_color: args.bg_color.parse()?,
            duration: args.duration,
            pause: Duration::from_millis(args.pause_ms),
            fail_fast: args.fail_fast,
            http_timeout: Duration::from_secs(args.http_timeout_secs),
        })
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.out_dir.join(MANIFEST_FILE)
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        create_dir(&self.out_dir)?;
        create_dir(&self.assets_dir)
    }
}

fn create_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["techtips"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    fn env_with_key(key: &str) -> Option<String> {
        (key == API_KEY_ENV).then(|| "sk-test".to_string())
    }

    #[test]
    fn defaults_match_hard_coded_batch() {
        let cfg = Config::from_args_with(args(&[]), env_with_key).unwrap();
        assert_eq!(cfg.tip_count, 5);
        assert_eq!(cfg.out_dir, PathBuf::from("outputs"));
        assert_eq!(cfg.assets_dir, PathBuf::from("assets"));
        assert_eq!(cfg.bg_color, Rgb(18, 18, 18));
        assert_eq!(cfg.api_base, "https://api.openai.com/v1");
        assert_eq!(cfg.pause, Duration::from_secs(1));
        assert_eq!(cfg.manifest_path(), PathBuf::from("outputs/videos_log.json"));
        assert!(!cfg.fail_fast);
        assert!(cfg.duration.is_none());
    }

    #[test]
    fn missing_or_blank_key_is_fatal() {
        let err = Config::from_args_with(args(&[]), |_| None).unwrap_err();
        assert!(matches!(err, Error::MissingApiKey { .. }));

        let err = Config::from_args_with(args(&[]), |_| Some("   ".into())).unwrap_err();
        assert!(matches!(err, Error::MissingApiKey { .. }));
    }

    #[test]
    fn base_url_override_drops_trailing_slash() {
        let cfg = Config::from_args_with(args(&[]), |key| match key {
            API_KEY_ENV => Some("sk".into()),
            API_BASE_ENV => Some("http://localhost:8080/v1/".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(cfg.api_base, "http://localhost:8080/v1");
    }

    #[test]
    fn rejects_bad_flags() {
        assert!(Config::from_args_with(args(&["--count", "0"]), env_with_key).is_err());
        assert!(Config::from_args_with(args(&["--duration", "0"]), env_with_key).is_err());
        assert!(Config::from_args_with(args(&["--bg-color", "zzzzzz"]), env_with_key).is_err());
    }
}
