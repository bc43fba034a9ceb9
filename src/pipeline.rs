use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::args::{CaptionStyle, TtsBackend};
use crate::audio::{clip_duration, narration_duration};
use crate::background::{BackgroundTrack, FfprobeProbe, MediaProbe, build_background};
use crate::caption::{CaptionRenderer, CaptionTheme, DrawTextCaptions, SubtitleCaptions};
use crate::compose::{CompositionPlan, FfmpegEncoder, VideoEncoder};
use crate::config::Config;
use crate::error::Result;
use crate::manifest::Manifest;
use crate::scratch::TempArtifact;
use crate::tips::{OpenAiChat, TipGenerator, TipSource};
use crate::tts::{OpenAiSpeech, PiperSpeech, SpeechSynthesizer};

#[derive(Debug)]
pub struct TipFailure {
    pub index: usize,
    pub tip: String,
    pub reason: String,
}

#[derive(Debug)]
pub struct BatchReport {
    pub manifest: Manifest,
    pub manifest_path: PathBuf,
    pub failures: Vec<TipFailure>,
}

pub struct Pipeline {
    config: Config,
    tips: TipGenerator<Box<dyn TipSource>>,
    speech: Box<dyn SpeechSynthesizer>,
    captions: Box<dyn CaptionRenderer>,
    probe: Box<dyn MediaProbe>,
    encoder: Box<dyn VideoEncoder>,
}

impl Pipeline {
    pub fn new(
        config: Config,
        source: Box<dyn TipSource>,
        speech: Box<dyn SpeechSynthesizer>,
        captions: Box<dyn CaptionRenderer>,
        probe: Box<dyn MediaProbe>,
        encoder: Box<dyn VideoEncoder>,
    ) -> Self {
        Self {
            config,
            tips: TipGenerator::new(source),
            speech,
            captions,
            probe,
            encoder,
        }
    }

    /// Wires the OpenAI, Piper and ffmpeg backends selected in `config`.
    pub fn from_config(config: Config) -> Result<Self> {
        let source = OpenAiChat::new(
            &config.api_base,
            &config.api_key,
            &config.chat_model,
            config.http_timeout,
        )?;
        let speech: Box<dyn SpeechSynthesizer> = match config.tts {
            TtsBackend::Openai => Box::new(OpenAiSpeech::new(
                &config.api_base,
                &config.api_key,
                &config.voice,
                config.http_timeout,
            )?),
            TtsBackend::Piper => Box::new(PiperSpeech::new(&config.piper_model)),
        };
        let theme = CaptionTheme::new(&config.font, &config.cta);
        let captions: Box<dyn CaptionRenderer> = match config.captions {
            CaptionStyle::Drawtext => Box::new(DrawTextCaptions::new(theme)),
            CaptionStyle::Subtitles => Box::new(SubtitleCaptions::new(theme)),
        };
        Ok(Self::new(
            config,
            Box::new(source),
            speech,
            captions,
            Box::new(FfprobeProbe),
            Box::new(FfmpegEncoder),
        ))
    }

    /// Builds one video for `tip` at `output` and returns its length in
    /// seconds. Narration and caption scratch files are removed on return.
    pub async fn build_video(&self, tip: &str, output: &Path, stock: Option<&Path>) -> Result<f64> {
        let narration = TempArtifact::new(output.with_extension("wav"));
        self.speech.synthesize(tip, narration.path()).await?;

        let spoken = narration_duration(narration.path(), self.probe.as_ref()).await?;
        let duration = self.config.duration.unwrap_or_else(|| clip_duration(spoken));
        info!("Narration {:.2}s, clip {:.2}s", spoken, duration);

        let background =
            build_background(duration, self.config.bg_color, stock, self.probe.as_ref()).await;
        let caption = self
            .captions
            .render(tip, background.size(), duration, output)?;

        let mut plan = CompositionPlan {
            background,
            caption_filter: caption.filter.clone(),
            narration: narration.path().to_path_buf(),
            output: output.to_path_buf(),
            duration,
        };
        if let Err(e) = self.encoder.encode(&plan).await {
            if !plan.background.is_stock() {
                return Err(e);
            }
            warn!("Encoding over stock clip failed ({}); retrying on solid background", e);
            plan.background = BackgroundTrack::solid(self.config.bg_color, duration);
            self.encoder.encode(&plan).await?;
        }
        Ok(duration)
    }

    /// Runs the whole batch and writes the manifest. With `fail_fast` the
    /// first failed tip aborts the run before any manifest is written;
    /// otherwise failed tips are logged, skipped and left out of the manifest.
    pub async fn run(&self) -> Result<BatchReport> {
        self.config.ensure_dirs()?;

        let tips = self.tips.generate(self.config.tip_count).await?;
        let stock = list_stock_clips(&self.config.assets_dir)?;
        info!(
            "Generating {} videos ({} stock clips available)",
            tips.len(),
            stock.len()
        );

        let mut manifest = Manifest::new();
        let mut failures = Vec::new();
        for (i, tip) in tips.iter().enumerate() {
            let output = self
                .config
                .out_dir
                .join(output_file_name(unix_timestamp(), i + 1));
            let clip = round_robin(&stock, i);
            info!("Generating {}/{}: {}", i + 1, tips.len(), tip);

            match self.build_video(tip, &output, clip).await {
                Ok(_) => manifest.push(tip, &output),
                Err(e) if self.config.fail_fast => {
                    error!("Tip {} failed, aborting batch: {}", i + 1, e);
                    return Err(e);
                }
                Err(e) => {
                    error!("Tip {} failed, skipping: {}", i + 1, e);
                    failures.push(TipFailure {
                        index: i + 1,
                        tip: tip.clone(),
                        reason: e.to_string(),
                    });
                }
            }

            if i + 1 < tips.len() && !self.config.pause.is_zero() {
                sleep(self.config.pause).await;
            }
        }

        let manifest_path = self.config.manifest_path();
        manifest.save(&manifest_path)?;
        info!(
            "Manifest with {} entries written to {}",
            manifest.len(),
            manifest_path.display()
        );
        Ok(BatchReport {
            manifest,
            manifest_path,
            failures,
        })
    }
}

/// `*.mp4` files directly inside `dir`, sorted by file name.
pub fn list_stock_clips(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut clips = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "mp4") {
            clips.push(path);
        }
    }
    clips.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(clips)
}

pub fn round_robin(clips: &[PathBuf], index: usize) -> Option<&Path> {
    if clips.is_empty() {
        None
    } else {
        Some(clips[index % clips.len()].as_path())
    }
}

pub fn output_file_name(timestamp: u64, position: usize) -> String {
    format!("tech_tip_{}_{}.mp4", timestamp, position)
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
