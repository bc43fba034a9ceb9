use std::ffi::OsString;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{error, info};

use crate::background::BackgroundTrack;
use crate::error::{Error, Result};

pub const FPS: u32 = 24;
const PRESET: &str = "medium";

/// Everything needed to encode one finished video.
#[derive(Debug, Clone)]
pub struct CompositionPlan {
    pub background: BackgroundTrack,
    /// Filter chain drawn over the background, from `[bg]` to the output.
    pub caption_filter: String,
    pub narration: PathBuf,
    pub output: PathBuf,
    pub duration: f64,
}

impl CompositionPlan {
    pub fn filter_complex(&self) -> String {
        format!(
            "{};[bg]{}[v]",
            self.background.filter(0, FPS),
            self.caption_filter
        )
    }

    /// Full ffmpeg argument list: background is input 0, narration input 1
    /// and the only audio stream; the result is cut to `duration`.
    pub fn ffmpeg_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-y".into(),
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
        ];
        args.extend(self.background.input_args(FPS));
        args.push("-i".into());
        args.push(self.narration.as_os_str().to_owned());
        for a in [
            "-filter_complex".to_string(),
            self.filter_complex(),
            "-map".into(),
            "[v]".into(),
            "-map".into(),
            "1:a:0".into(),
            "-c:v".into(),
            "libx264".into(),
            "-preset".into(),
            PRESET.into(),
            "-pix_fmt".into(),
            "yuv420p".into(),
            "-r".into(),
            FPS.to_string(),
            "-c:a".into(),
            "aac".into(),
            "-t".into(),
            format!("{:.3}", self.duration),
        ] {
            args.push(a.into());
        }
        args.push(self.output.as_os_str().to_owned());
        args
    }
}

#[async_trait]
pub trait VideoEncoder: Send + Sync {
    async fn encode(&self, plan: &CompositionPlan) -> Result<()>;
}

pub struct FfmpegEncoder;

#[async_trait]
impl VideoEncoder for FfmpegEncoder {
    async fn encode(&self, plan: &CompositionPlan) -> Result<()> {
        info!(
            "Encoding {} ({:.2}s, {} background)",
            plan.output.display(),
            plan.duration,
            if plan.background.is_stock() { "stock" } else { "solid" }
        );
        let output = Command::new("ffmpeg")
            .args(plan.ffmpeg_args())
            .output()
            .await
            .map_err(|e| Error::Tool {
                tool: "ffmpeg",
                reason: format!("failed to spawn: {}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!("ffmpeg failed to produce {}: {}", plan.output.display(), stderr);
            return Err(Error::Tool {
                tool: "ffmpeg",
                reason: format!("exited with {}: {}", output.status, stderr),
            });
        }
        info!("Video written to {}", plan.output.display());
        Ok(())
    }
}
