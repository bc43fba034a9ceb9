use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Vertical 9:16 frame every video is rendered at.
pub const FRAME: FrameSize = FrameSize {
    width: 1080,
    height: 1920,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// `0xRRGGBB`, the form ffmpeg color sources accept.
    pub fn ffmpeg_hex(&self) -> String {
        format!("0x{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

impl FromStr for Rgb {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim();
        let hex = hex
            .strip_prefix('#')
            .or_else(|| hex.strip_prefix("0x"))
            .unwrap_or(hex);
        let invalid = || Error::InvalidColor(s.to_string());
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// The bottom layer of a video. Whatever the source, the track is always
/// `duration` seconds long at [`FRAME`] size.
#[derive(Clone, Debug, PartialEq)]
pub enum BackgroundTrack {
    Solid {
        color: Rgb,
        size: FrameSize,
        duration: f64,
    },
    Stock {
        path: PathBuf,
        size: FrameSize,
        duration: f64,
        source_duration: f64,
    },
}

impl BackgroundTrack {
    pub fn solid(color: Rgb, duration: f64) -> Self {
        BackgroundTrack::Solid {
            color,
            size: FRAME,
            duration,
        }
    }

    pub fn duration(&self) -> f64 {
        match self {
            BackgroundTrack::Solid { duration, .. } | BackgroundTrack::Stock { duration, .. } => {
                *duration
            }
        }
    }

    pub fn size(&self) -> FrameSize {
        match self {
            BackgroundTrack::Solid { size, .. } | BackgroundTrack::Stock { size, .. } => *size,
        }
    }

    pub fn is_stock(&self) -> bool {
        matches!(self, BackgroundTrack::Stock { .. })
    }

    /// ffmpeg input arguments producing this track's source stream.
    pub fn input_args(&self, fps: u32) -> Vec<OsString> {
        match self {
            BackgroundTrack::Solid {
                color,
                size,
                duration,
            } => vec![
                "-f".into(),
                "lavfi".into(),
                "-i".into(),
                format!(
                    "color=c={}:s={}x{}:r={}:d={:.3}",
                    color.ffmpeg_hex(),
                    size.width,
                    size.height,
                    fps,
                    duration
                )
                .into(),
            ],
            BackgroundTrack::Stock { path, .. } => vec!["-i".into(), path.as_os_str().to_owned()],
        }
    }

    /// Filter chain taking `[{input}:v]` to the labelled `[bg]` stream.
    ///
    /// Stock clips are scaled to the frame height, center-cropped (or padded
    /// when narrower) to the frame width, cut at `min(duration, source)` and,
    /// when the source is shorter, held on the last frame for the remainder.
    pub fn filter(&self, input: usize, fps: u32) -> String {
        match self {
            BackgroundTrack::Solid { .. } => format!("[{}:v]setsar=1,format=yuv420p[bg]", input),
            BackgroundTrack::Stock {
                size,
                duration,
                source_duration,
                ..
            } => {
                let used = duration.min(*source_duration);
                let hold = duration - used;
                let mut chain = format!(
                    "[{input}:v]scale=-2:{h},crop=w=min(iw\\,{w}):h={h},pad={w}:{h}:(ow-iw)/2:0,\
                     setsar=1,fps={fps},trim=duration={used:.3},setpts=PTS-STARTPTS",
                    input = input,
                    w = size.width,
                    h = size.height,
                    fps = fps,
                    used = used,
                );
                if hold > 0.0 {
                    chain.push_str(&format!(",tpad=stop_mode=clone:stop_duration={:.3}", hold));
                }
                chain.push_str(",format=yuv420p[bg]");
                chain
            }
        }
    }
}

#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// Playable length of a media file in seconds.
    async fn duration(&self, path: &Path) -> Result<f64>;
}

pub struct FfprobeProbe;

#[async_trait]
impl MediaProbe for FfprobeProbe {
    async fn duration(&self, path: &Path) -> Result<f64> {
        let output = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| Error::Tool {
                tool: "ffprobe",
                reason: format!("failed to spawn: {}", e),
            })?;

        if !output.status.success() {
            return Err(Error::Tool {
                tool: "ffprobe",
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout);
        text.trim()
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite() && *d > 0.0)
            .ok_or_else(|| Error::Tool {
                tool: "ffprobe",
                reason: format!("no usable duration for {}: '{}'", path.display(), text.trim()),
            })
    }
}

/// Builds the background for one clip. An unreadable stock clip is not an
/// error: the solid fill is used instead.
pub async fn build_background(
    duration: f64,
    color: Rgb,
    stock: Option<&Path>,
    probe: &dyn MediaProbe,
) -> BackgroundTrack {
    let Some(path) = stock else {
        return BackgroundTrack::solid(color, duration);
    };
    if !path.exists() {
        warn!("Stock clip {} does not exist; using solid background", path.display());
        return BackgroundTrack::solid(color, duration);
    }

    match probe.duration(path).await {
        Ok(source_duration) => {
            if source_duration < duration {
                debug!(
                    "Stock clip {} is {:.2}s, holding last frame for {:.2}s",
                    path.display(),
                    source_duration,
                    duration - source_duration
                );
            }
            BackgroundTrack::Stock {
                path: path.to_path_buf(),
                size: FRAME,
                duration,
                source_duration,
            }
        }
        Err(e) => {
            warn!(
                "Stock clip {} unreadable ({}); using solid background",
                path.display(),
                e
            );
            BackgroundTrack::solid(color, duration)
        }
    }
}
