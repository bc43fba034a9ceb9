use std::path::Path;

use hound::WavReader;
use tracing::debug;

use crate::background::MediaProbe;
use crate::error::Result;

pub const MIN_CLIP_SECONDS: f64 = 8.0;
pub const MAX_CLIP_SECONDS: f64 = 25.0;
const NARRATION_TAIL_SECONDS: f64 = 0.5;

pub fn wav_duration_seconds(path: &Path) -> Result<f64> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let samples = reader.len();
    let frames = samples as f64 / spec.channels as f64;
    let duration = frames / spec.sample_rate as f64;
    Ok(duration)
}

/// Narration length, read from the WAV header when possible and from the
/// media probe otherwise (streamed WAV headers often carry no length).
pub async fn narration_duration(path: &Path, probe: &dyn MediaProbe) -> Result<f64> {
    match wav_duration_seconds(path) {
        Ok(d) if d > 0.0 => Ok(d),
        Ok(_) => probe.duration(path).await,
        Err(e) => {
            debug!("WAV header unusable for {} ({}); probing", path.display(), e);
            probe.duration(path).await
        }
    }
}

/// Clip length for a narration: half a second of tail, kept within 8..25s.
pub fn clip_duration(narration_seconds: f64) -> f64 {
    (narration_seconds + NARRATION_TAIL_SECONDS).clamp(MIN_CLIP_SECONDS, MAX_CLIP_SECONDS)
}
