use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(about = "Generate short vertical tech tip videos")]
pub struct Args {
    /// Number of tips to request (one video per tip)
    #[clap(long, default_value_t = 5)]
    pub count: usize,

    #[clap(long, default_value = "outputs")]
    pub out_dir: String,

    /// Directory of stock .mp4 clips used as backgrounds, round-robin
    #[clap(long, default_value = "assets")]
    pub assets_dir: String,

    #[clap(long, default_value = "gpt-4")]
    pub model: String,

    #[clap(long, value_enum, default_value_t = TtsBackend::Openai)]
    pub tts: TtsBackend,

    #[clap(long, default_value = "alloy")]
    pub voice: String,

    #[clap(long, default_value = "./tts/en_US-amy-medium.onnx")]
    pub piper_model: String,

    #[clap(long, value_enum, default_value_t = CaptionStyle::Drawtext)]
    pub captions: CaptionStyle,

    #[clap(long, default_value = "DejaVu Sans")]
    pub font: String,

    #[clap(long, default_value = "Follow for daily tech tips ➜ @yourhandle")]
    pub cta: String,

    /// Solid background color as RRGGBB hex
    #[clap(long, default_value = "121212")]
    pub bg_color: String,

    /// Fixed clip length in seconds instead of narration + 0.5 clamped to 8..25
    #[clap(long)]
    pub duration: Option<f64>,

    #[clap(long, default_value_t = 1000)]
    pub pause_ms: u64,

    /// Abort the whole batch on the first failed tip
    #[clap(long)]
    pub fail_fast: bool,

    #[clap(long, default_value_t = 120)]
    pub http_timeout_secs: u64,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TtsBackend {
    Openai,
    Piper,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptionStyle {
    Drawtext,
    Subtitles,
}
