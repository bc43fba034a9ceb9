use std::path::Path;

use tracing::debug;

use crate::background::{FrameSize, Rgb};
use crate::error::Result;
use crate::scratch::TempArtifact;
use crate::subtitle::write_ass;
use crate::utils::wrap_text;

pub const WRAP_CHARS: usize = 24;
const TOP_RATIO: f64 = 0.20;
const CTA_RATIO: f64 = 0.88;
/// Ascent plus descent of DejaVu Sans, in ems.
const GLYPH_BOX_EM: f64 = 1.17;
const LINE_MARGIN: u32 = 10;

#[derive(Clone, Debug)]
pub struct CaptionTheme {
    pub font: String,
    pub cta: String,
    pub tip_size: u32,
    pub cta_size: u32,
    pub tip_color: Rgb,
    pub cta_color: Rgb,
}

impl CaptionTheme {
    pub fn new(font: &str, cta: &str) -> Self {
        Self {
            font: font.to_string(),
            cta: cta.to_string(),
            tip_size: 72,
            cta_size: 38,
            tip_color: Rgb(255, 255, 255),
            cta_color: Rgb(230, 230, 230),
        }
    }

    pub fn line_height(&self) -> u32 {
        (self.tip_size as f64 * GLYPH_BOX_EM).round() as u32 + LINE_MARGIN
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextLine {
    pub text: String,
    /// Top edge of the line in frame pixels.
    pub y: u32,
}

/// Where the wrapped tip lines and the call-to-action sit in the frame.
/// Every renderer draws from this, so all of them place text on the same rows.
#[derive(Clone, Debug)]
pub struct CaptionLayout {
    pub frame: FrameSize,
    pub lines: Vec<TextLine>,
    pub cta: Option<TextLine>,
}

impl CaptionLayout {
    pub fn compute(text: &str, theme: &CaptionTheme, frame: FrameSize) -> Self {
        let top = (frame.height as f64 * TOP_RATIO) as u32;
        let step = theme.line_height();
        let lines = wrap_text(text, WRAP_CHARS)
            .into_iter()
            .enumerate()
            .map(|(i, text)| TextLine {
                text,
                y: top + i as u32 * step,
            })
            .collect();
        let cta = (!theme.cta.trim().is_empty()).then(|| TextLine {
            text: theme.cta.trim().to_string(),
            y: (frame.height as f64 * CTA_RATIO) as u32,
        });
        Self { frame, lines, cta }
    }
}

/// A rendered caption: a filter chain applied on top of the background.
#[derive(Debug)]
pub struct CaptionOverlay {
    pub filter: String,
    /// Scratch file the filter reads; kept alive until the overlay drops.
    _scratch: Option<TempArtifact>,
}

impl CaptionOverlay {
    pub fn filter_only(filter: String) -> Self {
        Self {
            filter,
            _scratch: None,
        }
    }

    pub fn with_scratch(filter: String, scratch: TempArtifact) -> Self {
        Self {
            filter,
            _scratch: Some(scratch),
        }
    }
}

pub trait CaptionRenderer: Send + Sync {
    /// Renders `text` over a frame of `frame` size for `duration` seconds.
    /// `output` is the video being built; scratch files are named after it.
    fn render(
        &self,
        text: &str,
        frame: FrameSize,
        duration: f64,
        output: &Path,
    ) -> Result<CaptionOverlay>;
}

/// ffmpeg `drawtext` per line; nothing is written to disk.
pub struct DrawTextCaptions {
    theme: CaptionTheme,
}

impl DrawTextCaptions {
    pub fn new(theme: CaptionTheme) -> Self {
        Self { theme }
    }

    fn drawtext(&self, line: &TextLine, size: u32, color: Rgb) -> String {
        format!(
            "drawtext=font={}:text={}:expansion=none:fontsize={}:fontcolor={}:x=(w-text_w)/2:y={}",
            escape_filter_value(&self.theme.font),
            escape_filter_value(&line.text),
            size,
            color.ffmpeg_hex(),
            line.y
        )
    }
}

impl CaptionRenderer for DrawTextCaptions {
    fn render(
        &self,
        text: &str,
        frame: FrameSize,
        _duration: f64,
        _output: &Path,
    ) -> Result<CaptionOverlay> {
        let layout = CaptionLayout::compute(text, &self.theme, frame);
        let mut parts: Vec<String> = layout
            .lines
            .iter()
            .map(|l| self.drawtext(l, self.theme.tip_size, self.theme.tip_color))
            .collect();
        if let Some(cta) = &layout.cta {
            parts.push(self.drawtext(cta, self.theme.cta_size, self.theme.cta_color));
        }
        let filter = if parts.is_empty() {
            "null".to_string()
        } else {
            parts.join(",")
        };
        Ok(CaptionOverlay::filter_only(filter))
    }
}

/// Writes an ASS script next to the output and burns it in with libass.
pub struct SubtitleCaptions {
    theme: CaptionTheme,
}

impl SubtitleCaptions {
    pub fn new(theme: CaptionTheme) -> Self {
        Self { theme }
    }
}

impl CaptionRenderer for SubtitleCaptions {
    fn render(
        &self,
        text: &str,
        frame: FrameSize,
        duration: f64,
        output: &Path,
    ) -> Result<CaptionOverlay> {
        let layout = CaptionLayout::compute(text, &self.theme, frame);
        let artifact = TempArtifact::new(output.with_extension("ass"));
        write_ass(artifact.path(), &layout, &self.theme, duration)?;
        debug!("Caption script written to {}", artifact.path().display());

        let filter = format!(
            "subtitles=filename={}",
            escape_filter_value(&artifact.path().to_string_lossy())
        );
        Ok(CaptionOverlay::with_scratch(filter, artifact))
    }
}

/// Escapes a filter option value twice: once for the filter's own option
/// parser and once for the filtergraph parser.
pub fn escape_filter_value(value: &str) -> String {
    let option = escape_chars(value, &['\\', '\'', ':']);
    escape_chars(&option, &['\\', '\'', '[', ']', ',', ';'])
}

fn escape_chars(value: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::FRAME;

    fn theme() -> CaptionTheme {
        CaptionTheme::new("DejaVu Sans", "Follow for daily tech tips")
    }

    #[test]
    fn layout_starts_at_fifth_of_frame_and_steps_by_line_height() {
        let layout = CaptionLayout::compute(
            "Press Ctrl+Shift+T to reopen the tab you just closed.",
            &theme(),
            FRAME,
        );
        let ys: Vec<u32> = layout.lines.iter().map(|l| l.y).collect();
        assert_eq!(ys, vec![384, 478, 572]);
        assert_eq!(layout.cta.as_ref().unwrap().y, 1689);
    }

    #[test]
    fn long_urls_are_broken_to_fit_the_frame() {
        let layout = CaptionLayout::compute(
            "Bookmark https://docs.example.com/keyboard-shortcuts today.",
            &theme(),
            FRAME,
        );
        assert!(layout.lines.len() > 2);
        assert!(
            layout.lines.iter().all(|l| l.text.chars().count() <= WRAP_CHARS),
            "{:?}",
            layout.lines
        );
    }

    #[test]
    fn blank_cta_is_omitted() {
        let layout = CaptionLayout::compute("Tip", &CaptionTheme::new("Arial", "  "), FRAME);
        assert!(layout.cta.is_none());
    }

    #[test]
    fn escapes_for_both_parser_levels() {
        assert_eq!(
            escape_filter_value("this is a 'string': may contain one, or more"),
            "this is a \\\\\\'string\\\\\\'\\\\: may contain one\\, or more"
        );
        assert_eq!(escape_filter_value("plain words"), "plain words");
    }

    #[test]
    fn drawtext_overlay_has_no_scratch_file() {
        let dir = tempfile::tempdir().unwrap();
        let overlay = DrawTextCaptions::new(theme())
            .render("Use two monitors.", FRAME, 8.0, &dir.path().join("a.mp4"))
            .unwrap();

        assert_eq!(overlay.filter.matches("drawtext=").count(), 2);
        assert!(overlay.filter.contains("text=Use two monitors.:"));
        assert!(overlay.filter.contains("fontsize=72:fontcolor=0xFFFFFF:x=(w-text_w)/2:y=384"));
        assert!(overlay.filter.contains("fontsize=38:fontcolor=0xE6E6E6:x=(w-text_w)/2:y=1689"));
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn subtitle_overlay_owns_its_script() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("tech_tip_1_1.mp4");
        let overlay = SubtitleCaptions::new(theme())
            .render("Use two monitors.", FRAME, 8.0, &output)
            .unwrap();

        let script = dir.path().join("tech_tip_1_1.ass");
        assert!(script.exists());
        assert!(overlay.filter.starts_with("subtitles=filename="));
        assert!(overlay.filter.contains("tech_tip_1_1.ass"));

        drop(overlay);
        assert!(!script.exists());
    }
}
