use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::background::Rgb;
use crate::caption::{CaptionLayout, CaptionTheme, TextLine};
use crate::error::Result;

const TIP_STYLE: &str = "Tip";
const CTA_STYLE: &str = "Cta";

/// Writes a caption layout as an ASS script with every line pinned at its
/// absolute position, so libass draws exactly what drawtext would.
pub fn write_ass_document<W: Write>(
    w: &mut W,
    layout: &CaptionLayout,
    theme: &CaptionTheme,
    duration: f64,
) -> std::io::Result<()> {
    writeln!(w, "[Script Info]")?;
    writeln!(w, "ScriptType: v4.00+")?;
    writeln!(w, "PlayResX: {}", layout.frame.width)?;
    writeln!(w, "PlayResY: {}", layout.frame.height)?;
    writeln!(w, "WrapStyle: 2")?;
    writeln!(w, "ScaledBorderAndShadow: yes")?;
    writeln!(w)?;

    writeln!(w, "[V4+ Styles]")?;
    writeln!(
        w,
        "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, \
         BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, \
         BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding"
    )?;
    writeln!(w, "{}", style_line(TIP_STYLE, theme, theme.tip_size, theme.tip_color, true))?;
    writeln!(w, "{}", style_line(CTA_STYLE, theme, theme.cta_size, theme.cta_color, false))?;
    writeln!(w)?;

    writeln!(w, "[Events]")?;
    writeln!(
        w,
        "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text"
    )?;
    let center = layout.frame.width / 2;
    let end = format_ass_time(duration);
    for line in &layout.lines {
        writeln!(w, "{}", dialogue(TIP_STYLE, center, line, &end))?;
    }
    if let Some(cta) = &layout.cta {
        writeln!(w, "{}", dialogue(CTA_STYLE, center, cta, &end))?;
    }
    Ok(())
}

pub fn write_ass(
    path: &Path,
    layout: &CaptionLayout,
    theme: &CaptionTheme,
    duration: f64,
) -> Result<()> {
    let mut f = BufWriter::new(File::create(path)?);
    write_ass_document(&mut f, layout, theme, duration)?;
    f.flush()?;
    Ok(())
}

fn style_line(name: &str, theme: &CaptionTheme, size: u32, color: Rgb, bold: bool) -> String {
    // top-center alignment (8), no outline, no shadow, no box
    format!(
        "Style: {},{},{},{},{},&H00000000,&H00000000,{},0,0,0,100,100,0,0,1,0,0,8,0,0,0,1",
        name,
        theme.font,
        size,
        ass_colour(color),
        ass_colour(color),
        if bold { -1 } else { 0 }
    )
}

fn dialogue(style: &str, x: u32, line: &TextLine, end: &str) -> String {
    format!(
        "Dialogue: 0,0:00:00.00,{},{},,0,0,0,,{{\\an8\\pos({},{})}}{}",
        end,
        style,
        x,
        line.y,
        escape_ass_text(&line.text)
    )
}

/// ASS colours are `&HAABBGGRR`.
fn ass_colour(c: Rgb) -> String {
    format!("&H00{:02X}{:02X}{:02X}", c.2, c.1, c.0)
}

fn format_ass_time(seconds: f64) -> String {
    let total_cs = (seconds * 100.0).round() as u64;
    let cs = total_cs % 100;
    let total_sec = total_cs / 100;
    let s = total_sec % 60;
    let total_min = total_sec / 60;
    let m = total_min % 60;
    let h = total_min / 60;
    format!("{}:{:02}:{:02}.{:02}", h, m, s, cs)
}

fn escape_ass_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '{' => out.push('('),
            '}' => out.push(')'),
            // keep `\N`, `\h` and friends from being read as override codes
            '\\' => out.push_str("\\\u{200B}"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::FRAME;

    #[test]
    fn formats_centisecond_timestamps() {
        assert_eq!(format_ass_time(8.0), "0:00:08.00");
        assert_eq!(format_ass_time(25.456), "0:00:25.46");
        assert_eq!(format_ass_time(3725.0), "1:02:05.00");
    }

    #[test]
    fn colours_are_bgr() {
        assert_eq!(ass_colour(Rgb(230, 230, 230)), "&H00E6E6E6");
        assert_eq!(ass_colour(Rgb(255, 0, 16)), "&H001000FF");
    }

    #[test]
    fn document_pins_each_line() {
        let theme = CaptionTheme::new("DejaVu Sans", "Follow me");
        let layout = CaptionLayout::compute("Use two monitors for {real} work.", &theme, FRAME);
        let mut buf = Vec::new();
        write_ass_document(&mut buf, &layout, &theme, 8.0).unwrap();
        let doc = String::from_utf8(buf).unwrap();

        assert!(doc.contains("PlayResX: 1080\nPlayResY: 1920"));
        assert!(doc.contains("Style: Tip,DejaVu Sans,72,&H00FFFFFF"));
        assert!(doc.contains("Style: Cta,DejaVu Sans,38,&H00E6E6E6"));
        let first = &layout.lines[0];
        assert!(doc.contains(&format!(
            "Dialogue: 0,0:00:00.00,0:00:08.00,Tip,,0,0,0,,{{\\an8\\pos(540,{})}}{}",
            first.y, first.text
        )));
        assert!(doc.contains("(real)"));
        assert!(doc.contains("Cta,,0,0,0,,{\\an8\\pos(540,1689)}Follow me"));
        assert_eq!(doc.matches("Dialogue:").count(), layout.lines.len() + 1);
    }
}
