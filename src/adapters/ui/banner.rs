//! Startup banner: "CAMPUS" in the standard figlet font with a vertical gradient.

use crossterm::ExecutableCommand;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use figlet_rs::FIGfont;
use std::io::{Write, stdout};

/// Institutional blue (#1d4ed8).
pub const CAMPUS_BLUE: (u8, u8, u8) = (0x1d, 0x4e, 0xd8);
/// Accent purple (#9333ea).
pub const ACCENT_PURPLE: (u8, u8, u8) = (0x93, 0x33, 0xea);

/// Linear interpolation between two RGB colors. `t` in [0.0, 1.0].
pub fn lerp_rgb(a: (u8, u8, u8), b: (u8, u8, u8), t: f64) -> (u8, u8, u8) {
    let t = t.clamp(0.0, 1.0);
    let r = (f64::from(a.0) * (1.0 - t) + f64::from(b.0) * t).round() as u8;
    let g = (f64::from(a.1) * (1.0 - t) + f64::from(b.1) * t).round() as u8;
    let bl = (f64::from(a.2) * (1.0 - t) + f64::from(b.2) * t).round() as u8;
    (r, g, bl)
}

pub fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb { r, g, b }
}

/// Figlet art for `text`, or the plain text if the font cannot render it.
fn render_art(text: &str) -> String {
    FIGfont::standard()
        .ok()
        .and_then(|font| font.convert(text).map(|f| f.to_string()))
        .unwrap_or_else(|| text.to_string())
}

/// Prints the welcome banner, then version and subtitle.
pub fn print_welcome() {
    let mut out = stdout();
    let art = render_art("CAMPUS");
    let lines: Vec<&str> = art.lines().collect();
    let total = lines.len().max(1);

    for (i, line) in lines.iter().enumerate() {
        let t = if total <= 1 {
            1.0
        } else {
            i as f64 / (total - 1) as f64
        };
        let _ = out.execute(SetForegroundColor(rgb(lerp_rgb(CAMPUS_BLUE, ACCENT_PURPLE, t))));
        let _ = out.execute(Print(line));
        let _ = out.execute(Print("\r\n"));
        let _ = out.execute(ResetColor);
    }

    let version = env!("CARGO_PKG_VERSION");
    let _ = out.execute(SetForegroundColor(rgb(ACCENT_PURPLE)));
    let _ = out.execute(Print(format!("campus-display v{}\r\n", version)));
    let _ = out.execute(Print("Courses, masters and news for the lobby screen\r\n"));
    let _ = out.execute(ResetColor);
    let _ = out.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_endpoints() {
        assert_eq!(lerp_rgb(CAMPUS_BLUE, ACCENT_PURPLE, 0.0), CAMPUS_BLUE);
        assert_eq!(lerp_rgb(CAMPUS_BLUE, ACCENT_PURPLE, 1.0), ACCENT_PURPLE);
        assert_eq!(lerp_rgb(CAMPUS_BLUE, ACCENT_PURPLE, 7.0), ACCENT_PURPLE);
    }

    #[test]
    fn test_art_is_multiline() {
        assert!(render_art("CAMPUS").lines().count() > 1);
    }
}
