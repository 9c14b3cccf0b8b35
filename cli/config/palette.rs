use std::collections::HashMap;

use indexmap::IndexMap;
use nu_ansi_term::{Color, Style};
use pgex_core::Paint;
use tracing::{debug, trace, warn};

/// User defined color names, e.g. `accent = "#ff8800"`.
pub type Palette = IndexMap<String, String>;

/// A `nu_ansi_term` style usable wherever the render engine wants a [`Paint`].
#[derive(Debug, Clone, Copy)]
pub struct AnsiPaint(pub Style);

impl Paint for AnsiPaint {
    fn paint(&self, text: &str) -> String {
        self.0.paint(text).to_string()
    }
}

/** Parse a string that represents a color setting, returning None if this fails
 There are three valid color formats:
  - #RRGGBB      (a hash followed by an RGB hex)
  - u8           (a number from 0-255, representing an ANSI color)
  - colstring    (one of the 16 predefined color strings or a custom user-defined color)
*/
pub fn parse_color_string(color_string: &str, palette: Option<&Palette>) -> Option<Color> {
    trace!("Parsing color_string: {}", color_string);
    if let Some(hex) = color_string.strip_prefix('#') {
        trace!("Attempting to read hexadecimal color string: {}", color_string);
        if hex.len() != 6 || !hex.is_ascii() {
            debug!("Could not parse hexadecimal string: {}", color_string);
            return None;
        }
        let r: u8 = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g: u8 = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b: u8 = u8::from_str_radix(&hex[4..6], 16).ok()?;
        trace!("Read RGB color string: {},{},{}", r, g, b);
        return Some(Color::Rgb(r, g, b));
    }

    if let Ok(ansi_color_num) = color_string.parse::<u8>() {
        trace!("Read ANSI color string: {}", ansi_color_num);
        return Some(Color::Fixed(ansi_color_num));
    }

    if let Some(palette_color) = palette.and_then(|p| p.get(color_string)) {
        trace!(
            "Read user-defined color string: {} defined as {}",
            color_string,
            palette_color
        );
        // palette entries may not refer to other palette entries
        return parse_color_string(palette_color, None);
    }

    // There are no predefined enums for bright colors, so we use Color::Fixed
    let predefined_color = match color_string.to_lowercase().as_str() {
        "black" => Some(Color::Black),
        "red" => Some(Color::Red),
        "green" => Some(Color::Green),
        "yellow" => Some(Color::Yellow),
        "blue" => Some(Color::Blue),
        "purple" => Some(Color::Purple),
        "cyan" => Some(Color::Cyan),
        "white" => Some(Color::White),
        "bright-black" => Some(Color::DarkGray),
        "bright-red" => Some(Color::LightRed),
        "bright-green" => Some(Color::LightGreen),
        "bright-yellow" => Some(Color::LightYellow),
        "bright-blue" => Some(Color::LightBlue),
        "bright-purple" => Some(Color::LightPurple),
        "bright-cyan" => Some(Color::LightCyan),
        "bright-white" => Some(Color::LightGray),
        _ => None,
    };

    if predefined_color.is_some() {
        trace!("Read predefined color: {}", color_string);
    } else {
        debug!("Could not parse color in string: {}", color_string);
    }
    predefined_color
}

/// Parse a style string of space separated words: colors for the foreground,
/// `bg:<color>` for the background and the attributes `bold`, `dimmed`, `italic`,
/// `underline` and `reverse`. Unknown words are logged and skipped.
pub fn parse_style_string(style_string: &str, palette: Option<&Palette>) -> Style {
    let mut style = Style::new();
    for word in style_string.split_whitespace() {
        match word.to_lowercase().as_str() {
            "bold" => style = style.bold(),
            "dimmed" => style = style.dimmed(),
            "italic" => style = style.italic(),
            "underline" => style = style.underline(),
            "reverse" => style = style.reverse(),
            "none" => {}
            _ => {
                if let Some(bg) = word.strip_prefix("bg:") {
                    match parse_color_string(bg, palette) {
                        Some(color) => style = style.on(color),
                        None => warn!("Ignoring unknown background color: {}", bg),
                    }
                } else {
                    match parse_color_string(word, palette) {
                        Some(color) => style = style.fg(color),
                        None => warn!("Ignoring unknown style word: {}", word),
                    }
                }
            }
        }
    }
    style
}

pub fn get_palette<'a>(
    palettes: &'a HashMap<String, Palette>,
    palette_name: Option<&str>,
) -> Option<&'a Palette> {
    if let Some(palette_name) = palette_name {
        let palette = palettes.get(palette_name);
        if palette.is_some() {
            trace!("Found color palette: {}", palette_name);
        } else {
            warn!("Could not find color palette: {}", palette_name);
        }
        palette
    } else {
        trace!("No color palette specified, using defaults");
        None
    }
}
