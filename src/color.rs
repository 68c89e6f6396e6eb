use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A theme color as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    /// Index into the terminal's 256-color palette.
    Ansi256(u8),
    Hex { r: u8, g: u8, b: u8 },
}

/// How many colors the terminal can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorDepth {
    #[default]
    TrueColor,
    Color256,
    Color16,
}

#[derive(Debug, Error)]
#[error("invalid color value for field \"{field}\": \"{value}\"")]
pub struct ColorParseError {
    pub field: String,
    pub value: String,
}

impl Color {
    /// Parse `"0"`..`"255"`, `"#RRGGBB"` or `"#RGB"`. `field` only feeds the
    /// error message.
    ///
    /// # Errors
    ///
    /// Returns `ColorParseError` if the string is not a valid color.
    pub fn parse(s: &str, field: &str) -> Result<Self, ColorParseError> {
        let err = || ColorParseError {
            field: field.to_owned(),
            value: s.to_owned(),
        };
        let s = s.trim();
        match s.strip_prefix('#') {
            Some(hex) => parse_hex(hex).ok_or_else(err),
            None => s.parse::<u8>().map(Color::Ansi256).map_err(|_| err()),
        }
    }

    /// Convert to a `crossterm::style::Color` at the given terminal color depth.
    pub fn to_crossterm_color(self, depth: ColorDepth) -> crossterm::style::Color {
        use crossterm::style::Color as Ct;
        match (self, depth) {
            (Color::Hex { r, g, b }, ColorDepth::TrueColor) => Ct::Rgb { r, g, b },
            (Color::Hex { r, g, b }, ColorDepth::Color256) => Ct::AnsiValue(nearest_cube(r, g, b)),
            (Color::Ansi256(n), ColorDepth::TrueColor | ColorDepth::Color256) => named_or_indexed(n),
            (c, ColorDepth::Color16) => {
                let (r, g, b) = c.to_rgb();
                named_or_indexed(nearest_basic(r, g, b))
            }
        }
    }

    fn to_rgb(self) -> (u8, u8, u8) {
        match self {
            Color::Hex { r, g, b } => (r, g, b),
            Color::Ansi256(n) => palette_rgb(n),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Ansi256(n) => write!(f, "{n}"),
            Color::Hex { r, g, b } => write!(f, "#{r:02x}{g:02x}{b:02x}"),
        }
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::parse(s, "<unknown>")
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        6 => Some(Color::Hex {
            r: channel(&hex[0..2])?,
            g: channel(&hex[2..4])?,
            b: channel(&hex[4..6])?,
        }),
        // #abc is shorthand for #aabbcc.
        3 => Some(Color::Hex {
            r: channel(&hex[0..1])? * 17,
            g: channel(&hex[1..2])? * 17,
            b: channel(&hex[2..3])? * 17,
        }),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Color depth detection
// ---------------------------------------------------------------------------

impl ColorDepth {
    /// Detect terminal color depth from `COLORTERM` and `TERM`.
    pub fn detect() -> Self {
        if let Ok(ct) = std::env::var("COLORTERM")
            && (ct == "truecolor" || ct == "24bit")
        {
            return ColorDepth::TrueColor;
        }
        if let Ok(term) = std::env::var("TERM")
            && term.contains("256color")
        {
            return ColorDepth::Color256;
        }
        ColorDepth::Color16
    }
}

// ---------------------------------------------------------------------------
// Palette mapping
// ---------------------------------------------------------------------------

// Indices 0-15 use crossterm's named colors so the terminal renders them with
// the user's own palette instead of the fixed 256-color table.
fn named_or_indexed(n: u8) -> crossterm::style::Color {
    use crossterm::style::Color as Ct;
    const NAMED: [Ct; 16] = [
        Ct::Black,
        Ct::DarkRed,
        Ct::DarkGreen,
        Ct::DarkYellow,
        Ct::DarkBlue,
        Ct::DarkMagenta,
        Ct::DarkCyan,
        Ct::Grey,
        Ct::DarkGrey,
        Ct::Red,
        Ct::Green,
        Ct::Yellow,
        Ct::Blue,
        Ct::Magenta,
        Ct::Cyan,
        Ct::White,
    ];
    NAMED.get(usize::from(n)).copied().unwrap_or(Ct::AnsiValue(n))
}

const CUBE_STEPS: [u8; 6] = [0, 95, 135, 175, 215, 255];

fn palette_rgb(n: u8) -> (u8, u8, u8) {
    const BASIC: [(u8, u8, u8); 16] = [
        (0, 0, 0),
        (128, 0, 0),
        (0, 128, 0),
        (128, 128, 0),
        (0, 0, 128),
        (128, 0, 128),
        (0, 128, 128),
        (192, 192, 192),
        (128, 128, 128),
        (255, 0, 0),
        (0, 255, 0),
        (255, 255, 0),
        (0, 0, 255),
        (255, 0, 255),
        (0, 255, 255),
        (255, 255, 255),
    ];
    match n {
        0..=15 => BASIC[usize::from(n)],
        16..=231 => {
            let i = n - 16;
            let step = |k: u8| CUBE_STEPS[usize::from(k)];
            (step(i / 36), step((i / 6) % 6), step(i % 6))
        }
        232..=255 => {
            let v = 8 + 10 * (n - 232);
            (v, v, v)
        }
    }
}

fn nearest_cube(r: u8, g: u8, b: u8) -> u8 {
    let level = |v: u8| -> u8 {
        let idx = CUBE_STEPS
            .iter()
            .enumerate()
            .min_by_key(|(_, s)| s.abs_diff(v))
            .map_or(0, |(i, _)| i);
        u8::try_from(idx).unwrap_or(0)
    };
    16 + 36 * level(r) + 6 * level(g) + level(b)
}

fn nearest_basic(r: u8, g: u8, b: u8) -> u8 {
    let bright = (u16::from(r) + u16::from(g) + u16::from(b)) / 3 > 128;
    let base = u8::from(r > 128) | (u8::from(g > 128) << 1) | (u8::from(b > 128) << 2);
    if bright { base + 8 } else { base }
}
