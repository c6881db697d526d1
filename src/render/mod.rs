//! Render states and the helpers shared by every renderer.
//!
//! A widget is always in exactly one [`RenderState`]: a fixed three-line
//! placeholder, or a departure view with an optional progress bar. Renderers
//! turn that state plus a [`ColorConfig`](crate::config::ColorConfig) into a
//! [`RenderedImage`].
//!
//! # Layout (144×144)
//!
//! ```text
//! ┌──────────────────────┐
//! │ U1                   │  line code, bold 36px, baseline y=46
//! │ Leopoldau            │  destination, 22px, baseline y=79
//! │                      │
//! │ 3         7          │  countdowns, bold 28px, baseline y=123
//! │████████░░░░░░░░░░░░░░│  progress bar, y=142, 2px
//! └──────────────────────┘
//! ```
//!
//! # Renderers
//!
//! - [`SvgRenderer`]: SVG text, the format hosts accept as a data URL
//! - `FramebufferRenderer` (`graphics` feature): raw RGB888 pixels via
//!   embedded-graphics

mod svg;

#[cfg(feature = "graphics")]
mod graphics;

pub use svg::{escape_xml, SvgRenderer};

#[cfg(feature = "graphics")]
pub use graphics::{draw_state, Framebuffer, FramebufferRenderer};

use crate::departure::Departure;

/// Canvas width and height in pixels.
pub const CANVAS_SIZE: u32 = 144;

/// Height of the progress bar strip at the bottom of the canvas.
pub const PROGRESS_BAR_HEIGHT: u32 = 2;

// ============================================================================
// States
// ============================================================================

/// Fixed three-line messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlaceholderKind {
    /// No stop id in the settings.
    NoStationConfigured,
    /// The stop id isn't a number.
    InvalidStopId,
    /// The stop has no departures.
    NoDeparturesSoon,
    /// The line filter removed everything.
    NoLineMatch,
    /// The last fetch failed.
    FetchError,
}

impl PlaceholderKind {
    /// The three lines of text, top to bottom.
    pub fn lines(self) -> [&'static str; 3] {
        match self {
            Self::NoStationConfigured => ["No Station", "set in", "Settings"],
            Self::InvalidStopId => ["Invalid", "RBL", "Number"],
            Self::NoDeparturesSoon => ["No", "Departures", "Soon"],
            Self::NoLineMatch => ["No", "Line", "Found"],
            Self::FetchError => ["Error", "Fetching", "Data"],
        }
    }

    /// Font size in pixels.
    pub fn font_size(self) -> u32 {
        match self {
            Self::NoStationConfigured => 20,
            _ => 16,
        }
    }

    /// Top edge of each line.
    pub fn rows(self) -> [i32; 3] {
        match self {
            Self::NoStationConfigured => [30, 60, 90],
            Self::NoLineMatch => [40, 65, 90],
            _ => [20, 45, 70],
        }
    }
}

/// The departures currently shown by a widget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayPair {
    /// Earliest departure.
    pub first: Departure,
    /// Next departure of the same line, if any.
    pub second: Option<Departure>,
}

impl DisplayPair {
    /// Render state for this pair with the given progress.
    pub fn to_state(&self, progress_percent: Option<f64>) -> RenderState {
        RenderState::Departures {
            first: self.first.clone(),
            second: self.second.clone(),
            progress_percent,
        }
    }
}

/// Everything a renderer needs to draw one frame.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderState {
    /// A fixed message.
    Placeholder(PlaceholderKind),
    /// Departure view.
    Departures {
        /// Earliest departure.
        first: Departure,
        /// Same-line follow-up, shown centered.
        second: Option<Departure>,
        /// Elapsed share of the refresh interval, 0..=100. `None` hides the bar.
        progress_percent: Option<f64>,
    },
}

impl From<PlaceholderKind> for RenderState {
    fn from(kind: PlaceholderKind) -> Self {
        RenderState::Placeholder(kind)
    }
}

// ============================================================================
// Output
// ============================================================================

/// Encoding of [`RenderedImage::bytes`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageFormat {
    /// UTF-8 SVG document.
    Svg,
    /// Row-major RGB888, three bytes per pixel.
    RawRgb888,
}

impl ImageFormat {
    /// MIME type for this format.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Svg => "image/svg+xml",
            Self::RawRgb888 => "application/octet-stream",
        }
    }
}

/// One rendered frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedImage {
    /// How `bytes` is encoded.
    pub format: ImageFormat,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Encoded image.
    pub bytes: Vec<u8>,
}

impl RenderedImage {
    /// Wraps an SVG document.
    pub fn svg(document: String) -> Self {
        Self {
            format: ImageFormat::Svg,
            width: CANVAS_SIZE,
            height: CANVAS_SIZE,
            bytes: document.into_bytes(),
        }
    }

    /// The image as text, for SVG output.
    pub fn as_svg(&self) -> Option<&str> {
        match self.format {
            ImageFormat::Svg => core::str::from_utf8(&self.bytes).ok(),
            ImageFormat::RawRgb888 => None,
        }
    }

    /// A `data:` URL hosts accept in place of an image file.
    ///
    /// ```rust
    /// use rs_departures::render::RenderedImage;
    ///
    /// let image = RenderedImage::svg("<svg a=\"1\"/>".into());
    /// assert_eq!(
    ///     image.to_data_url(),
    ///     "data:image/svg+xml;charset=utf-8,%3Csvg%20a%3D%221%22%2F%3E"
    /// );
    /// ```
    pub fn to_data_url(&self) -> String {
        let charset = match self.format {
            ImageFormat::Svg => ";charset=utf-8",
            ImageFormat::RawRgb888 => "",
        };
        format!(
            "data:{}{},{}",
            self.format.mime_type(),
            charset,
            percent_encode(&self.bytes)
        )
    }
}

// ============================================================================
// Text helpers
// ============================================================================

/// Lower-cases the text, then capitalizes the first character and every
/// character following a space or hyphen.
///
/// ```rust
/// use rs_departures::render::to_title_case;
///
/// assert_eq!(to_title_case("SCHWEDENPLATZ"), "Schwedenplatz");
/// assert_eq!(to_title_case("WIEN MITTE-LANDSTRASSE"), "Wien Mitte-Landstrasse");
/// ```
pub fn to_title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_boundary = true;
    for c in text.chars() {
        if at_boundary {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        at_boundary = c.is_whitespace() || c == '-';
    }
    out
}

/// Countdown label: the minutes, or `*` when due.
pub fn format_countdown(departure: &Departure) -> String {
    if departure.is_due() {
        "*".to_string()
    } else {
        departure.countdown.to_string()
    }
}

/// Progress bar width in pixels for a canvas `width` wide.
///
/// Returns `None` for negative or NaN percentages, which hide the bar.
pub fn progress_bar_width(percent: f64, width: u32) -> Option<u32> {
    if percent.is_nan() || percent < 0.0 {
        return None;
    }
    let px = (f64::from(width) * percent / 100.0).floor();
    Some(px.min(f64::from(width)) as u32)
}

/// Percent-encodes everything outside `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
fn percent_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(bytes.len() * 3);
    for &b in bytes {
        let unreserved = b.is_ascii_alphanumeric()
            || matches!(b, b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')');
        if unreserved {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[usize::from(b >> 4)] as char);
            out.push(HEX[usize::from(b & 0x0f)] as char);
        }
    }
    out
}
