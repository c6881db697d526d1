//! Raster renderer built on embedded-graphics.
//!
//! Draws the same layout as the SVG renderer with ProFont bitmap fonts.
//! [`draw_state`] targets any `Rgb888` [`DrawTarget`], so a physical panel
//! driver can reuse it; [`FramebufferRenderer`] draws into an in-memory
//! [`Framebuffer`] and emits raw pixels.

use core::convert::Infallible;

use embedded_graphics::{
    mono_font::{MonoFont, MonoTextStyle},
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle},
    text::{Alignment, Baseline, Text, TextStyle, TextStyleBuilder},
};
use profont::{PROFONT_12_POINT, PROFONT_14_POINT, PROFONT_18_POINT, PROFONT_24_POINT};

use super::{
    format_countdown, progress_bar_width, to_title_case, ImageFormat, RenderState, RenderedImage,
    CANVAS_SIZE, PROGRESS_BAR_HEIGHT,
};
use crate::config::{
    parse_hex_color, ColorConfig, DEFAULT_BACKGROUND_COLOR, DEFAULT_PROGRESS_BAR_COLOR,
    DEFAULT_TEXT_COLOR,
};
use crate::traits::ImageRenderer;

const LINE_FONT: &MonoFont = &PROFONT_24_POINT;
const DESTINATION_FONT: &MonoFont = &PROFONT_14_POINT;
const COUNTDOWN_FONT: &MonoFont = &PROFONT_18_POINT;

const LEFT_BASELINE: TextStyle = TextStyleBuilder::new()
    .alignment(Alignment::Left)
    .baseline(Baseline::Alphabetic)
    .build();
const CENTER_BASELINE: TextStyle = TextStyleBuilder::new()
    .alignment(Alignment::Center)
    .baseline(Baseline::Alphabetic)
    .build();
const LEFT_TOP: TextStyle = TextStyleBuilder::new()
    .alignment(Alignment::Left)
    .baseline(Baseline::Top)
    .build();

// ============================================================================
// Framebuffer
// ============================================================================

/// 144×144 in-memory RGB888 canvas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Framebuffer {
    pixels: Vec<Rgb888>,
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Framebuffer {
    /// A black canvas.
    pub fn new() -> Self {
        Self {
            pixels: vec![Rgb888::BLACK; (CANVAS_SIZE * CANVAS_SIZE) as usize],
        }
    }

    /// Color at `(x, y)`, `None` outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb888> {
        if x >= CANVAS_SIZE || y >= CANVAS_SIZE {
            return None;
        }
        self.pixels.get((y * CANVAS_SIZE + x) as usize).copied()
    }

    /// Row-major RGB888 bytes.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|c| [c.r(), c.g(), c.b()])
            .collect()
    }
}

impl OriginDimensions for Framebuffer {
    fn size(&self) -> Size {
        Size::new(CANVAS_SIZE, CANVAS_SIZE)
    }
}

impl DrawTarget for Framebuffer {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) {
                if x < CANVAS_SIZE && y < CANVAS_SIZE {
                    self.pixels[(y * CANVAS_SIZE + x) as usize] = color;
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Drawing
// ============================================================================

fn to_rgb(hex: &str, fallback: &str) -> Rgb888 {
    let (r, g, b) = parse_hex_color(hex)
        .or_else(|| parse_hex_color(fallback))
        .unwrap_or((0, 0, 0));
    Rgb888::new(r, g, b)
}

/// Draws one frame onto any RGB888 target.
pub fn draw_state<D>(target: &mut D, state: &RenderState, colors: &ColorConfig) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    let background = to_rgb(&colors.background, DEFAULT_BACKGROUND_COLOR);
    let text = to_rgb(&colors.text, DEFAULT_TEXT_COLOR);
    target.clear(background)?;

    match state {
        RenderState::Placeholder(kind) => {
            let font = if kind.font_size() > 16 {
                &PROFONT_14_POINT
            } else {
                &PROFONT_12_POINT
            };
            let style = MonoTextStyle::new(font, text);
            for (line, y) in kind.lines().iter().zip(kind.rows()) {
                Text::with_text_style(line, Point::new(10, y), style, LEFT_TOP).draw(target)?;
            }
        }
        RenderState::Departures {
            first,
            second,
            progress_percent,
        } => {
            Text::with_text_style(
                &first.line,
                Point::new(10, 46),
                MonoTextStyle::new(LINE_FONT, text),
                LEFT_BASELINE,
            )
            .draw(target)?;
            Text::with_text_style(
                &to_title_case(&first.towards),
                Point::new(10, 79),
                MonoTextStyle::new(DESTINATION_FONT, text),
                LEFT_BASELINE,
            )
            .draw(target)?;

            let countdown_style = MonoTextStyle::new(COUNTDOWN_FONT, text);
            Text::with_text_style(
                &format_countdown(first),
                Point::new(10, 123),
                countdown_style,
                LEFT_BASELINE,
            )
            .draw(target)?;
            if let Some(second) = second {
                Text::with_text_style(
                    &format_countdown(second),
                    Point::new(72, 123),
                    countdown_style,
                    CENTER_BASELINE,
                )
                .draw(target)?;
            }

            if let Some(width) = progress_percent.and_then(|p| progress_bar_width(p, CANVAS_SIZE)) {
                if width > 0 {
                    let bar = to_rgb(&colors.progress_bar, DEFAULT_PROGRESS_BAR_COLOR);
                    Rectangle::new(
                        Point::new(0, (CANVAS_SIZE - PROGRESS_BAR_HEIGHT) as i32),
                        Size::new(width, PROGRESS_BAR_HEIGHT),
                    )
                    .into_styled(PrimitiveStyle::with_fill(bar))
                    .draw(target)?;
                }
            }
        }
    }
    Ok(())
}

/// Renders into a fresh [`Framebuffer`] and emits raw RGB888 bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct FramebufferRenderer;

impl FramebufferRenderer {
    /// Renders and returns the canvas itself.
    pub fn render_framebuffer(&self, state: &RenderState, colors: &ColorConfig) -> Framebuffer {
        let mut fb = Framebuffer::new();
        draw_state(&mut fb, state, colors).unwrap_or_else(|never| match never {});
        fb
    }
}

impl ImageRenderer for FramebufferRenderer {
    fn render(&self, state: &RenderState, colors: &ColorConfig) -> RenderedImage {
        RenderedImage {
            format: ImageFormat::RawRgb888,
            width: CANVAS_SIZE,
            height: CANVAS_SIZE,
            bytes: self.render_framebuffer(state, colors).to_rgb_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::departure::Departure;
    use crate::render::PlaceholderKind;

    #[test]
    fn background_fills_canvas() {
        let colors = ColorConfig {
            background: "#102030".into(),
            ..ColorConfig::default()
        };
        let fb = FramebufferRenderer
            .render_framebuffer(&RenderState::Placeholder(PlaceholderKind::NoLineMatch), &colors);
        assert_eq!(fb.pixel(143, 0), Some(Rgb888::new(0x10, 0x20, 0x30)));
        assert_eq!(fb.pixel(144, 0), None);
    }

    #[test]
    fn progress_bar_covers_half() {
        let state = RenderState::Departures {
            first: Departure::new("U1", "LEOPOLDAU", 3),
            second: None,
            progress_percent: Some(50.0),
        };
        let fb = FramebufferRenderer.render_framebuffer(&state, &ColorConfig::default());
        let bar = Rgb888::new(0x52, 0x50, 0x03);
        assert_eq!(fb.pixel(0, 142), Some(bar));
        assert_eq!(fb.pixel(71, 143), Some(bar));
        assert_eq!(fb.pixel(72, 143), Some(Rgb888::BLACK));
    }

    #[test]
    fn raw_output_size() {
        let image = FramebufferRenderer.render(
            &RenderState::Placeholder(PlaceholderKind::FetchError),
            &ColorConfig::default(),
        );
        assert_eq!(image.format, ImageFormat::RawRgb888);
        assert_eq!(image.bytes.len(), 144 * 144 * 3);
    }
}
