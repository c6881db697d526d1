//! SVG text renderer.

use super::{
    format_countdown, progress_bar_width, to_title_case, PlaceholderKind, RenderState,
    RenderedImage, CANVAS_SIZE, PROGRESS_BAR_HEIGHT,
};
use crate::config::ColorConfig;
use crate::departure::Departure;
use crate::traits::ImageRenderer;

const FONT_FAMILY: &str = "sans-serif";

/// Renders widget states as 144×144 SVG documents.
///
/// Output is deterministic: the same state and colors always produce the
/// same bytes.
///
/// # Example
///
/// ```rust
/// use rs_departures::config::ColorConfig;
/// use rs_departures::render::{PlaceholderKind, RenderState, SvgRenderer};
/// use rs_departures::traits::ImageRenderer;
///
/// let image = SvgRenderer.render(
///     &RenderState::Placeholder(PlaceholderKind::NoDeparturesSoon),
///     &ColorConfig::default(),
/// );
/// let svg = image.as_svg().unwrap();
/// assert!(svg.starts_with("<svg width=\"144\" height=\"144\""));
/// assert!(svg.contains(">Departures</text>"));
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct SvgRenderer;

impl SvgRenderer {
    /// Renders straight to a `String`.
    pub fn render_svg(&self, state: &RenderState, colors: &ColorConfig) -> String {
        let mut svg = open_document(colors);
        match state {
            RenderState::Placeholder(kind) => placeholder(&mut svg, *kind, colors),
            RenderState::Departures {
                first,
                second,
                progress_percent,
            } => {
                departures(&mut svg, first, second.as_ref(), colors);
                if let Some(width) = progress_percent.and_then(|p| progress_bar_width(p, CANVAS_SIZE)) {
                    svg.push_str(&format!(
                        "\n\t<rect x=\"0\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\"/>",
                        CANVAS_SIZE - PROGRESS_BAR_HEIGHT,
                        width,
                        PROGRESS_BAR_HEIGHT,
                        escape_xml(&colors.progress_bar)
                    ));
                }
            }
        }
        svg.push_str("</svg>");
        svg
    }
}

impl ImageRenderer for SvgRenderer {
    fn render(&self, state: &RenderState, colors: &ColorConfig) -> RenderedImage {
        RenderedImage::svg(self.render_svg(state, colors))
    }
}

fn open_document(colors: &ColorConfig) -> String {
    format!(
        "<svg width=\"{size}\" height=\"{size}\" xmlns=\"http://www.w3.org/2000/svg\">\n\t<rect width=\"{size}\" height=\"{size}\" fill=\"{bg}\"/>",
        size = CANVAS_SIZE,
        bg = escape_xml(&colors.background)
    )
}

fn placeholder(svg: &mut String, kind: PlaceholderKind, colors: &ColorConfig) {
    let fill = escape_xml(&colors.text);
    for (text, y) in kind.lines().iter().zip(kind.rows()) {
        svg.push_str(&format!(
            "\n\t<text x=\"10\" y=\"{y}\" font-family=\"{FONT_FAMILY}\" font-size=\"{}\" fill=\"{fill}\" dominant-baseline=\"hanging\">{}</text>",
            kind.font_size(),
            escape_xml(text)
        ));
    }
}

fn departures(svg: &mut String, first: &Departure, second: Option<&Departure>, colors: &ColorConfig) {
    let fill = escape_xml(&colors.text);

    svg.push_str(&format!(
        "\n\t<text x=\"10\" y=\"46\" font-family=\"{FONT_FAMILY}\" font-size=\"36\" font-weight=\"bold\" fill=\"{fill}\">{}</text>",
        escape_xml(&first.line)
    ));
    svg.push_str(&format!(
        "\n\t<text x=\"10\" y=\"79\" font-family=\"{FONT_FAMILY}\" font-size=\"22\" fill=\"{fill}\">{}</text>",
        escape_xml(&to_title_case(&first.towards))
    ));
    svg.push_str(&format!(
        "\n\t<text x=\"10\" y=\"123\" font-family=\"{FONT_FAMILY}\" font-size=\"28\" font-weight=\"bold\" fill=\"{fill}\">{}</text>",
        format_countdown(first)
    ));
    if let Some(second) = second {
        svg.push_str(&format!(
            "\n\t<text x=\"72\" y=\"123\" font-family=\"{FONT_FAMILY}\" font-size=\"28\" font-weight=\"bold\" fill=\"{fill}\" text-anchor=\"middle\">{}</text>",
            format_countdown(second)
        ));
    }
}

/// Escapes `& < > " '` for use in SVG text and attribute values.
///
/// ```rust
/// use rs_departures::render::escape_xml;
///
/// assert_eq!(escape_xml("A&B <C>"), "A&amp;B &lt;C&gt;");
/// ```
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
