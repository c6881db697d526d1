//! Type-erased renderers for runtime selection.
//!
//! [`AnyRenderer`] wraps any [`ImageRenderer`] that is `Send + Sync +
//! 'static` in an `Arc`, so the monitor can hold one renderer type no matter
//! which implementation the host picked.
//!
//! ```rust
//! use rs_departures::render::SvgRenderer;
//! use rs_departures::AnyRenderer;
//!
//! let renderers: Vec<AnyRenderer> = vec![AnyRenderer::new(SvgRenderer), AnyRenderer::default()];
//! assert!(renderers.iter().all(|r| r.name().ends_with("SvgRenderer")));
//! ```
//!
//! Type erasure costs one allocation per renderer and a virtual call per
//! frame.

use std::sync::Arc;

use crate::config::ColorConfig;
use crate::render::{RenderState, RenderedImage, SvgRenderer};
use crate::traits::ImageRenderer;

/// Type-erased wrapper for any renderer.
///
/// # Example
///
/// ```rust
/// use rs_departures::config::ColorConfig;
/// use rs_departures::render::{PlaceholderKind, RenderState, SvgRenderer};
/// use rs_departures::traits::ImageRenderer;
/// use rs_departures::AnyRenderer;
///
/// let renderer = AnyRenderer::new(SvgRenderer);
/// let image = renderer.render(
///     &RenderState::Placeholder(PlaceholderKind::InvalidStopId),
///     &ColorConfig::default(),
/// );
/// assert!(image.as_svg().unwrap().contains(">RBL</text>"));
/// ```
#[derive(Clone)]
pub struct AnyRenderer {
    inner: Arc<dyn ImageRenderer + Send + Sync>,
    name: &'static str,
}

impl core::fmt::Debug for AnyRenderer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AnyRenderer").field("name", &self.name).finish()
    }
}

impl AnyRenderer {
    /// Wrap a concrete renderer in a type-erased container
    pub fn new<R: ImageRenderer + Send + Sync + 'static>(renderer: R) -> Self {
        Self {
            inner: Arc::new(renderer),
            name: core::any::type_name::<R>(),
        }
    }

    /// Type name of the wrapped renderer.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Default for AnyRenderer {
    fn default() -> Self {
        Self::new(SvgRenderer)
    }
}

impl ImageRenderer for AnyRenderer {
    fn render(&self, state: &RenderState, colors: &ColorConfig) -> RenderedImage {
        self.inner.render(state, colors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{ImageFormat, PlaceholderKind};

    struct Blank;

    impl ImageRenderer for Blank {
        fn render(&self, _state: &RenderState, _colors: &ColorConfig) -> RenderedImage {
            RenderedImage {
                format: ImageFormat::RawRgb888,
                width: 1,
                height: 1,
                bytes: vec![0, 0, 0],
            }
        }
    }

    #[test]
    fn delegates_to_inner() {
        let state = RenderState::Placeholder(PlaceholderKind::NoLineMatch);
        let colors = ColorConfig::default();

        let svg = AnyRenderer::default().render(&state, &colors);
        assert_eq!(svg, SvgRenderer.render(&state, &colors));

        let blank = AnyRenderer::new(Blank).render(&state, &colors);
        assert_eq!(blank.bytes, vec![0, 0, 0]);
    }

    #[test]
    fn clones_share_renderer() {
        let renderer = AnyRenderer::new(Blank);
        let clone = renderer.clone();
        assert_eq!(renderer.name(), clone.name());
        assert!(format!("{renderer:?}").contains("Blank"));
    }
}
