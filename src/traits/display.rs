//! Display abstractions: where images go, and how they are produced.
//!
//! - [`WidgetSurface`] is the host side. It receives the rendered image and
//!   title for a widget.
//! - [`ImageRenderer`] is a pure mapping from [`RenderState`] and
//!   [`ColorConfig`] to a [`RenderedImage`].

use core::future::Future;

use crate::config::ColorConfig;
use crate::error::SurfaceError;
use crate::render::{RenderState, RenderedImage};

/// Host-side display sink for widgets.
///
/// Implementors forward to the real host (a device SDK, a web page, a test
/// buffer). Errors are logged by the caller and never stop monitoring.
///
/// # Example
///
/// ```rust,ignore
/// use rs_departures::traits::WidgetSurface;
///
/// struct Printer;
///
/// impl WidgetSurface for Printer {
///     async fn set_image(&self, widget: &str, image: &RenderedImage) -> Result<(), SurfaceError> {
///         println!("{widget}: {} bytes", image.bytes.len());
///         Ok(())
///     }
///     async fn set_title(&self, _widget: &str, _title: &str) -> Result<(), SurfaceError> {
///         Ok(())
///     }
/// }
/// ```
pub trait WidgetSurface: Send + Sync {
    /// Replace the widget's image.
    fn set_image(
        &self,
        widget: &str,
        image: &RenderedImage,
    ) -> impl Future<Output = Result<(), SurfaceError>> + Send;

    /// Replace the widget's title text.
    fn set_title(
        &self,
        widget: &str,
        title: &str,
    ) -> impl Future<Output = Result<(), SurfaceError>> + Send;
}

/// Pure renderer from display state to image bytes.
///
/// Identical inputs must produce byte-identical output. Implementations
/// must not touch the network or the clock.
pub trait ImageRenderer {
    /// Render one frame.
    fn render(&self, state: &RenderState, colors: &ColorConfig) -> RenderedImage;
}
