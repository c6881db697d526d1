//! In-memory surface holding the latest frame per widget.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::SurfaceError;
use crate::render::RenderedImage;
use crate::traits::WidgetSurface;

#[derive(Clone, Debug, Default)]
struct Frame {
    image: Option<RenderedImage>,
    title: String,
    pushes: u64,
}

/// Keeps only the most recent image and title of each widget.
///
/// This is what the desktop web host serves from. Clones share state.
///
/// # Example
///
/// ```rust
/// use rs_departures::hal::MemorySurface;
///
/// let surface = MemorySurface::new();
/// assert!(surface.latest_image("key-1").is_none());
/// assert_eq!(surface.push_count("key-1"), 0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemorySurface {
    frames: Arc<Mutex<HashMap<String, Frame>>>,
}

impl MemorySurface {
    /// Creates an empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest image pushed for `widget`.
    pub fn latest_image(&self, widget: &str) -> Option<RenderedImage> {
        self.lock().get(widget).and_then(|f| f.image.clone())
    }

    /// Latest title pushed for `widget`.
    pub fn title(&self, widget: &str) -> Option<String> {
        self.lock().get(widget).map(|f| f.title.clone())
    }

    /// How many images `widget` has received.
    pub fn push_count(&self, widget: &str) -> u64 {
        self.lock().get(widget).map_or(0, |f| f.pushes)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Frame>> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WidgetSurface for MemorySurface {
    async fn set_image(&self, widget: &str, image: &RenderedImage) -> Result<(), SurfaceError> {
        let mut frames = self.lock();
        let frame = frames.entry(widget.to_string()).or_default();
        frame.image = Some(image.clone());
        frame.pushes += 1;
        Ok(())
    }

    async fn set_title(&self, widget: &str, title: &str) -> Result<(), SurfaceError> {
        self.lock().entry(widget.to_string()).or_default().title = title.to_string();
        Ok(())
    }
}
