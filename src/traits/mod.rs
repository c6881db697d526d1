//! Trait definitions for the collaborators around the departure pipeline.
//!
//! This module defines the seams that let rs-departures:
//! - Run against the real upstream API or a scripted mock
//! - Push images to any host (device SDK, web page, test buffer)
//! - Swap renderers (SVG text or embedded-graphics raster)
//!
//! # Submodules
//!
//! - `clock`: Monotonic time source
//! - `network`: HTTP GET transport
//! - `display`: Widget surface and image renderer
//!
//! | Trait | Purpose | Implementations |
//! |-------|---------|-----------------|
//! | [`Clock`] | Cache TTL and progress timing | `MonotonicClock`, `MockClock` |
//! | [`Transport`] | Upstream GET | `ReqwestTransport`, `MockTransport` |
//! | [`WidgetSurface`] | Image/title sink | `MemorySurface`, `MockSurface` |
//! | [`ImageRenderer`] | State → image | `SvgRenderer`, `FramebufferRenderer` |

pub mod clock;
pub mod display;
pub mod network;

pub use clock::*;
pub use display::*;
pub use network::*;
