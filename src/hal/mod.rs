//! Concrete implementations of the traits in [`crate::traits`].
//!
//! # Available Implementations
//!
//! - `mock`: Test doubles for the clock, transport and surface
//! - `clock`: [`MonotonicClock`] on tokio's clock
//! - `memory`: [`MemorySurface`], latest frame per widget
//! - `http`: [`ReqwestTransport`] for the real API (requires `http` feature)

pub mod clock;
pub mod memory;
pub mod mock;

#[cfg(feature = "http")]
pub mod http;

pub use clock::*;
pub use memory::*;
pub use mock::*;

#[cfg(feature = "http")]
pub use http::*;
