//! Browser DOM layer for rdocs code tooltips.
//!
//! This crate implements the `rdocs-core` host seams on top of `web-sys`. It
//! assumes a `wasm32-unknown-unknown` target environment.
//!
//! # Architecture
//!
//! - `dom`: `CodeDocument` over real elements and text nodes
//! - `view`: the single tooltip element
//! - `session`: listeners, mutation observer and timers for one page
//! - `platform`: touch detection
//!
//! # Re-exports
//!
//! This crate re-exports `rdocs-core` for convenience, so consumers only
//! need to depend on `rdocs-browser`.

// Re-export core crate
pub use rdocs_core;
pub use rdocs_core::*;

pub mod dom;
pub mod platform;
pub mod session;
pub mod view;

pub use dom::{BrowserDom, anchor_rect, find_marker, viewport_size};
pub use platform::{Platform, platform};
pub use session::TooltipSession;
pub use view::TooltipView;
