//! rdocs-core: Pure Rust logic for code-sample tooltips, without DOM dependencies.
//!
//! This crate provides:
//! - `TermDictionary` - the read-only token → entry data feed
//! - `TokenMatcher` - whole-word matcher compiled once from the dictionary
//! - `Annotator` - marks tokens in code regions, generic over `CodeDocument`
//! - `TooltipController` - the single owner of tooltip state
//! - `place_tooltip` - viewport-aware placement

pub mod annotate;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod geometry;
pub mod matcher;
pub mod tooltip;

pub use annotate::{Annotator, CodeDocument, ScanReport, Segment, is_excluded_context, plan_segments};
pub use config::TooltipConfig;
pub use dictionary::{Category, TermDictionary, TermEntry};
pub use error::{ConfigError, CoreError, DictionaryError, HostError, MatcherError};
pub use geometry::{Point, Rect, Size, TooltipGeometry, place_tooltip};
pub use matcher::{TokenMatch, TokenMatcher};
pub use smol_str::SmolStr;
pub use tooltip::{
    Effect, HideTicket, InputMode, Outcome, SubscriptionId, TooltipController, TooltipState,
};
