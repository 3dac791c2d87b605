//! Tooltip configuration.
//!
//! All fields have defaults matching the documentation site, so a host can
//! pass a partial JSON object (or nothing at all).

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geometry::TooltipGeometry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TooltipConfig {
    /// Prefix prepended to every destination link.
    pub base_path: String,
    /// Delay between pointer leaving and the tooltip hiding.
    pub hide_delay_ms: u32,
    /// Delay before the first scan after mount.
    pub initial_scan_delay_ms: u32,
    /// Quiet period after the last DOM mutation before rescanning.
    pub rescan_debounce_ms: u32,
    pub geometry: TooltipGeometry,
    /// CSS selector for code regions.
    pub code_selector: String,
    /// Attribute carrying the token on marker elements.
    pub marker_attribute: String,
    /// Attribute set on code regions once scanned.
    pub processed_attribute: String,
    /// Class of the tooltip element.
    pub tooltip_class: String,
    /// Background applied to the hovered marker.
    pub highlight_color: String,
}

impl Default for TooltipConfig {
    fn default() -> Self {
        Self {
            base_path: "/RDocs".to_owned(),
            hide_delay_ms: 150,
            initial_scan_delay_ms: 500,
            rescan_debounce_ms: 200,
            geometry: TooltipGeometry::default(),
            code_selector: "pre.shiki, pre.vp-code, div.language-rust pre, div.language-rs pre"
                .to_owned(),
            marker_attribute: "data-rust-type".to_owned(),
            processed_attribute: "data-tooltips-processed".to_owned(),
            tooltip_class: "rust-type-tooltip".to_owned(),
            highlight_color: "var(--vp-c-brand-soft)".to_owned(),
        }
    }
}

impl TooltipConfig {
    /// Parse and validate a config from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let geometry = &self.geometry;
        if !(geometry.width.is_finite() && geometry.width > 0.0) {
            return Err(invalid("geometry.width", "must be positive"));
        }
        if !(geometry.height.is_finite() && geometry.height > 0.0) {
            return Err(invalid("geometry.height", "must be positive"));
        }
        if !(geometry.gap.is_finite() && geometry.gap >= 0.0) {
            return Err(invalid("geometry.gap", "must not be negative"));
        }
        if !(geometry.margin.is_finite() && geometry.margin >= 0.0) {
            return Err(invalid("geometry.margin", "must not be negative"));
        }
        if self.code_selector.trim().is_empty() {
            return Err(invalid("codeSelector", "must not be empty"));
        }
        if self.marker_attribute.trim().is_empty() {
            return Err(invalid("markerAttribute", "must not be empty"));
        }
        if self.processed_attribute.trim().is_empty() {
            return Err(invalid("processedAttribute", "must not be empty"));
        }
        if self.tooltip_class.trim().is_empty() {
            return Err(invalid("tooltipClass", "must not be empty"));
        }
        Ok(())
    }

    /// Join the base path and a site-relative destination.
    pub fn link_for(&self, destination: &str) -> String {
        let base = self.base_path.trim_end_matches('/');
        if destination.starts_with('/') {
            format!("{base}{destination}")
        } else {
            format!("{base}/{destination}")
        }
    }

    /// Selector matching the tooltip element.
    pub fn tooltip_selector(&self) -> String {
        format!(".{}", self.tooltip_class)
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_owned(),
    }
}
