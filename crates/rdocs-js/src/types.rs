//! Types exposed to JavaScript via wasm-bindgen.

use rdocs_browser::{ScanReport, TermEntry, TooltipConfig, TooltipState};
use serde::{Deserialize, Serialize};
use tsify_next::Tsify;
use wasm_bindgen::prelude::*;

/// Options for `new CodeTooltips(options)`. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct JsTooltipOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_delay_ms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_scan_delay_ms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rescan_debounce_ms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip_height: Option<f64>,
}

impl JsTooltipOptions {
    /// Overlay the given options on the defaults.
    pub fn into_config(self) -> TooltipConfig {
        let mut config = TooltipConfig::default();
        if let Some(base_path) = self.base_path {
            config.base_path = base_path;
        }
        if let Some(ms) = self.hide_delay_ms {
            config.hide_delay_ms = ms;
        }
        if let Some(ms) = self.initial_scan_delay_ms {
            config.initial_scan_delay_ms = ms;
        }
        if let Some(ms) = self.rescan_debounce_ms {
            config.rescan_debounce_ms = ms;
        }
        if let Some(selector) = self.code_selector {
            config.code_selector = selector;
        }
        if let Some(color) = self.highlight_color {
            config.highlight_color = color;
        }
        if let Some(width) = self.tooltip_width {
            config.geometry.width = width;
        }
        if let Some(height) = self.tooltip_height {
            config.geometry.height = height;
        }
        config
    }
}

/// Counts from one scan.
#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct JsScanReport {
    pub regions_scanned: u32,
    pub regions_skipped: u32,
    pub markers: u32,
    pub errors: u32,
}

impl From<ScanReport> for JsScanReport {
    fn from(report: ScanReport) -> Self {
        Self {
            regions_scanned: report.regions_scanned as u32,
            regions_skipped: report.regions_skipped as u32,
            markers: report.markers() as u32,
            errors: report.errors as u32,
        }
    }
}

/// Snapshot of the tooltip.
#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct JsTooltipState {
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub x: f64,
    pub y: f64,
}

impl From<&TooltipState> for JsTooltipState {
    fn from(state: &TooltipState) -> Self {
        Self {
            visible: state.visible,
            token: state.active_token.as_ref().map(|t| t.to_string()),
            x: state.x,
            y: state.y,
        }
    }
}

/// A dictionary entry, with its link already resolved against the base path.
#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct JsTermEntry {
    pub token: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub category: String,
}

impl JsTermEntry {
    pub fn new(entry: &TermEntry, config: &TooltipConfig) -> Self {
        Self {
            token: entry.token.to_string(),
            name: entry.name.clone(),
            description: entry.description.clone(),
            url: entry.destination().map(|d| config.link_for(d)),
            icon: entry.icon.clone(),
            category: entry.category.as_str().to_owned(),
        }
    }
}
