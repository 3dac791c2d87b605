//! Input device detection.

use std::sync::OnceLock;

use rdocs_core::InputMode;

/// Cached platform detection results.
#[derive(Debug, Clone, Default)]
pub struct Platform {
    /// Touch-capable device: hover semantics are disabled.
    pub touch: bool,
}

impl Platform {
    pub fn input_mode(&self) -> InputMode {
        if self.touch {
            InputMode::Touch
        } else {
            InputMode::Pointer
        }
    }
}

static PLATFORM: OnceLock<Platform> = OnceLock::new();

/// Get cached platform info. Detection runs once on first call.
pub fn platform() -> &'static Platform {
    PLATFORM.get_or_init(detect_platform)
}

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
fn detect_platform() -> Platform {
    let Some(window) = web_sys::window() else {
        return Platform::default();
    };

    // Same test the site used: `'ontouchstart' in window || maxTouchPoints > 0`.
    let has_touch_event =
        js_sys::Reflect::has(&window, &wasm_bindgen::JsValue::from_str("ontouchstart"))
            .unwrap_or(false);
    let touch = has_touch_event || window.navigator().max_touch_points() > 0;

    tracing::debug!(touch, "detected input platform");
    Platform { touch }
}

#[cfg(not(all(target_arch = "wasm32", target_os = "unknown")))]
fn detect_platform() -> Platform {
    Platform::default()
}
