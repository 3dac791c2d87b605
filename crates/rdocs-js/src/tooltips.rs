//! CodeTooltips - the page-level handle exposed to JavaScript.

use std::sync::Arc;

use wasm_bindgen::prelude::*;

use rdocs_browser::{CoreError, SubscriptionId, TermDictionary, TooltipConfig, TooltipSession};

use crate::types::{JsScanReport, JsTermEntry, JsTooltipOptions, JsTooltipState};

/// Tooltips for Rust terms in the page's code samples.
///
/// Create one per page, `mount()` it from the theme's `enhanceApp` hook and
/// `unmount()` it when the page goes away.
#[wasm_bindgen]
pub struct CodeTooltips {
    config: TooltipConfig,
    dictionary: Arc<TermDictionary>,
    session: Option<TooltipSession>,
    on_change: Option<SubscriptionId>,
}

#[wasm_bindgen]
impl CodeTooltips {
    /// Create tooltips backed by the built-in dictionary.
    #[wasm_bindgen(constructor)]
    pub fn new(options: Option<JsTooltipOptions>) -> Result<CodeTooltips, JsError> {
        let (config, dictionary) = prepare(options.unwrap_or_default())
            .map_err(|e| JsError::new(&format!("Failed to create tooltips: {}", e)))?;

        Ok(Self {
            config,
            dictionary: Arc::new(dictionary),
            session: None,
            on_change: None,
        })
    }

    /// Install listeners and schedule the first scan.
    ///
    /// `onChange` is called with a `JsTooltipState` after every state change.
    /// Mounting twice replaces the previous session.
    #[wasm_bindgen]
    pub fn mount(&mut self, on_change: Option<js_sys::Function>) -> Result<(), JsError> {
        self.unmount();

        let session = TooltipSession::mount(self.config.clone(), self.dictionary.clone())
            .map_err(|e| JsError::new(&format!("Failed to mount: {:?}", e)))?;

        if let Some(callback) = on_change {
            self.on_change = session.subscribe(move |state| {
                let Ok(value) = serde_wasm_bindgen::to_value(&JsTooltipState::from(state)) else {
                    return;
                };
                let this = JsValue::null();
                let _ = callback.call1(&this, &value);
            });
        }

        self.session = Some(session);
        Ok(())
    }

    #[wasm_bindgen(js_name = isMounted)]
    pub fn is_mounted(&self) -> bool {
        self.session.is_some()
    }

    /// Remove listeners, cancel timers and remove the tooltip element.
    ///
    /// Markers already added to code samples stay in place. Safe to call from
    /// an `onChange` callback.
    #[wasm_bindgen]
    pub fn unmount(&mut self) {
        if let Some(session) = self.session.take() {
            if let Some(id) = self.on_change.take() {
                session.unsubscribe(id);
            }
            session.unmount();
        }
    }

    /// Scan for new code regions now instead of waiting for the observer.
    #[wasm_bindgen]
    pub fn rescan(&self) -> Result<JsScanReport, JsError> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| JsError::new("Not mounted"))?;
        Ok(session.rescan().into())
    }

    /// Current tooltip state. Hidden when not mounted.
    #[wasm_bindgen]
    pub fn state(&self) -> JsTooltipState {
        let state = self
            .session
            .as_ref()
            .map(|session| session.state())
            .unwrap_or_default();
        JsTooltipState::from(&state)
    }

    /// Dictionary entry for `token`, if known.
    #[wasm_bindgen]
    pub fn lookup(&self, token: &str) -> Option<JsTermEntry> {
        self.dictionary
            .lookup(token)
            .map(|entry| JsTermEntry::new(entry, &self.config))
    }

    /// Number of tokens in the dictionary.
    #[wasm_bindgen(js_name = tokenCount)]
    pub fn token_count(&self) -> usize {
        self.dictionary.len()
    }
}

fn prepare(options: JsTooltipOptions) -> Result<(TooltipConfig, TermDictionary), CoreError> {
    let config = options.into_config();
    config.validate()?;
    let dictionary = TermDictionary::builtin()?;
    Ok((config, dictionary))
}
