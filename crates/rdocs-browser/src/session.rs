//! Page-level wiring: listeners, observer, timers.
//!
//! A `TooltipSession` owns everything it installs. Dropping it (or calling
//! [`TooltipSession::unmount`]) disconnects the observer, removes every
//! listener, cancels pending timers and removes the tooltip element.
//!
//! Callbacks hold `Weak` references to the shared state so the session is
//! the only strong owner.
//!
//! State listeners run while the controller is borrowed. They may unmount the
//! session or unsubscribe; an unsubscribe issued from inside a listener is
//! applied once the controller is released.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::Arc;

use gloo_events::{EventListener, EventListenerOptions};
use gloo_timers::callback::Timeout;
use rdocs_core::{
    Annotator, Effect, InputMode, Outcome, ScanReport, SubscriptionId, TermDictionary, TokenMatcher,
    TooltipConfig, TooltipController, TooltipState,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, Event, HtmlElement, MouseEvent, MutationObserver, MutationObserverInit};

use crate::dom::{BrowserDom, anchor_rect, find_marker, viewport_size};
use crate::platform::platform;
use crate::view::TooltipView;

type ObserverCallback = Closure<dyn FnMut(js_sys::Array, MutationObserver)>;

struct Shared {
    config: TooltipConfig,
    input: InputMode,
    annotator: Annotator,
    dom: RefCell<BrowserDom>,
    controller: RefCell<TooltipController>,
    /// Last published state, readable while the controller is borrowed.
    snapshot: Rc<RefCell<TooltipState>>,
    view: Rc<TooltipView>,
    hide_timer: RefCell<Option<Timeout>>,
    scan_timer: RefCell<Option<Timeout>>,
    highlighted: RefCell<Option<Element>>,
    scan_pending: Cell<bool>,
    /// Set by teardown; handlers stop touching the page once it is set.
    closed: Cell<bool>,
    deferred_unsubscribes: RefCell<Vec<SubscriptionId>>,
}

impl Shared {
    fn scan_now(&self) -> ScanReport {
        let mut dom = self.dom.borrow_mut();
        let Some(body) = dom.document().body() else {
            return ScanReport::default();
        };
        let root: Element = body.into();
        self.annotator.scan(&mut *dom, &root)
    }

    /// Run a scan after `delay_ms`, replacing any scan already pending.
    fn schedule_scan(self: &Rc<Self>, delay_ms: u32) {
        let weak = Rc::downgrade(self);
        let timeout = Timeout::new(delay_ms, move || {
            if let Some(shared) = weak.upgrade() {
                shared.scan_pending.set(false);
                shared.scan_now();
            }
        });
        self.scan_pending.set(true);
        *self.scan_timer.borrow_mut() = Some(timeout);
    }

    /// Run `f` on the controller unless it is already busy or the session is
    /// closed. Deferred unsubscribes are applied afterwards.
    fn with_controller<R>(&self, f: impl FnOnce(&mut TooltipController) -> R) -> Option<R> {
        if self.closed.get() {
            return None;
        }
        let result = {
            let Ok(mut controller) = self.controller.try_borrow_mut() else {
                tracing::warn!("tooltip controller re-entered, event dropped");
                return None;
            };
            f(&mut controller)
        };
        self.flush_unsubscribes();
        if self.closed.get() {
            return None;
        }
        Some(result)
    }

    fn flush_unsubscribes(&self) {
        let ids = std::mem::take(&mut *self.deferred_unsubscribes.borrow_mut());
        if ids.is_empty() {
            return;
        }
        if let Ok(mut controller) = self.controller.try_borrow_mut() {
            for id in ids {
                controller.unsubscribe(id);
            }
        }
    }

    fn apply(self: &Rc<Self>, outcome: Outcome) {
        for effect in outcome.effects {
            match effect {
                Effect::ScheduleHide { ticket, delay_ms } => {
                    let weak = Rc::downgrade(self);
                    let timeout = Timeout::new(delay_ms, move || {
                        if let Some(shared) = weak.upgrade() {
                            if shared.with_controller(|c| c.hide_elapsed(ticket)).is_none() {
                                return;
                            }
                            if !shared.snapshot.borrow().visible {
                                shared.clear_highlight();
                            }
                        }
                    });
                    *self.hide_timer.borrow_mut() = Some(timeout);
                }
                Effect::CancelHide => {
                    self.hide_timer.borrow_mut().take();
                }
                Effect::Navigate { url } => {
                    let Some(window) = web_sys::window() else {
                        continue;
                    };
                    if let Err(e) = window.location().set_href(&url) {
                        tracing::error!("navigation to {} failed: {:?}", url, e);
                    }
                }
            }
        }
    }

    fn highlight(&self, marker: &Element) {
        self.clear_highlight();
        if let Some(html) = marker.dyn_ref::<HtmlElement>() {
            let _ = html
                .style()
                .set_property("background-color", &self.config.highlight_color);
        }
        *self.highlighted.borrow_mut() = Some(marker.clone());
    }

    fn clear_highlight(&self) {
        let Some(marker) = self.highlighted.borrow_mut().take() else {
            return;
        };
        if let Some(html) = marker.dyn_ref::<HtmlElement>() {
            let _ = html.style().remove_property("background-color");
        }
    }

    fn is_showing(&self, token: &str) -> bool {
        let state = self.snapshot.borrow();
        state.visible && state.active_token.as_deref() == Some(token)
    }

    /// True when at least one record concerns something besides the tooltip.
    fn mutations_outside_tooltip(&self, records: &js_sys::Array) -> bool {
        records.iter().any(|record| {
            record
                .dyn_into::<web_sys::MutationRecord>()
                .map(|record| !self.view.contains(record.target().as_ref()))
                .unwrap_or(true)
        })
    }

    // === Event handlers ===

    fn on_mouseover(self: &Rc<Self>, event: &Event) {
        let Some((marker, token)) = find_marker(event.target(), &self.config.marker_attribute)
        else {
            return;
        };
        let anchor = anchor_rect(&marker);
        let Some(outcome) =
            self.with_controller(|c| c.pointer_enter_marker(&token, anchor, viewport_size()))
        else {
            return;
        };
        if self.is_showing(&token) {
            self.highlight(&marker);
        }
        self.apply(outcome);
    }

    fn on_mouseout(self: &Rc<Self>, event: &Event) {
        if find_marker(event.target(), &self.config.marker_attribute).is_none() {
            return;
        }
        let related = event
            .dyn_ref::<MouseEvent>()
            .and_then(|e| e.related_target())
            .and_then(|t| t.dyn_into::<web_sys::Node>().ok());
        let toward_tooltip = self.view.contains(related.as_ref());
        if !toward_tooltip {
            self.clear_highlight();
        }
        let Some(outcome) = self.with_controller(|c| c.pointer_leave_marker(toward_tooltip)) else {
            return;
        };
        self.apply(outcome);
    }

    fn on_click(self: &Rc<Self>, event: &Event) {
        let Some((marker, token)) = find_marker(event.target(), &self.config.marker_attribute)
        else {
            self.on_click_elsewhere(event);
            return;
        };
        let anchor = anchor_rect(&marker);
        let Some(outcome) = self.with_controller(|c| c.activate(&token, anchor, viewport_size()))
        else {
            return;
        };
        if outcome.consumed {
            event.prevent_default();
            event.stop_propagation();
        }
        if self.is_showing(&token) {
            self.highlight(&marker);
        }
        self.apply(outcome);
    }

    /// Touch devices have no pointer-leave; a tap outside closes the tooltip.
    fn on_click_elsewhere(self: &Rc<Self>, event: &Event) {
        if self.input == InputMode::Touch {
            let target = event
                .target()
                .and_then(|t| t.dyn_into::<web_sys::Node>().ok());
            if self.view.contains(target.as_ref()) || !self.snapshot.borrow().visible {
                return;
            }
            self.clear_highlight();
            if let Some(outcome) = self.with_controller(|c| c.dismiss()) {
                self.apply(outcome);
            }
        }
    }

    fn on_tooltip_enter(self: &Rc<Self>) {
        if let Some(outcome) = self.with_controller(|c| c.pointer_enter_tooltip()) {
            self.apply(outcome);
        }
    }

    fn on_tooltip_leave(self: &Rc<Self>) {
        self.clear_highlight();
        if let Some(outcome) = self.with_controller(|c| c.pointer_leave_tooltip()) {
            self.apply(outcome);
        }
    }
}

/// Tooltips mounted on the current page.
pub struct TooltipSession {
    shared: Rc<Shared>,
    listeners: Vec<EventListener>,
    observer: Option<MutationObserver>,
    _observer_callback: Option<ObserverCallback>,
}

impl TooltipSession {
    /// Install tooltips on the current document.
    ///
    /// The first scan runs after `initial_scan_delay_ms`; later DOM changes
    /// trigger a rescan once they have been quiet for `rescan_debounce_ms`.
    pub fn mount(config: TooltipConfig, dictionary: Arc<TermDictionary>) -> Result<Self, JsValue> {
        Self::mount_with_input(config, dictionary, platform().input_mode())
    }

    /// Like [`TooltipSession::mount`] with an explicit input mode instead of
    /// the detected one.
    pub fn mount_with_input(
        config: TooltipConfig,
        dictionary: Arc<TermDictionary>,
        input: InputMode,
    ) -> Result<Self, JsValue> {
        config
            .validate()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        let body = document.body().ok_or("document has no body")?;

        let matcher = TokenMatcher::new(dictionary.all_tokens())
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let view = Rc::new(TooltipView::create(&document, &config)?);

        let mut controller =
            TooltipController::new(dictionary.clone(), &config, input);
        let snapshot = Rc::new(RefCell::new(TooltipState::default()));
        {
            let snapshot = snapshot.clone();
            let view = view.clone();
            let dictionary = dictionary.clone();
            controller.subscribe(move |state| {
                *snapshot.borrow_mut() = state.clone();
                let entry = state
                    .active_token
                    .as_deref()
                    .and_then(|token| dictionary.lookup(token));
                view.render(state, entry);
            });
        }

        let shared = Rc::new(Shared {
            annotator: Annotator::new(Arc::new(matcher)),
            dom: RefCell::new(BrowserDom::new(document.clone(), &config)),
            controller: RefCell::new(controller),
            snapshot,
            view,
            hide_timer: RefCell::new(None),
            scan_timer: RefCell::new(None),
            highlighted: RefCell::new(None),
            scan_pending: Cell::new(false),
            closed: Cell::new(false),
            deferred_unsubscribes: RefCell::new(Vec::new()),
            input,
            config,
        });

        let listeners = install_listeners(&shared, &document);

        let weak = Rc::downgrade(&shared);
        let callback: ObserverCallback = Closure::new(
            move |records: js_sys::Array, _observer: MutationObserver| {
                let Some(shared) = weak.upgrade() else {
                    return;
                };
                if shared.mutations_outside_tooltip(&records) {
                    shared.schedule_scan(shared.config.rescan_debounce_ms);
                }
            },
        );
        let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;
        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        observer.observe_with_options(&body, &init)?;

        shared.schedule_scan(shared.config.initial_scan_delay_ms);

        tracing::debug!(
            tokens = shared.annotator.matcher().len(),
            ?input,
            "code tooltips mounted"
        );

        Ok(Self {
            shared,
            listeners,
            observer: Some(observer),
            _observer_callback: Some(callback),
        })
    }

    /// Scan the document now, outside the debounce.
    pub fn rescan(&self) -> ScanReport {
        let report = self.shared.scan_now();
        tracing::debug!(
            regions = report.regions_scanned,
            markers = report.markers(),
            "rescan"
        );
        report
    }

    pub fn state(&self) -> TooltipState {
        self.shared.snapshot.borrow().clone()
    }

    /// Whether a debounced or initial scan is waiting to run.
    pub fn has_pending_scan(&self) -> bool {
        self.shared.scan_pending.get()
    }

    pub fn token_count(&self) -> usize {
        self.shared.annotator.matcher().len()
    }

    /// Forward state changes to `listener`.
    ///
    /// Returns `None` when called from inside a state listener of this
    /// session. Listeners may read [`TooltipSession::state`], unsubscribe
    /// or unmount; events they trigger on this session are dropped.
    pub fn subscribe(
        &self,
        listener: impl FnMut(&TooltipState) + 'static,
    ) -> Option<SubscriptionId> {
        let mut controller = self.shared.controller.try_borrow_mut().ok()?;
        Some(controller.subscribe(listener))
    }

    /// Stop forwarding to a listener. From inside a state listener the
    /// removal is deferred until the current change has been delivered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        match self.shared.controller.try_borrow_mut() {
            Ok(mut controller) => controller.unsubscribe(id),
            Err(_) => {
                self.shared.deferred_unsubscribes.borrow_mut().push(id);
                true
            }
        }
    }

    pub fn tooltip_element(&self) -> &HtmlElement {
        self.shared.view.element()
    }

    /// Tear everything down.
    pub fn unmount(self) {}

    fn teardown(&mut self) {
        self.shared.closed.set(true);
        if let Some(observer) = self.observer.take() {
            observer.disconnect();
        }
        self._observer_callback.take();
        self.listeners.clear();
        self.shared.scan_timer.borrow_mut().take();
        self.shared.scan_pending.set(false);
        self.shared.hide_timer.borrow_mut().take();
        self.shared.clear_highlight();
        if let Ok(mut controller) = self.shared.controller.try_borrow_mut() {
            controller.reset();
        }
        self.shared.view.remove();
        tracing::debug!("code tooltips unmounted");
    }
}

impl Drop for TooltipSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn install_listeners(shared: &Rc<Shared>, document: &web_sys::Document) -> Vec<EventListener> {
    fn handler(
        weak: &Weak<Shared>,
        f: fn(&Rc<Shared>, &Event),
    ) -> impl FnMut(&Event) + 'static {
        let weak = weak.clone();
        move |event: &Event| {
            if let Some(shared) = weak.upgrade() {
                f(&shared, event);
            }
        }
    }

    let weak = Rc::downgrade(shared);
    let tooltip = shared.view.element();

    vec![
        EventListener::new(document, "mouseover", handler(&weak, Shared::on_mouseover)),
        EventListener::new(document, "mouseout", handler(&weak, Shared::on_mouseout)),
        EventListener::new_with_options(
            document,
            "click",
            EventListenerOptions::enable_prevent_default(),
            handler(&weak, Shared::on_click),
        ),
        EventListener::new(
            tooltip,
            "mouseenter",
            handler(&weak, |shared, _| shared.on_tooltip_enter()),
        ),
        EventListener::new(
            tooltip,
            "mouseleave",
            handler(&weak, |shared, _| shared.on_tooltip_leave()),
        ),
    ]
}
