//! Tooltip state machine.
//!
//! [`TooltipController`] is the single writer of [`TooltipState`]. Hosts feed
//! it pointer and activation events and carry out the returned [`Effect`]s:
//! starting or cancelling the hide timer, and navigating away.
//!
//! Timers live on the host side. A scheduled hide carries a [`HideTicket`];
//! the host reports expiry through [`TooltipController::hide_elapsed`], and
//! only the ticket that is still pending may hide the tooltip. Anything that
//! cancels the hide invalidates the ticket, so a timer that fires late (or is
//! never cancelled by the host) is harmless.

use std::sync::Arc;

use serde::Serialize;
use smol_str::SmolStr;

use crate::config::TooltipConfig;
use crate::dictionary::{TermDictionary, TermEntry};
use crate::geometry::{Rect, Size, place_tooltip};

/// How the user interacts with the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Mouse or pen: hover shows, click navigates.
    #[default]
    Pointer,
    /// Touch: hover is ignored, tap shows, second tap navigates.
    Touch,
}

/// The page-wide tooltip state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipState {
    pub visible: bool,
    /// Token whose entry is shown. `None` whenever hidden.
    pub active_token: Option<SmolStr>,
    /// Viewport-relative top-left corner of the tooltip.
    pub x: f64,
    pub y: f64,
}

/// Identifies one scheduled hide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HideTicket(u64);

/// Work the host must perform after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Start a timer and call `hide_elapsed(ticket)` when it fires.
    ScheduleHide { ticket: HideTicket, delay_ms: u32 },
    /// Drop the pending hide timer.
    CancelHide,
    /// Send the page to `url`.
    Navigate { url: String },
}

/// Result of feeding one event to the controller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    pub effects: Vec<Effect>,
    /// The host should `preventDefault` and `stopPropagation`.
    pub consumed: bool,
}

impl Outcome {
    fn with(effects: Vec<Effect>) -> Self {
        Self {
            effects,
            consumed: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty() && !self.consumed
    }

    /// The navigation target, if this outcome navigates.
    pub fn navigation(&self) -> Option<&str> {
        self.effects.iter().find_map(|e| match e {
            Effect::Navigate { url } => Some(url.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&TooltipState)>;

pub struct TooltipController {
    dictionary: Arc<TermDictionary>,
    config: TooltipConfig,
    input: InputMode,
    state: TooltipState,
    pending_hide: Option<HideTicket>,
    next_ticket: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl std::fmt::Debug for TooltipController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TooltipController")
            .field("input", &self.input)
            .field("state", &self.state)
            .field("pending_hide", &self.pending_hide)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl TooltipController {
    pub fn new(dictionary: Arc<TermDictionary>, config: &TooltipConfig, input: InputMode) -> Self {
        Self {
            dictionary,
            config: config.clone(),
            input,
            state: TooltipState::default(),
            pending_hide: None,
            next_ticket: 0,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn state(&self) -> &TooltipState {
        &self.state
    }

    pub fn input_mode(&self) -> InputMode {
        self.input
    }

    /// Entry for the active token, if visible.
    pub fn entry(&self) -> Option<&TermEntry> {
        self.state
            .active_token
            .as_deref()
            .and_then(|token| self.dictionary.lookup(token))
    }

    pub fn has_pending_hide(&self) -> bool {
        self.pending_hide.is_some()
    }

    /// Register a listener called after every state change.
    pub fn subscribe(&mut self, listener: impl FnMut(&TooltipState) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    // === Events ===

    /// Pointer moved onto a marker. `anchor` is `None` if the element is gone.
    pub fn pointer_enter_marker(&mut self, token: &str, anchor: Option<Rect>, viewport: Size) -> Outcome {
        if self.input == InputMode::Touch {
            return Outcome::default();
        }
        self.show(token, anchor, viewport)
    }

    /// Pointer left a marker. `toward_tooltip` is true when it moved onto the tooltip.
    pub fn pointer_leave_marker(&mut self, toward_tooltip: bool) -> Outcome {
        if self.input == InputMode::Touch || toward_tooltip {
            return Outcome::default();
        }
        self.schedule_hide()
    }

    /// Pointer moved onto the tooltip itself.
    pub fn pointer_enter_tooltip(&mut self) -> Outcome {
        Outcome::with(self.cancel_hide().into_iter().collect())
    }

    pub fn pointer_leave_tooltip(&mut self) -> Outcome {
        if self.input == InputMode::Touch {
            return Outcome::default();
        }
        self.schedule_hide()
    }

    /// Click or tap on a marker.
    pub fn activate(&mut self, token: &str, anchor: Option<Rect>, viewport: Size) -> Outcome {
        let Some(entry) = self.dictionary.lookup(token) else {
            tracing::trace!(target: "rdocs::tooltip", token, "activation on unknown token");
            return Outcome::default();
        };
        let destination = entry.destination().map(|d| self.config.link_for(d));
        let showing = self.is_showing(token);

        if self.input == InputMode::Touch && !showing {
            let mut outcome = self.show(token, anchor, viewport);
            outcome.consumed = self.is_showing(token);
            return outcome;
        }

        match destination {
            Some(url) => {
                tracing::debug!(target: "rdocs::tooltip", token, %url, "navigating");
                Outcome {
                    effects: vec![Effect::Navigate { url }],
                    consumed: true,
                }
            }
            None if showing => Outcome::default(),
            None => self.show(token, anchor, viewport),
        }
    }

    /// The hide timer for `ticket` fired.
    pub fn hide_elapsed(&mut self, ticket: HideTicket) {
        if self.pending_hide != Some(ticket) {
            tracing::trace!(target: "rdocs::tooltip", ?ticket, "stale hide ignored");
            return;
        }
        self.pending_hide = None;
        self.hide_now();
    }

    /// Hide immediately, e.g. on a tap outside markers and the tooltip.
    pub fn dismiss(&mut self) -> Outcome {
        let effects = self.cancel_hide().into_iter().collect();
        self.hide_now();
        Outcome::with(effects)
    }

    /// Return to the initial hidden state (unmount or navigation).
    pub fn reset(&mut self) -> Outcome {
        let effects = self.cancel_hide().into_iter().collect();
        self.set_state(TooltipState::default());
        Outcome::with(effects)
    }

    // === Internals ===

    fn is_showing(&self, token: &str) -> bool {
        self.state.visible && self.state.active_token.as_deref() == Some(token)
    }

    fn show(&mut self, token: &str, anchor: Option<Rect>, viewport: Size) -> Outcome {
        let Some(entry) = self.dictionary.lookup(token) else {
            return Outcome::default();
        };
        let token = entry.token.clone();
        let Some(anchor) = anchor else {
            tracing::trace!(target: "rdocs::tooltip", %token, "anchor vanished, not showing");
            return Outcome::default();
        };

        let effects = self.cancel_hide().into_iter().collect();
        let position = place_tooltip(anchor, viewport, &self.config.geometry);
        tracing::trace!(target: "rdocs::tooltip", %token, x = position.x, y = position.y, "show");

        self.set_state(TooltipState {
            visible: true,
            active_token: Some(token),
            x: position.x,
            y: position.y,
        });
        Outcome::with(effects)
    }

    fn schedule_hide(&mut self) -> Outcome {
        // An already pending hide keeps its original deadline.
        if !self.state.visible || self.pending_hide.is_some() {
            return Outcome::default();
        }
        let ticket = HideTicket(self.next_ticket);
        self.next_ticket += 1;
        self.pending_hide = Some(ticket);
        Outcome::with(vec![Effect::ScheduleHide {
            ticket,
            delay_ms: self.config.hide_delay_ms,
        }])
    }

    fn cancel_hide(&mut self) -> Option<Effect> {
        self.pending_hide.take().map(|_| Effect::CancelHide)
    }

    fn hide_now(&mut self) {
        let hidden = TooltipState {
            visible: false,
            active_token: None,
            ..self.state.clone()
        };
        self.set_state(hidden);
    }

    fn set_state(&mut self, next: TooltipState) {
        if next == self.state {
            return;
        }
        self.state = next;
        let state = &self.state;
        for (_, listener) in &mut self.listeners {
            listener(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    const VIEWPORT: Size = Size {
        width: 1024.0,
        height: 768.0,
    };

    fn dictionary() -> Arc<TermDictionary> {
        let json = r#"[
            {"token": "Vec", "name": "Vec", "description": "growable array", "link": "/std/vec", "category": "basics"},
            {"token": "Rc", "name": "Rc", "description": "shared ownership", "link": "/std/rc", "category": "smart-ptr"},
            {"token": "Marker", "name": "Marker", "description": "no page yet", "category": "traits"}
        ]"#;
        Arc::new(TermDictionary::from_json(json).unwrap())
    }

    fn controller(input: InputMode) -> TooltipController {
        TooltipController::new(dictionary(), &TooltipConfig::default(), input)
    }

    fn anchor() -> Option<Rect> {
        Some(Rect::new(500.0, 400.0, 40.0, 20.0))
    }

    fn scheduled_ticket(outcome: &Outcome) -> HideTicket {
        match outcome.effects.as_slice() {
            [Effect::ScheduleHide { ticket, delay_ms }] => {
                assert_eq!(*delay_ms, 150);
                *ticket
            }
            other => panic!("expected a single ScheduleHide, got {other:?}"),
        }
    }

    #[test]
    fn test_hover_shows_positioned_tooltip() {
        let mut c = controller(InputMode::Pointer);
        let outcome = c.pointer_enter_marker("Vec", anchor(), VIEWPORT);

        assert!(outcome.is_empty());
        let state = c.state();
        assert!(state.visible);
        assert_eq!(state.active_token.as_deref(), Some("Vec"));
        assert_eq!(state.x, 520.0 - 140.0);
        assert_eq!(state.y, 400.0 - 108.0);
        assert_eq!(c.entry().unwrap().description, "growable array");
    }

    #[test]
    fn test_leave_hides_only_after_delay() {
        let mut c = controller(InputMode::Pointer);
        c.pointer_enter_marker("Vec", anchor(), VIEWPORT);

        let ticket = scheduled_ticket(&c.pointer_leave_marker(false));
        assert!(c.state().visible, "hide must wait for the timer");

        c.hide_elapsed(ticket);
        assert!(!c.state().visible);
        assert_eq!(c.state().active_token, None);
    }

    #[test]
    fn test_hide_delay_race_with_tooltip_hover() {
        let mut c = controller(InputMode::Pointer);
        c.pointer_enter_marker("Vec", anchor(), VIEWPORT);

        let first = scheduled_ticket(&c.pointer_leave_marker(false));
        let outcome = c.pointer_enter_tooltip();
        assert_eq!(outcome.effects, vec![Effect::CancelHide]);

        // The original timer firing late must not hide the tooltip.
        c.hide_elapsed(first);
        assert!(c.state().visible);

        let second = scheduled_ticket(&c.pointer_leave_tooltip());
        assert_ne!(first, second);
        assert!(c.state().visible);

        c.hide_elapsed(second);
        assert!(!c.state().visible);
    }

    #[test]
    fn test_moving_onto_tooltip_does_not_schedule() {
        let mut c = controller(InputMode::Pointer);
        c.pointer_enter_marker("Vec", anchor(), VIEWPORT);

        assert!(c.pointer_leave_marker(true).is_empty());
        assert!(!c.has_pending_hide());
        assert!(c.state().visible);
    }

    #[test]
    fn test_reentering_marker_cancels_hide() {
        let mut c = controller(InputMode::Pointer);
        c.pointer_enter_marker("Vec", anchor(), VIEWPORT);
        let ticket = scheduled_ticket(&c.pointer_leave_marker(false));

        let outcome = c.pointer_enter_marker("Rc", anchor(), VIEWPORT);
        assert_eq!(outcome.effects, vec![Effect::CancelHide]);

        c.hide_elapsed(ticket);
        assert!(c.state().visible);
        assert_eq!(c.state().active_token.as_deref(), Some("Rc"));
    }

    #[test]
    fn test_pending_hide_is_not_restarted() {
        let mut c = controller(InputMode::Pointer);
        c.pointer_enter_marker("Vec", anchor(), VIEWPORT);
        scheduled_ticket(&c.pointer_leave_marker(false));

        assert!(c.pointer_leave_tooltip().is_empty());
    }

    #[test]
    fn test_leave_while_hidden_is_noop() {
        let mut c = controller(InputMode::Pointer);
        assert!(c.pointer_leave_marker(false).is_empty());
        assert!(c.pointer_leave_tooltip().is_empty());
    }

    #[test]
    fn test_touch_ignores_hover() {
        let mut c = controller(InputMode::Touch);
        let before = c.state().clone();

        assert!(c.pointer_enter_marker("Vec", anchor(), VIEWPORT).is_empty());
        assert_eq!(c.state(), &before);
        assert!(c.pointer_leave_marker(false).is_empty());
        assert_eq!(c.state(), &before);
    }

    #[test]
    fn test_touch_tap_shows_then_navigates() {
        let mut c = controller(InputMode::Touch);

        let first = c.activate("Vec", anchor(), VIEWPORT);
        assert!(first.consumed);
        assert_eq!(first.navigation(), None);
        assert!(c.state().visible);

        let second = c.activate("Vec", anchor(), VIEWPORT);
        assert!(second.consumed);
        assert_eq!(second.navigation(), Some("/RDocs/std/vec"));
    }

    #[test]
    fn test_touch_tap_on_other_token_switches() {
        let mut c = controller(InputMode::Touch);
        c.activate("Vec", anchor(), VIEWPORT);

        let outcome = c.activate("Rc", anchor(), VIEWPORT);
        assert_eq!(outcome.navigation(), None);
        assert_eq!(c.state().active_token.as_deref(), Some("Rc"));
    }

    #[test]
    fn test_touch_tap_on_vanished_marker_is_not_consumed() {
        let mut c = controller(InputMode::Touch);

        let outcome = c.activate("Vec", None, VIEWPORT);
        assert!(!outcome.consumed);
        assert!(outcome.is_empty());
        assert!(!c.state().visible);
    }

    #[test]
    fn test_pointer_click_navigates_with_base_path() {
        let mut c = controller(InputMode::Pointer);
        c.pointer_enter_marker("Rc", anchor(), VIEWPORT);

        let outcome = c.activate("Rc", anchor(), VIEWPORT);
        assert!(outcome.consumed);
        assert_eq!(
            outcome.effects,
            vec![Effect::Navigate {
                url: "/RDocs/std/rc".to_owned()
            }]
        );
    }

    #[test]
    fn test_informational_activation_does_not_navigate() {
        let mut c = controller(InputMode::Pointer);

        let outcome = c.activate("Marker", anchor(), VIEWPORT);
        assert_eq!(outcome.navigation(), None);
        assert!(!outcome.consumed);
        assert!(c.state().visible);
        assert_eq!(c.state().active_token.as_deref(), Some("Marker"));

        let again = c.activate("Marker", anchor(), VIEWPORT);
        assert!(again.is_empty());
        assert!(c.state().visible);
    }

    #[test]
    fn test_informational_touch_never_navigates() {
        let mut c = controller(InputMode::Touch);
        c.activate("Marker", anchor(), VIEWPORT);
        let outcome = c.activate("Marker", anchor(), VIEWPORT);

        assert_eq!(outcome.navigation(), None);
        assert!(c.state().visible);
    }

    #[test]
    fn test_unknown_token_is_noop() {
        let mut c = controller(InputMode::Pointer);
        assert!(c.activate("Nope", anchor(), VIEWPORT).is_empty());
        assert!(c.pointer_enter_marker("Nope", anchor(), VIEWPORT).is_empty());
        assert_eq!(c.state(), &TooltipState::default());
    }

    #[test]
    fn test_missing_anchor_aborts_show() {
        let mut c = controller(InputMode::Pointer);
        assert!(c.pointer_enter_marker("Vec", None, VIEWPORT).is_empty());
        assert!(!c.state().visible);

        let mut t = controller(InputMode::Touch);
        let outcome = t.activate("Vec", None, VIEWPORT);
        assert_eq!(outcome.navigation(), None);
        assert!(!t.state().visible);
    }

    #[test]
    fn test_dismiss_and_reset() {
        let mut c = controller(InputMode::Pointer);
        c.pointer_enter_marker("Vec", anchor(), VIEWPORT);
        let ticket = scheduled_ticket(&c.pointer_leave_marker(false));

        let outcome = c.dismiss();
        assert_eq!(outcome.effects, vec![Effect::CancelHide]);
        assert!(!c.state().visible);
        c.hide_elapsed(ticket);

        c.pointer_enter_marker("Vec", anchor(), VIEWPORT);
        assert!(c.reset().effects.is_empty());
        assert_eq!(c.state(), &TooltipState::default());
    }

    #[test]
    fn test_listeners_notified_on_change_only() {
        let mut c = controller(InputMode::Pointer);
        let seen: Rc<RefCell<Vec<TooltipState>>> = Rc::default();
        let sink = seen.clone();
        let id = c.subscribe(move |state| sink.borrow_mut().push(state.clone()));

        c.pointer_enter_marker("Vec", anchor(), VIEWPORT);
        c.pointer_enter_marker("Vec", anchor(), VIEWPORT);
        assert_eq!(seen.borrow().len(), 1);

        let ticket = scheduled_ticket(&c.pointer_leave_marker(false));
        assert_eq!(seen.borrow().len(), 1);
        c.hide_elapsed(ticket);
        assert_eq!(seen.borrow().len(), 2);
        assert!(!seen.borrow()[1].visible);

        assert!(c.unsubscribe(id));
        c.pointer_enter_marker("Rc", anchor(), VIEWPORT);
        assert_eq!(seen.borrow().len(), 2);
        assert!(!c.unsubscribe(id));
    }
}
