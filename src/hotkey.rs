//! Global shortcut detection
//!
//! Watches the system-wide key stream for `<modifiers>+<digit>` and an
//! optional Escape quit key. Matching lives in [`ShortcutMatcher`], a plain
//! state machine; [`start_listener`] drives it from an rdev hook thread.

use crate::config::{Config, Modifier};
use crate::error::{ServiceError, ServiceResult};
use rdev::{listen, EventType, Key};
use std::thread;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Signals sent from the listener thread to the service runner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerSignal {
    /// The configured combination was pressed
    Trigger,
    /// The quit key was pressed
    Quit,
}

/// Matching state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// The combination is not down
    Idle,
    /// The combination fired and has not been released yet
    Fired,
}

/// A modifier set plus a digit key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcut {
    pub modifiers: Vec<Modifier>,
    pub digit: u8,
}

impl Shortcut {
    pub fn new(modifiers: Vec<Modifier>, digit: u8) -> ServiceResult<Self> {
        if digit > 9 {
            return Err(ServiceError::Config(format!(
                "shortcut digit must be 0-9, got {digit}"
            )));
        }
        if modifiers.is_empty() {
            return Err(ServiceError::Config(
                "shortcut needs at least one modifier".to_string(),
            ));
        }
        Ok(Self { modifiers, digit })
    }

    pub fn from_config(config: &Config) -> ServiceResult<Self> {
        Self::new(config.modifiers.clone(), config.shortcut_key)
    }
}

impl std::fmt::Display for Shortcut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{modifier}+")?;
        }
        write!(f, "{}", self.digit)
    }
}

/// Which modifiers are currently held
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct HeldModifiers {
    ctrl_left: bool,
    ctrl_right: bool,
    alt_left: bool,
    alt_right: bool,
    shift_left: bool,
    shift_right: bool,
    meta_left: bool,
    meta_right: bool,
}

impl HeldModifiers {
    /// Record a press/release; returns the modifier the key belongs to
    fn update(&mut self, key: Key, down: bool) -> Option<Modifier> {
        let (slot, modifier) = match key {
            Key::ControlLeft => (&mut self.ctrl_left, Modifier::Ctrl),
            Key::ControlRight => (&mut self.ctrl_right, Modifier::Ctrl),
            Key::Alt => (&mut self.alt_left, Modifier::Alt),
            Key::AltGr => (&mut self.alt_right, Modifier::Alt),
            Key::ShiftLeft => (&mut self.shift_left, Modifier::Shift),
            Key::ShiftRight => (&mut self.shift_right, Modifier::Shift),
            Key::MetaLeft => (&mut self.meta_left, Modifier::Super),
            Key::MetaRight => (&mut self.meta_right, Modifier::Super),
            _ => return None,
        };
        *slot = down;
        Some(modifier)
    }

    fn is_held(&self, modifier: Modifier) -> bool {
        match modifier {
            Modifier::Ctrl => self.ctrl_left || self.ctrl_right,
            Modifier::Alt => self.alt_left || self.alt_right,
            Modifier::Shift => self.shift_left || self.shift_right,
            Modifier::Super => self.meta_left || self.meta_right,
        }
    }
}

/// Digit carried by a main-row or keypad key
pub fn digit_of(key: Key) -> Option<u8> {
    match key {
        Key::Num0 | Key::Kp0 => Some(0),
        Key::Num1 | Key::Kp1 => Some(1),
        Key::Num2 | Key::Kp2 => Some(2),
        Key::Num3 | Key::Kp3 => Some(3),
        Key::Num4 | Key::Kp4 => Some(4),
        Key::Num5 | Key::Kp5 => Some(5),
        Key::Num6 | Key::Kp6 => Some(6),
        Key::Num7 | Key::Kp7 => Some(7),
        Key::Num8 | Key::Kp8 => Some(8),
        Key::Num9 | Key::Kp9 => Some(9),
        _ => None,
    }
}

/// Idle/Fired state machine over raw key events
#[derive(Debug)]
pub struct ShortcutMatcher {
    shortcut: Shortcut,
    quit_on_escape: bool,
    held: HeldModifiers,
    state: ListenerState,
}

impl ShortcutMatcher {
    pub fn new(shortcut: Shortcut, quit_on_escape: bool) -> Self {
        Self {
            shortcut,
            quit_on_escape,
            held: HeldModifiers::default(),
            state: ListenerState::Idle,
        }
    }

    pub fn state(&self) -> ListenerState {
        self.state
    }

    pub fn shortcut(&self) -> &Shortcut {
        &self.shortcut
    }

    fn combination_held(&self) -> bool {
        self.shortcut.modifiers.iter().all(|m| self.held.is_held(*m))
    }

    /// Feed one event; returns a signal when the event completes the shortcut or quits
    pub fn handle(&mut self, event: &EventType) -> Option<ListenerSignal> {
        match *event {
            EventType::KeyPress(key) => {
                if key == Key::Escape && self.quit_on_escape {
                    return Some(ListenerSignal::Quit);
                }
                if self.held.update(key, true).is_some() {
                    return None;
                }
                if self.state == ListenerState::Idle
                    && digit_of(key) == Some(self.shortcut.digit)
                    && self.combination_held()
                {
                    self.state = ListenerState::Fired;
                    return Some(ListenerSignal::Trigger);
                }
                None
            }
            EventType::KeyRelease(key) => {
                let released_modifier = self.held.update(key, false);
                let resets = match released_modifier {
                    Some(modifier) => self.shortcut.modifiers.contains(&modifier),
                    None => digit_of(key) == Some(self.shortcut.digit),
                };
                if resets {
                    self.state = ListenerState::Idle;
                }
                None
            }
            _ => None,
        }
    }

    /// Held-modifier summary for debug logging
    fn describe_held(&self) -> String {
        let held: Vec<String> = [
            Modifier::Ctrl,
            Modifier::Alt,
            Modifier::Shift,
            Modifier::Super,
        ]
        .into_iter()
        .filter(|m| self.held.is_held(*m))
        .map(|m| m.to_string())
        .collect();
        format!("[{}]", held.join(", "))
    }
}

/// Start the global key listener on its own thread.
///
/// The matcher runs synchronously on the hook thread, in event order.
/// If the hook cannot be installed the channel closes.
pub fn start_listener(
    matcher: ShortcutMatcher,
    debug_keys: bool,
) -> mpsc::UnboundedReceiver<ListenerSignal> {
    let (tx, rx) = mpsc::unbounded_channel();

    thread::spawn(move || {
        let mut matcher = matcher;
        info!("⌨️ Keyboard listener started, waiting for {}", matcher.shortcut());

        let callback = move |event: rdev::Event| {
            let signal = matcher.handle(&event.event_type);

            if debug_keys {
                if let EventType::KeyPress(_) | EventType::KeyRelease(_) = event.event_type {
                    debug!(
                        "Key event: {:?} held={} state={:?}",
                        event.event_type,
                        matcher.describe_held(),
                        matcher.state()
                    );
                }
            }

            if let Some(signal) = signal {
                if signal == ListenerSignal::Trigger {
                    info!("🎯 Shortcut triggered: {}", matcher.shortcut());
                }
                let _ = tx.send(signal);
            }
        };

        // This blocks until an error occurs
        if let Err(e) = listen(callback) {
            error!("❌ Keyboard listener failed: {:?}", e);
            error!("   This is usually a permissions or display-access problem");
        }
    });

    rx
}
