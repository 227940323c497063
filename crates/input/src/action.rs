/// A high-level action a host (desktop window, headless driver) can produce.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Start the climb at the given session time.
    BeginClimb { at_ms: f64 },
    /// Output surface changed size, in physical pixels.
    Resize { width: u32, height: u32 },
    /// Show or hide the debug overlay.
    ToggleInspector,
    /// Stop the session and release everything.
    Quit,
}

/// Host-neutral key names the bindings understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Space,
    F1,
    Escape,
    Other,
}

impl Action {
    /// Default key bindings. Unbound keys produce nothing.
    pub fn from_key(key: Key, now_ms: f64) -> Option<Action> {
        match key {
            Key::Space => Some(Action::BeginClimb { at_ms: now_ms }),
            Key::F1 => Some(Action::ToggleInspector),
            Key::Escape => Some(Action::Quit),
            Key::Other => None,
        }
    }
}
