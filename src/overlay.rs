use std::fmt;

use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayKind {
    ColumnPicker,
    FilterPanel,
}

impl fmt::Display for OverlayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlayKind::ColumnPicker => f.write_str("column picker"),
            OverlayKind::FilterPanel => f.write_str("filter panel"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dismissal {
    OutsideClick,
    Escape,
    Close,
    Apply,
    Cancel,
}

/// Global input the host forwards while overlays are open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalEvent {
    /// A pointer press; `inside` names the overlay under the pointer, if any.
    PointerDown { inside: Option<OverlayKind> },
    Escape,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OverlayState {
    #[default]
    Closed,
    /// Open, with the panel's secondary input (e.g. the picker search box).
    Open { text: String },
}

/// Overlays currently listening for dismissal input.
///
/// An overlay is registered exactly while it is open. Global events are only
/// routed to registered overlays, and `clear` tears every registration down
/// when the owner goes away.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DismissListeners {
    registered: Vec<OverlayKind>,
}

impl DismissListeners {
    fn register(&mut self, kind: OverlayKind) {
        if !self.registered.contains(&kind) {
            trace!("Registering dismiss listeners for {kind}");
            self.registered.push(kind);
        }
    }

    fn deregister(&mut self, kind: OverlayKind) {
        if let Some(pos) = self.registered.iter().position(|&k| k == kind) {
            trace!("Removing dismiss listeners for {kind}");
            self.registered.remove(pos);
        }
    }

    /// Registered overlays, most recently opened last.
    pub fn targets(&self) -> Vec<OverlayKind> {
        self.registered.clone()
    }

    pub fn len(&self) -> usize {
        self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    pub fn clear(&mut self) {
        if !self.registered.is_empty() {
            trace!("Removing {} dismiss listeners", self.registered.len());
        }
        self.registered.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    kind: OverlayKind,
    state: OverlayState,
}

impl Overlay {
    pub fn new(kind: OverlayKind) -> Self {
        Self {
            kind,
            state: OverlayState::Closed,
        }
    }

    pub fn kind(&self) -> OverlayKind {
        self.kind
    }

    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, OverlayState::Open { .. })
    }

    /// Secondary text; always empty while closed.
    pub fn text(&self) -> &str {
        match &self.state {
            OverlayState::Open { text } => text,
            OverlayState::Closed => "",
        }
    }

    pub fn set_text(&mut self, value: impl Into<String>) -> bool {
        match &mut self.state {
            OverlayState::Open { text } => {
                *text = value.into();
                true
            }
            OverlayState::Closed => false,
        }
    }

    pub fn open(&mut self, listeners: &mut DismissListeners) -> bool {
        if self.is_open() {
            return false;
        }
        self.state = OverlayState::Open {
            text: String::new(),
        };
        listeners.register(self.kind);
        true
    }

    /// Close for `reason`; the secondary text is dropped with the open state.
    pub fn dismiss(
        &mut self,
        reason: Dismissal,
        listeners: &mut DismissListeners,
    ) -> Option<Dismissal> {
        if !self.is_open() {
            return None;
        }
        self.state = OverlayState::Closed;
        listeners.deregister(self.kind);
        trace!("Closed {} ({:?})", self.kind, reason);
        Some(reason)
    }

    /// React to global input. Only an open overlay reacts; a pointer press
    /// inside the overlay itself keeps it open.
    pub fn handle(
        &mut self,
        event: GlobalEvent,
        listeners: &mut DismissListeners,
    ) -> Option<Dismissal> {
        if !self.is_open() {
            return None;
        }
        let reason = match event {
            GlobalEvent::PointerDown { inside } if inside == Some(self.kind) => return None,
            GlobalEvent::PointerDown { .. } => Dismissal::OutsideClick,
            GlobalEvent::Escape => Dismissal::Escape,
        };
        self.dismiss(reason, listeners)
    }
}
