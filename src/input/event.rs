/// Platform-agnostic input events.
///
/// Hosts translate their native events (winit window events, DOM pointer
/// events) into these and feed them to
/// [`Pipeline::handle_input`](crate::Pipeline::handle_input).
///
/// # Example
///
/// ```ignore
/// pipeline.handle_input(&InputEvent::CursorMoved { x: 100.0, y: 200.0 });
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Cursor moved to absolute position on the render surface.
    CursorMoved {
        /// Horizontal position in logical pixels.
        x: f32,
        /// Vertical position in logical pixels.
        y: f32,
    },
    /// Mouse button pressed or released.
    MouseButton {
        /// Which button changed.
        button: MouseButton,
        /// `true` for press, `false` for release.
        pressed: bool,
    },
    /// Scroll wheel in notches (positive = zoom in).
    Scroll {
        /// Scroll amount (positive = zoom in, negative = zoom out).
        delta: f32,
    },
    /// Modifier key state changed.
    ModifiersChanged {
        /// Whether the shift key is held.
        shift: bool,
    },
}

/// Platform-agnostic mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary (left) mouse button.
    Left,
    /// Secondary (right) mouse button.
    Right,
    /// Middle mouse button (wheel click).
    Middle,
}

impl MouseButton {
    /// Map a DOM `MouseEvent.button` index. Unknown buttons map to `None`.
    #[must_use]
    pub fn from_dom_index(index: i16) -> Option<Self> {
        match index {
            0 => Some(Self::Left),
            1 => Some(Self::Middle),
            2 => Some(Self::Right),
            _ => None,
        }
    }
}

/// Phase of a DOM pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    /// `pointerdown`
    Down,
    /// `pointerup`
    Up,
    /// `pointermove`
    Move,
}

impl PointerPhase {
    /// Whether the host must capture the pointer on this phase, so the
    /// matching `pointerup` still arrives after the cursor leaves the
    /// surface mid-drag.
    #[must_use]
    pub const fn captures(self) -> bool {
        matches!(self, Self::Down)
    }

    /// Translate one pointer event into controller input: modifiers, the
    /// cursor position, then the button change for down/up phases.
    #[must_use]
    pub fn events(self, shift: bool, x: f32, y: f32, dom_button: i16) -> Vec<InputEvent> {
        let mut events = vec![
            InputEvent::ModifiersChanged { shift },
            InputEvent::CursorMoved { x, y },
        ];
        let pressed = match self {
            Self::Down => true,
            Self::Up => false,
            Self::Move => return events,
        };
        if let Some(button) = MouseButton::from_dom_index(dom_button) {
            events.push(InputEvent::MouseButton { button, pressed });
        }
        events
    }
}

#[cfg(feature = "viewer")]
impl From<winit::event::MouseButton> for MouseButton {
    fn from(button: winit::event::MouseButton) -> Self {
        match button {
            winit::event::MouseButton::Right => Self::Right,
            winit::event::MouseButton::Middle => Self::Middle,
            _ => Self::Left,
        }
    }
}
