use nalgebra::Vector2;

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT = 1 << 2;
        const META = 1 << 3;
    }
}

impl Modifiers {
    /// Whether every modifier of `required` is held. An empty `required` never matches, so
    /// an unbound action can't be triggered by accident.
    pub fn is_held(&self, required: Modifiers) -> bool {
        !required.is_empty() && self.contains(required)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEventKind {
    /// Pointer moved with no button held.
    Move,
    /// Press and release without moving far enough to start a drag.
    Click,
    DoubleClick,
    DragStart,
    Drag,
    DragEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Mouse,
    Touch,
    Pen,
}

/// A gesture already recognized by the host, in view space pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub position: Vector2<f64>,
    pub kind: PointerEventKind,
    pub source: InputSource,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub fn new(kind: PointerEventKind, position: Vector2<f64>) -> Self {
        Self {
            position,
            kind,
            source: InputSource::Mouse,
            modifiers: Modifiers::empty(),
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_source(mut self, source: InputSource) -> Self {
        self.source = source;
        self
    }
}
