//! Cursor feedback while hovering features.

use std::fmt;

/// Cursor shapes the layer asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Default,
    Pointer,
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cursor::Default => write!(f, "default"),
            Cursor::Pointer => write!(f, "pointer"),
        }
    }
}

/// Something whose cursor can be changed, normally the map container.
pub trait CursorSurface {
    fn set_cursor(&self, cursor: Cursor);
}

/// How cursor updates are applied. Chosen once when the layer is built.
pub trait CursorStrategy: Send + Sync {
    fn apply(&self, surface: &dyn CursorSurface, cursor: Cursor);
}

/// Leaves the cursor alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCursor;

impl CursorStrategy for NoCursor {
    fn apply(&self, _surface: &dyn CursorSurface, _cursor: Cursor) {}
}

/// Forwards cursor changes to the surface.
#[derive(Debug, Default, Clone, Copy)]
pub struct PointerCursor;

impl CursorStrategy for PointerCursor {
    fn apply(&self, surface: &dyn CursorSurface, cursor: Cursor) {
        surface.set_cursor(cursor);
    }
}

/// Strategy for the `pointer_cursor` setting.
pub fn cursor_strategy(pointer_cursor: bool) -> Box<dyn CursorStrategy> {
    if pointer_cursor {
        Box::new(PointerCursor)
    } else {
        Box::new(NoCursor)
    }
}
