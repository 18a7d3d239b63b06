//! Pointer interaction: throttling, hover tracking and event emission.
//!
//! # State Machine
//!
//! ```text
//!                 move onto feature cell
//!        Idle ─────────────────────────────► Hovering(target)
//!         ▲   ◄─────────────────────────────   │  ▲
//!         │     move onto empty cell           │  │ move onto a different
//!         │     (mouseout)                     │  │ feature cell
//!         │                                    └──┘ (mouseout + mouseover)
//!         │
//!       reset (detach, source change)
//! ```
//!
//! Moves that stay on the hovered cell emit `mousemove`. Clicks are
//! resolved independently of hover state.

mod cursor;
mod events;
mod gate;
mod hover;
mod throttle;

pub use cursor::{cursor_strategy, Cursor, CursorStrategy, CursorSurface, NoCursor, PointerCursor};
pub use events::{FeatureEvent, LayerEvent};
pub use gate::{BoxZoomGate, DEFAULT_RESUME_DELAY};
pub use hover::{HoverState, HoverTarget};
pub use throttle::MoveThrottle;
