pub mod box_create;
pub mod box_model;
pub mod box_resize;

// Use `editor` in module name to make file more searchable.
mod editor_events;
pub mod events {
    pub use super::editor_events::*;
}
