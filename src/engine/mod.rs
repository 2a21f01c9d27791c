pub mod editor;
pub mod event;
pub mod input;
pub mod scene;
