//! Pointer driven editing of an oriented box volume: a decomposed box model that always
//! recomposes into a valid box, a four click creation sequence and face drag resizing.

pub mod common;
pub mod consts;
pub mod engine;
pub mod settings;
