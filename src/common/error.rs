use thiserror::Error;

pub type EditorResult<T> = Result<T, EditorError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditorError {
    /// An operation was called in a state that can't satisfy it, e.g. reading the box
    /// before one was ever set.
    #[error("invalid state: {0}")]
    State(String),

    /// A math degeneracy such as measuring the angle of a zero length vector.
    #[error("math domain error: {0}")]
    Domain(String),

    /// The editor settings can't be used, e.g. width limits that are inverted or not finite.
    #[error("invalid settings: {0}")]
    Settings(String),
}

impl EditorError {
    pub fn state(details: impl Into<String>) -> Self {
        Self::State(details.into())
    }

    pub fn domain(details: impl Into<String>) -> Self {
        Self::Domain(details.into())
    }

    pub fn settings(details: impl Into<String>) -> Self {
        Self::Settings(details.into())
    }
}

/// The host ray cast didn't hit the reference surface. Callers skip the current preview
/// update when they see this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("ray cast missed the reference surface")]
pub struct OutOfBounds;
