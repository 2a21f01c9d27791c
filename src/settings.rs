use crate::{
    common::{
        error::{EditorError, EditorResult},
        frame::ReferenceFrame,
    },
    consts::editor::box_volume::{MAX_WIDTH, MAX_WIDTH_ENV, MIN_WIDTH, MIN_WIDTH_ENV},
    engine::input::pointer::Modifiers,
};

#[derive(Clone, Debug)]
pub struct EditorSettings {
    /// The smallest extent in meters along any box axis.
    pub min_width: f64,
    /// The largest extent in meters along any box axis, also caps creation previews.
    pub max_width: f64,

    pub frame: ReferenceFrame,

    /// Held on the final creation click to extrude the box both ways from its base.
    pub symmetric_modifier: Modifiers,
    /// Held when a face drag starts to rotate the box instead of resizing it.
    pub rotate_modifier: Modifiers,
    /// Held when a face drag starts to move the box instead of resizing it.
    pub translate_modifier: Modifiers,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            min_width: MIN_WIDTH,
            max_width: MAX_WIDTH,

            frame: ReferenceFrame::default(),

            symmetric_modifier: Modifiers::SHIFT,
            rotate_modifier: Modifiers::ALT,
            translate_modifier: Modifiers::CONTROL,
        }
    }
}

impl EditorSettings {
    /// Defaults with the width limits overridden by `BOX_EDITOR_MIN_WIDTH` and
    /// `BOX_EDITOR_MAX_WIDTH` when they hold usable values.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Some(min_width) = read_width_var(MIN_WIDTH_ENV) {
            settings.min_width = min_width;
        }
        if let Some(max_width) = read_width_var(MAX_WIDTH_ENV) {
            settings.max_width = max_width;
        }

        if let Err(err) = settings.validate() {
            log::warn!("{}, using the default width limits.", err);
            settings.min_width = MIN_WIDTH;
            settings.max_width = MAX_WIDTH;
        }
        settings
    }

    /// Checked by every editor component on construction, the width clamps rely on it.
    pub fn validate(&self) -> EditorResult<()> {
        if !self.min_width.is_finite() || !self.max_width.is_finite() {
            return Err(EditorError::settings(format!(
                "width limits must be finite, got [{}, {}]",
                self.min_width, self.max_width
            )));
        }
        if self.min_width <= 0.0 {
            return Err(EditorError::settings(format!(
                "min width must be positive, got {}",
                self.min_width
            )));
        }
        if self.min_width > self.max_width {
            return Err(EditorError::settings(format!(
                "width limits are inverted ({} > {})",
                self.min_width, self.max_width
            )));
        }
        Ok(())
    }
}

fn read_width_var(name: &str) -> Option<f64> {
    let value = std::env::var(name).ok()?;
    match value.trim().parse::<f64>() {
        Ok(width) if width.is_finite() && width > 0.0 => Some(width),
        _ => {
            log::warn!("Ignoring {}={:?}, expected a positive number.", name, value);
            None
        }
    }
}
