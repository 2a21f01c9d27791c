pub mod math {
    /// Below this magnitude a dot product or length is treated as zero.
    pub const EPSILON: f64 = 1e-12;
}

pub mod world {
    use nalgebra::Vector3;

    pub fn default_up() -> Vector3<f64> {
        Vector3::z()
    }

    pub fn default_north() -> Vector3<f64> {
        Vector3::y()
    }
}

pub mod editor {
    pub mod box_volume {
        /// Smallest extent, in meters, a box may have along any local axis.
        pub const MIN_WIDTH: f64 = 0.1;
        /// Largest extent, in meters, a box may have along any local axis. Keeping boxes
        /// below this keeps the locally flat world assumption valid.
        pub const MAX_WIDTH: f64 = 10_000.0;

        pub const MIN_WIDTH_ENV: &str = "BOX_EDITOR_MIN_WIDTH";
        pub const MAX_WIDTH_ENV: &str = "BOX_EDITOR_MAX_WIDTH";
    }
}
