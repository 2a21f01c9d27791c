use nalgebra::Vector3;

use crate::{
    common::{
        error::{EditorError, EditorResult},
        frame::ReferenceFrame,
        geometry::{obb::OrientedBox, shape::Axis},
        math,
    },
    consts::math::EPSILON,
    engine::editor::editor_events::{self, BoxEvent, BoxEvents},
    settings::EditorSettings,
};

/// `[min, max]` along one local axis, measured from the model origin.
pub type Interval = [f64; 2];

/// The decomposed box. `dirs` stay orthonormal since they are only ever replaced wholesale
/// by a decomposition or rotated together.
#[derive(Debug, Clone, PartialEq)]
struct BoxFrame {
    origin: Vector3<f64>,
    dirs: [Vector3<f64>; 3],
    intervals: [Interval; 3],
}

/// Owns the editable box. Every mutation recomposes an [`OrientedBox`] and publishes it
/// on [`BoxChannel::Changed`](crate::engine::editor::events::BoxChannel::Changed).
#[derive(Debug)]
pub struct OrientedBoxModel {
    min_width: f64,
    max_width: f64,
    reference_frame: ReferenceFrame,
    events: BoxEvents,

    frame: Option<BoxFrame>,
    current_box: Option<OrientedBox>,
}

impl OrientedBoxModel {
    /// Fails on settings that don't pass [`EditorSettings::validate`].
    pub fn new(settings: &EditorSettings, events: BoxEvents) -> EditorResult<Self> {
        settings.validate()?;
        Ok(Self {
            min_width: settings.min_width,
            max_width: settings.max_width,
            reference_frame: settings.frame,
            events,

            frame: None,
            current_box: None,
        })
    }

    pub fn events(&self) -> &BoxEvents {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.frame.is_none()
    }

    /// Forgets the box without notifying anyone.
    pub fn reset(&mut self) {
        self.frame = None;
        self.current_box = None;
    }

    /// Decomposes `obb` with corner 7 as the origin and corners 3, 5 and 6 giving the x, y
    /// and z directions. Extents outside the width limits are clamped.
    pub fn update_box(&mut self, obb: &OrientedBox) -> EditorResult<()> {
        let corners = obb.corners();
        let origin = corners[7];

        let mut dirs = [Vector3::zeros(); 3];
        let mut intervals = [[0.0; 2]; 3];
        for (i, corner) in [3, 5, 6].into_iter().enumerate() {
            let edge = corners[corner] - origin;
            let length = edge.norm();
            if length <= EPSILON {
                return Err(EditorError::domain(format!(
                    "box has a degenerate {} edge",
                    axis_name(i)
                )));
            }
            dirs[i] = edge / length;
            let clamped = length.clamp(self.min_width, self.max_width);
            if clamped != length {
                log::debug!(
                    "Clamped box {} extent from {} to {}.",
                    axis_name(i),
                    length,
                    clamped
                );
            }
            intervals[i] = [0.0, clamped];
        }

        log::debug!("Loaded box at {:?}.", origin);
        self.commit(BoxFrame {
            origin,
            dirs,
            intervals,
        })
    }

    pub fn get_box(&self) -> EditorResult<OrientedBox> {
        self.current_box
            .clone()
            .ok_or_else(|| EditorError::state("no box has been set on the model"))
    }

    pub fn set_x_interval(&mut self, min: Option<f64>, max: Option<f64>) -> EditorResult<()> {
        self.set_interval(Axis::X, min, max)
    }

    pub fn set_y_interval(&mut self, min: Option<f64>, max: Option<f64>) -> EditorResult<()> {
        self.set_interval(Axis::Y, min, max)
    }

    pub fn set_z_interval(&mut self, min: Option<f64>, max: Option<f64>) -> EditorResult<()> {
        self.set_interval(Axis::Z, min, max)
    }

    /// Overwrites only the given bounds; with neither given nothing happens. The result is
    /// saturated so the extent stays within the width limits, moving the bound that was
    /// passed in.
    pub fn set_interval(
        &mut self,
        axis: Axis,
        min: Option<f64>,
        max: Option<f64>,
    ) -> EditorResult<()> {
        if min.is_none() && max.is_none() {
            return Ok(());
        }
        let mut frame = self.require_frame()?.clone();
        let [current_min, current_max] = frame.intervals[axis.index()];

        let (lo, hi) = (self.min_width, self.max_width);
        let interval = match (min, max) {
            (Some(min), None) => [min.clamp(current_max - hi, current_max - lo), current_max],
            (None, Some(max)) => [current_min, max.clamp(current_min + lo, current_min + hi)],
            (Some(min), Some(max)) => [min, min + (max - min).clamp(lo, hi)],
            (None, None) => return Ok(()),
        };
        let requested = [min.unwrap_or(current_min), max.unwrap_or(current_max)];
        if interval != requested {
            log::debug!(
                "Saturated {} interval [{}, {}] to [{}, {}].",
                axis,
                requested[0],
                requested[1],
                interval[0],
                interval[1]
            );
        }

        frame.intervals[axis.index()] = interval;
        self.commit(frame)?;
        editor_events::emit(
            &self.events,
            BoxEvent::IntervalChanged {
                axis,
                min: interval[0],
                max: interval[1],
            },
        );
        Ok(())
    }

    pub fn translate(&mut self, v: &Vector3<f64>) -> EditorResult<()> {
        let mut frame = self.require_frame()?.clone();
        frame.origin += v;
        self.commit(frame)
    }

    /// Rotates the whole box by `degrees` about the line through `center` along its local z.
    pub fn rotate_around_z(&mut self, center: &Vector3<f64>, degrees: f64) -> EditorResult<()> {
        let mut frame = self.require_frame()?.clone();
        let axis = frame.dirs[2];
        frame.origin = math::rotate_point_around_line(&frame.origin, center, &axis, degrees);
        frame.dirs = frame
            .dirs
            .map(|dir| math::rotate_around_axis(&dir, &axis, degrees));
        self.commit(frame)
    }

    pub fn get_x_interval(&self) -> EditorResult<Interval> {
        self.get_interval(Axis::X)
    }

    pub fn get_y_interval(&self) -> EditorResult<Interval> {
        self.get_interval(Axis::Y)
    }

    pub fn get_z_interval(&self) -> EditorResult<Interval> {
        self.get_interval(Axis::Z)
    }

    pub fn get_interval(&self, axis: Axis) -> EditorResult<Interval> {
        Ok(self.require_frame()?.intervals[axis.index()])
    }

    pub fn intervals(&self) -> EditorResult<[Interval; 3]> {
        Ok(self.require_frame()?.intervals)
    }

    pub fn origin(&self) -> EditorResult<Vector3<f64>> {
        Ok(self.require_frame()?.origin)
    }

    /// The local x, y and z directions in world space.
    pub fn directions(&self) -> EditorResult<[Vector3<f64>; 3]> {
        Ok(self.require_frame()?.dirs)
    }

    /// Center of the x/y footprint at the origin's height along z.
    pub fn get_xy_center(&self) -> EditorResult<Vector3<f64>> {
        let frame = self.require_frame()?;
        let mid = |interval: Interval| (interval[0] + interval[1]) * 0.5;
        Ok(frame.origin
            + frame.dirs[0] * mid(frame.intervals[0])
            + frame.dirs[1] * mid(frame.intervals[1]))
    }

    pub fn calculate_x_distance(&self, point: &Vector3<f64>) -> EditorResult<f64> {
        self.calculate_distance(Axis::X, point)
    }

    pub fn calculate_y_distance(&self, point: &Vector3<f64>) -> EditorResult<f64> {
        self.calculate_distance(Axis::Y, point)
    }

    pub fn calculate_z_distance(&self, point: &Vector3<f64>) -> EditorResult<f64> {
        self.calculate_distance(Axis::Z, point)
    }

    /// Signed distance of `point` from the origin along the local `axis`.
    pub fn calculate_distance(&self, axis: Axis, point: &Vector3<f64>) -> EditorResult<f64> {
        let frame = self.require_frame()?;
        Ok(math::distance_along_direction(
            point,
            &frame.origin,
            &frame.dirs[axis.index()],
        ))
    }

    fn require_frame(&self) -> EditorResult<&BoxFrame> {
        self.frame
            .as_ref()
            .ok_or_else(|| EditorError::state("no box has been set on the model"))
    }

    /// Recomposes `frame` and only then stores it, so a failed composition leaves the model
    /// untouched.
    fn commit(&mut self, frame: BoxFrame) -> EditorResult<()> {
        let obb = self.recalculate_box(&frame)?;
        self.frame = Some(frame);
        self.current_box = Some(obb.clone());
        log::trace!("Box changed: {:?}", obb);
        editor_events::emit(&self.events, BoxEvent::Changed(obb));
        Ok(())
    }

    fn recalculate_box(&self, frame: &BoxFrame) -> EditorResult<OrientedBox> {
        let up = self.reference_frame.up();
        // Only the horizontal part of x matters for the azimuth.
        let horizontal_x = math::project_point_on_plane(&frame.dirs[0], &Vector3::zeros(), &up);
        let azimuth = math::angle(&self.reference_frame.east(), &horizontal_x, &up)?;

        let [x, y, z] = frame.intervals;
        Ok(OrientedBox::new(
            frame.origin,
            azimuth,
            Vector3::new(x[0], y[0], z[0]),
            Vector3::new(x[1] - x[0], y[1] - y[0], z[1] - z[0]),
            &self.reference_frame,
        ))
    }
}

fn axis_name(index: usize) -> &'static str {
    ["x", "y", "z"][index]
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;
    use crate::consts::editor::box_volume::{MAX_WIDTH, MIN_WIDTH};
    use crate::engine::editor::events::BoxChannel;

    fn sample_box() -> OrientedBox {
        OrientedBox::new(
            Vector3::new(12.0, -4.0, 3.0),
            33.0,
            Vector3::new(-1.0, 2.0, 0.5),
            Vector3::new(10.0, 4.0, 2.0),
            &ReferenceFrame::default(),
        )
    }

    fn loaded_model() -> OrientedBoxModel {
        let mut model =
            OrientedBoxModel::new(&EditorSettings::default(), BoxEvents::new()).unwrap();
        model.update_box(&sample_box()).unwrap();
        model
    }

    fn assert_orthonormal(model: &OrientedBoxModel) {
        let [x, y, z] = model.directions().unwrap();
        assert_relative_eq!(x.dot(&y), 0.0, epsilon = 1e-9);
        assert_relative_eq!(y.dot(&z), 0.0, epsilon = 1e-9);
        assert_relative_eq!(x.dot(&z), 0.0, epsilon = 1e-9);
        for dir in [x, y, z] {
            assert_relative_eq!(dir.norm(), 1.0, epsilon = 1e-9);
        }
    }

    fn assert_intervals_valid(model: &OrientedBoxModel) {
        for [min, max] in model.intervals().unwrap() {
            let width = max - min;
            assert!(width >= MIN_WIDTH - 1e-9, "width {} below minimum", width);
            assert!(width <= MAX_WIDTH + 1e-9, "width {} above maximum", width);
        }
    }

    fn assert_same_corners(a: &OrientedBox, b: &OrientedBox) {
        for (ca, cb) in a.corners().iter().zip(b.corners().iter()) {
            assert_relative_eq!(ca, cb, epsilon = 1e-9);
        }
    }

    #[test]
    fn empty_model_is_a_state_error() {
        let mut model =
            OrientedBoxModel::new(&EditorSettings::default(), BoxEvents::new()).unwrap();
        assert!(model.is_empty());
        assert!(matches!(model.get_box(), Err(EditorError::State(_))));
        assert!(matches!(model.get_x_interval(), Err(EditorError::State(_))));
        assert!(matches!(
            model.translate(&Vector3::x()),
            Err(EditorError::State(_))
        ));
        assert!(model.is_empty());
    }

    #[test]
    fn inverted_limits_are_rejected() {
        let settings = EditorSettings {
            min_width: 5.0,
            max_width: 1.0,
            ..Default::default()
        };
        assert!(matches!(
            OrientedBoxModel::new(&settings, BoxEvents::new()),
            Err(EditorError::Settings(_))
        ));
    }

    #[test]
    fn round_trip_keeps_corners() {
        let model = loaded_model();
        assert_same_corners(&model.get_box().unwrap(), &sample_box());
    }

    #[test]
    fn round_trip_in_y_up_frame() {
        let frame = ReferenceFrame::new(Vector3::y(), -Vector3::z()).unwrap();
        let settings = EditorSettings {
            frame,
            ..Default::default()
        };
        let obb = OrientedBox::new(
            Vector3::new(3.0, 1.0, -7.0),
            40.0,
            Vector3::new(0.5, -1.5, 2.0),
            Vector3::new(6.0, 3.0, 2.5),
            &frame,
        );

        let mut model = OrientedBoxModel::new(&settings, BoxEvents::new()).unwrap();
        model.update_box(&obb).unwrap();
        assert_orthonormal(&model);
        assert_relative_eq!(model.directions().unwrap()[2], Vector3::y(), epsilon = 1e-9);

        let recomposed = model.get_box().unwrap();
        assert_same_corners(&recomposed, &obb);
        assert_relative_eq!(recomposed.azimuth, 40.0, epsilon = 1e-9);
    }

    #[test]
    fn decomposition_uses_corner_seven_as_origin() {
        let model = loaded_model();
        let corners = sample_box().corners();
        assert_relative_eq!(model.origin().unwrap(), corners[7], epsilon = 1e-9);
        assert_relative_eq!(model.get_x_interval().unwrap()[1], 10.0, epsilon = 1e-9);
        assert_relative_eq!(model.get_y_interval().unwrap()[1], 4.0, epsilon = 1e-9);
        assert_relative_eq!(model.get_z_interval().unwrap()[1], 2.0, epsilon = 1e-9);
        assert_relative_eq!(model.get_box().unwrap().azimuth, 33.0, epsilon = 1e-9);
    }

    #[test]
    fn update_box_clamps_extents() {
        let mut model =
            OrientedBoxModel::new(&EditorSettings::default(), BoxEvents::new()).unwrap();
        let thin = OrientedBox::new(
            Vector3::zeros(),
            0.0,
            Vector3::zeros(),
            Vector3::new(0.01, 2.0 * MAX_WIDTH, 1.0),
            &ReferenceFrame::default(),
        );
        model.update_box(&thin).unwrap();
        assert_relative_eq!(model.get_x_interval().unwrap()[1], MIN_WIDTH, epsilon = 1e-9);
        assert_relative_eq!(model.get_y_interval().unwrap()[1], MAX_WIDTH, epsilon = 1e-6);
    }

    #[test]
    fn degenerate_box_is_rejected_without_writes() {
        let mut model = loaded_model();
        let before = model.get_box().unwrap();
        let flat = OrientedBox::new(
            Vector3::zeros(),
            0.0,
            Vector3::zeros(),
            Vector3::new(1.0, 1.0, 0.0),
            &ReferenceFrame::default(),
        );
        assert!(matches!(model.update_box(&flat), Err(EditorError::Domain(_))));
        assert_eq!(model.get_box().unwrap(), before);
    }

    #[test]
    fn set_interval_overwrites_only_given_bounds() {
        let mut model = loaded_model();
        model.set_x_interval(Some(2.0), None).unwrap();
        assert_eq!(model.get_x_interval().unwrap(), [2.0, 10.0]);
        model.set_x_interval(None, Some(7.0)).unwrap();
        assert_eq!(model.get_x_interval().unwrap(), [2.0, 7.0]);

        let obb = model.get_box().unwrap();
        assert_relative_eq!(obb.offset.x, 2.0);
        assert_relative_eq!(obb.size.x, 5.0);
    }

    #[test]
    fn set_interval_without_bounds_is_silent() {
        let mut model = loaded_model();
        let count = Rc::new(RefCell::new(0));
        let _subscription = {
            let count = count.clone();
            model
                .events()
                .subscribe(BoxChannel::Changed, move |_| *count.borrow_mut() += 1)
        };
        model.set_y_interval(None, None).unwrap();
        assert_eq!(*count.borrow(), 0);
        model.set_y_interval(Some(1.0), None).unwrap();
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn set_interval_is_idempotent() {
        let mut model = loaded_model();
        model.set_x_interval(Some(1.5), Some(6.5)).unwrap();
        let first = model.get_box().unwrap();
        model.set_x_interval(Some(1.5), Some(6.5)).unwrap();
        assert_eq!(model.get_box().unwrap(), first);
    }

    #[test]
    fn set_interval_saturates() {
        let mut model = loaded_model();
        model.set_x_interval(Some(9.99), None).unwrap();
        assert_relative_eq!(model.get_x_interval().unwrap()[0], 10.0 - MIN_WIDTH);

        model.set_x_interval(None, Some(-5.0)).unwrap();
        let [min, max] = model.get_x_interval().unwrap();
        assert_relative_eq!(max - min, MIN_WIDTH, epsilon = 1e-9);

        model.set_z_interval(Some(0.0), Some(MAX_WIDTH * 3.0)).unwrap();
        assert_eq!(model.get_z_interval().unwrap(), [0.0, MAX_WIDTH]);
        assert_intervals_valid(&model);
    }

    #[test]
    fn interval_change_is_published() {
        let mut model = loaded_model();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _subscription = {
            let seen = seen.clone();
            model
                .events()
                .subscribe(BoxChannel::IntervalChanged, move |event| {
                    seen.borrow_mut().push(event.clone())
                })
        };
        model.set_z_interval(None, Some(3.0)).unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![BoxEvent::IntervalChanged {
                axis: Axis::Z,
                min: 0.0,
                max: 3.0
            }]
        );
    }

    #[test]
    fn translate_moves_every_corner() {
        let mut model = loaded_model();
        let before = model.get_box().unwrap();
        let delta = Vector3::new(1.0, -2.0, 0.5);
        model.translate(&delta).unwrap();
        let after = model.get_box().unwrap();
        for (a, b) in before.corners().iter().zip(after.corners().iter()) {
            assert_relative_eq!(a + delta, *b, epsilon = 1e-9);
        }
    }

    #[test]
    fn rotate_around_z_turns_azimuth() {
        let mut model = loaded_model();
        let center = model.get_xy_center().unwrap();
        model.rotate_around_z(&center, 90.0).unwrap();
        assert_relative_eq!(model.get_box().unwrap().azimuth, 123.0, epsilon = 1e-9);
        // The footprint center is on the rotation axis so it stays put.
        assert_relative_eq!(model.get_xy_center().unwrap(), center, epsilon = 1e-9);
        assert_orthonormal(&model);
    }

    #[test]
    fn xy_center_and_distances() {
        let mut model =
            OrientedBoxModel::new(&EditorSettings::default(), BoxEvents::new()).unwrap();
        model
            .update_box(&OrientedBox::new(
                Vector3::new(1.0, 1.0, 1.0),
                0.0,
                Vector3::zeros(),
                Vector3::new(4.0, 2.0, 6.0),
                &ReferenceFrame::default(),
            ))
            .unwrap();
        assert_relative_eq!(
            model.get_xy_center().unwrap(),
            Vector3::new(3.0, 2.0, 1.0),
            epsilon = 1e-9
        );

        let point = Vector3::new(0.0, 5.0, 4.0);
        assert_relative_eq!(model.calculate_x_distance(&point).unwrap(), -1.0, epsilon = 1e-9);
        assert_relative_eq!(model.calculate_y_distance(&point).unwrap(), 4.0, epsilon = 1e-9);
        assert_relative_eq!(model.calculate_z_distance(&point).unwrap(), 3.0, epsilon = 1e-9);
    }

    #[test]
    fn random_edits_keep_invariants() {
        let mut rng = StdRng::seed_from_u64(0x0b0c);
        let mut model = loaded_model();
        for _ in 0..500 {
            match rng.gen_range(0..3) {
                0 => model
                    .translate(&Vector3::new(
                        rng.gen_range(-50.0..50.0),
                        rng.gen_range(-50.0..50.0),
                        rng.gen_range(-5.0..5.0),
                    ))
                    .unwrap(),
                1 => {
                    let center = Vector3::new(
                        rng.gen_range(-20.0..20.0),
                        rng.gen_range(-20.0..20.0),
                        0.0,
                    );
                    model
                        .rotate_around_z(&center, rng.gen_range(-180.0..180.0))
                        .unwrap()
                }
                _ => {
                    let axis = [Axis::X, Axis::Y, Axis::Z][rng.gen_range(0..3)];
                    let min = rng.gen_bool(0.5).then(|| rng.gen_range(-30.0..30.0));
                    let max = rng.gen_bool(0.5).then(|| rng.gen_range(-30.0..30.0));
                    model.set_interval(axis, min, max).unwrap()
                }
            }
            assert_orthonormal(&model);
            assert_intervals_valid(&model);
        }
    }

    #[test]
    fn reset_forgets_box() {
        let mut model = loaded_model();
        model.reset();
        assert!(model.is_empty());
        assert!(model.get_box().is_err());
    }
}
