use nalgebra::Vector3;

use crate::{
    common::{
        error::EditorResult,
        geometry::shape::{create_face_polygons, FaceId},
        math,
        ray::Ray,
    },
    consts::math::EPSILON,
    engine::{
        editor::box_model::{Interval, OrientedBoxModel},
        input::pointer::{PointerEvent, PointerEventKind},
        scene::SceneView,
    },
    settings::EditorSettings,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeSession {
    pub resizing_face: Option<FaceId>,
    /// Allowed values for the dragged bound, fixed when the drag starts.
    pub valid_interval: Interval,
}

impl Default for ResizeSession {
    fn default() -> Self {
        Self {
            resizing_face: None,
            valid_interval: [0.0, 0.0],
        }
    }
}

/// The face currently under the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceHit {
    pub face: FaceId,
    /// Where the pick ray entered the face.
    pub point: Vector3<f64>,
    /// The face center, where the drag handle sits.
    pub center: Vector3<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragMode {
    /// Moves one face along the line from the box center through the face center.
    Resize {
        face: FaceId,
        line_point: Vector3<f64>,
        line_dir: Vector3<f64>,
        /// Face distance minus the grab distance, so the face doesn't jump to the pointer.
        grab_offset: f64,
    },
    Rotate {
        center: Vector3<f64>,
        axis: Vector3<f64>,
        last_arm: Vector3<f64>,
    },
    Translate {
        plane_point: Vector3<f64>,
        plane_normal: Vector3<f64>,
        last_hit: Vector3<f64>,
    },
}

/// Bounds a dragged face may take so the extent along its axis stays within
/// `[min_width, max_width]` of the opposite face.
pub fn valid_interval(
    face: FaceId,
    interval: Interval,
    min_width: f64,
    max_width: f64,
) -> Interval {
    let [min, max] = interval;
    if face.is_max() {
        [min + min_width, min + max_width]
    } else {
        [max - max_width, max - min_width]
    }
}

/// Drags the faces of the box held by an [`OrientedBoxModel`].
pub struct BoxResizeController {
    settings: EditorSettings,
    session: ResizeSession,
    hovered: Option<FaceHit>,
    drag: Option<DragMode>,
    active: bool,
    on_click: Option<Box<dyn FnMut(bool)>>,
}

impl std::fmt::Debug for BoxResizeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxResizeController")
            .field("session", &self.session)
            .field("hovered", &self.hovered)
            .field("drag", &self.drag)
            .field("active", &self.active)
            .field("has_click_callback", &self.on_click.is_some())
            .finish()
    }
}

impl BoxResizeController {
    pub fn new(settings: &EditorSettings) -> EditorResult<Self> {
        settings.validate()?;
        Ok(Self {
            settings: settings.clone(),
            session: ResizeSession::default(),
            hovered: None,
            drag: None,
            active: false,
            on_click: None,
        })
    }

    pub fn activate(&mut self) {
        log::debug!("Box resize activated.");
        self.active = true;
        self.clear();
    }

    /// Stops mid drag if needed, the model keeps whatever was last applied.
    pub fn deactivate(&mut self) {
        log::debug!("Box resize deactivated.");
        self.active = false;
        self.clear();
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Called with whether a click without drag landed on the box.
    pub fn set_click_callback(&mut self, callback: impl FnMut(bool) + 'static) {
        self.on_click = Some(Box::new(callback));
    }

    pub fn clear_click_callback(&mut self) {
        self.on_click = None;
    }

    pub fn session(&self) -> &ResizeSession {
        &self.session
    }

    pub fn hovered_face(&self) -> Option<FaceId> {
        self.hovered.map(|hit| hit.face)
    }

    pub fn hovered(&self) -> Option<&FaceHit> {
        self.hovered.as_ref()
    }

    /// Where to draw the drag handle, if a face is armed.
    pub fn handle_position(&self) -> Option<Vector3<f64>> {
        self.hovered.map(|hit| hit.center)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn handle_event(
        &mut self,
        model: &mut OrientedBoxModel,
        event: &PointerEvent,
        scene: &dyn SceneView,
    ) -> EditorResult<()> {
        if !self.active {
            return Ok(());
        }
        let ray = scene.pick_ray(&event.position);

        match event.kind {
            PointerEventKind::Move => {
                if self.drag.is_none() {
                    self.update_hover(model, &ray, scene)?;
                }
            }
            PointerEventKind::Click => {
                self.update_hover(model, &ray, scene)?;
                let hit = self.hovered.is_some();
                if let Some(on_click) = self.on_click.as_mut() {
                    on_click(hit);
                }
            }
            PointerEventKind::DragStart => {
                if model.is_empty() {
                    log::warn!("Face drag started while no box is loaded.");
                }
                self.update_hover(model, &ray, scene)?;
                self.start_drag(model, &ray, event)?;
            }
            PointerEventKind::Drag => {
                self.update_drag(model, &ray)?;
            }
            PointerEventKind::DragEnd => {
                if self.drag.take().is_some() {
                    log::debug!("Face drag ended.");
                }
                self.session.resizing_face = None;
            }
            PointerEventKind::DoubleClick => {
                log::trace!("Box resize ignores double clicks.");
            }
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.session = ResizeSession::default();
        self.hovered = None;
        self.drag = None;
    }

    /// Picks the face nearest to the viewpoint among the ones `ray` passes through.
    fn update_hover(
        &mut self,
        model: &OrientedBoxModel,
        ray: &Ray,
        scene: &dyn SceneView,
    ) -> EditorResult<()> {
        if model.is_empty() {
            self.hovered = None;
            return Ok(());
        }
        let viewpoint = scene.camera().viewpoint;

        let mut min_d = f64::INFINITY;
        let mut nearest = None;
        for polygon in create_face_polygons(&model.get_box()?) {
            let Some(point) = polygon.intersect_ray(&ray.origin, &ray.dir) else {
                continue;
            };
            let d = (point - viewpoint).norm();
            if d < min_d {
                min_d = d;
                nearest = Some(FaceHit {
                    face: polygon.id,
                    point,
                    center: polygon.center(),
                });
            }
        }

        if self.hovered.map(|hit| hit.face) != nearest.map(|hit| hit.face) {
            log::trace!("Hovered face is now {:?}.", nearest.map(|hit| hit.face));
        }
        self.hovered = nearest;
        Ok(())
    }

    fn start_drag(
        &mut self,
        model: &OrientedBoxModel,
        ray: &Ray,
        event: &PointerEvent,
    ) -> EditorResult<()> {
        let Some(hit) = self.hovered else {
            log::trace!("Drag started off the box.");
            return Ok(());
        };

        if event.modifiers.is_held(self.settings.rotate_modifier) {
            let center = model.get_xy_center()?;
            let axis = model.directions()?[2];
            let grab = math::ray_plane_intersection(&ray.origin, &ray.dir, &axis, &center)
                .unwrap_or(hit.point);
            let last_arm = math::project_point_on_plane(&grab, &center, &axis) - center;
            log::debug!("Rotating box from face {}.", hit.face);
            self.drag = Some(DragMode::Rotate {
                center,
                axis,
                last_arm,
            });
            return Ok(());
        }

        if event.modifiers.is_held(self.settings.translate_modifier) {
            log::debug!("Moving box from face {}.", hit.face);
            self.drag = Some(DragMode::Translate {
                plane_point: hit.point,
                plane_normal: self.settings.frame.up(),
                last_hit: hit.point,
            });
            return Ok(());
        }

        let face = hit.face;
        let axis = face.axis();
        let interval = model.get_interval(axis)?;
        self.session = ResizeSession {
            resizing_face: Some(face),
            valid_interval: valid_interval(
                face,
                interval,
                self.settings.min_width,
                self.settings.max_width,
            ),
        };

        let line_point = hit.center;
        let line_dir = (hit.center - model.get_box()?.center()).normalize();
        let face_distance = model.calculate_distance(axis, &hit.center)?;
        let grab_offset =
            match math::closest_point_on_line_to_ray(&line_point, &line_dir, &ray.origin, &ray.dir)
            {
                Some(grab) => face_distance - model.calculate_distance(axis, &grab)?,
                None => 0.0,
            };

        log::debug!(
            "Resizing face {} within [{}, {}].",
            face,
            self.session.valid_interval[0],
            self.session.valid_interval[1]
        );
        self.drag = Some(DragMode::Resize {
            face,
            line_point,
            line_dir,
            grab_offset,
        });
        Ok(())
    }

    fn update_drag(&mut self, model: &mut OrientedBoxModel, ray: &Ray) -> EditorResult<()> {
        let Some(drag) = self.drag.as_mut() else {
            return Ok(());
        };

        match drag {
            DragMode::Resize {
                face,
                line_point,
                line_dir,
                grab_offset,
            } => {
                let Some(grab) =
                    math::closest_point_on_line_to_ray(line_point, line_dir, &ray.origin, &ray.dir)
                else {
                    return Ok(());
                };
                let axis = face.axis();
                let [lo, hi] = self.session.valid_interval;
                let distance = (model.calculate_distance(axis, &grab)? + *grab_offset).clamp(lo, hi);
                log::trace!("Face {} dragged to {}.", face, distance);
                if face.is_max() {
                    model.set_interval(axis, None, Some(distance))?;
                } else {
                    model.set_interval(axis, Some(distance), None)?;
                }

                let face = *face;
                let polygon = &create_face_polygons(&model.get_box()?)[face.index()];
                if let Some(hovered) = self.hovered.as_mut() {
                    hovered.center = polygon.center();
                }
            }
            DragMode::Rotate {
                center,
                axis,
                last_arm,
            } => {
                let Some(hit) = math::ray_plane_intersection(&ray.origin, &ray.dir, axis, center)
                else {
                    return Ok(());
                };
                let arm = hit - *center;
                // A drag grabbed on the pivot has no direction yet, take the first one seen.
                if last_arm.norm() <= EPSILON {
                    *last_arm = arm;
                    return Ok(());
                }
                // Too close to the pivot to tell a direction.
                let Ok(degrees) = math::angle(last_arm, &arm, axis) else {
                    return Ok(());
                };
                model.rotate_around_z(center, degrees)?;
                *last_arm = arm;
                self.hovered = None;
            }
            DragMode::Translate {
                plane_point,
                plane_normal,
                last_hit,
            } => {
                let Some(hit) =
                    math::ray_plane_intersection(&ray.origin, &ray.dir, plane_normal, plane_point)
                else {
                    return Ok(());
                };
                model.translate(&(hit - *last_hit))?;
                *last_hit = hit;
                self.hovered = None;
            }
        }
        Ok(())
    }
}
