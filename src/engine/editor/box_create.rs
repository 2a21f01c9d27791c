use nalgebra::Vector3;
use strum_macros::Display;

use crate::{
    common::{
        error::{EditorError, EditorResult},
        geometry::obb::OrientedBox,
        math,
        ray::Ray,
    },
    consts::math::EPSILON,
    engine::{
        editor::editor_events::{self, BoxEvent, BoxEvents},
        input::pointer::{Modifiers, PointerEvent, PointerEventKind},
        scene::SceneView,
    },
    settings::EditorSettings,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CreationState {
    Idle,
    CornerDefined,
    WidthDefined,
    PlaneDefined,
}

/// Horizontal direction of the first edge and the horizontal direction perpendicular to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Heading {
    pub orientation: Vector3<f64>,
    pub complement: Vector3<f64>,
}

/// The in-progress box. Each variant holds what the clicks so far have fixed plus the
/// quantity the pointer is currently previewing.
#[derive(Debug, Clone, PartialEq)]
pub enum CreationSession {
    Idle {
        first_corner: Option<Vector3<f64>>,
    },
    CornerDefined {
        first_corner: Vector3<f64>,
        heading: Option<Heading>,
        width: f64,
    },
    WidthDefined {
        first_corner: Vector3<f64>,
        heading: Heading,
        width: f64,
        /// Signed along `heading.complement`.
        depth: f64,
    },
    PlaneDefined {
        first_corner: Vector3<f64>,
        heading: Heading,
        width: f64,
        depth: f64,
        /// Signed along up.
        height: f64,
        symmetric: bool,
    },
}

impl Default for CreationSession {
    fn default() -> Self {
        CreationSession::Idle { first_corner: None }
    }
}

impl CreationSession {
    pub fn state(&self) -> CreationState {
        match self {
            CreationSession::Idle { .. } => CreationState::Idle,
            CreationSession::CornerDefined { .. } => CreationState::CornerDefined,
            CreationSession::WidthDefined { .. } => CreationState::WidthDefined,
            CreationSession::PlaneDefined { .. } => CreationState::PlaneDefined,
        }
    }

    pub fn first_corner(&self) -> Option<Vector3<f64>> {
        match self {
            CreationSession::Idle { first_corner } => *first_corner,
            CreationSession::CornerDefined { first_corner, .. }
            | CreationSession::WidthDefined { first_corner, .. }
            | CreationSession::PlaneDefined { first_corner, .. } => Some(*first_corner),
        }
    }

    /// End of the first edge, `first_corner + orientation * width`.
    pub fn second_corner(&self) -> EditorResult<Vector3<f64>> {
        match self {
            CreationSession::CornerDefined {
                first_corner,
                heading: Some(heading),
                width,
            }
            | CreationSession::WidthDefined {
                first_corner,
                heading,
                width,
                ..
            }
            | CreationSession::PlaneDefined {
                first_corner,
                heading,
                width,
                ..
            } => Ok(first_corner + heading.orientation * *width),
            _ => Err(EditorError::state(format!(
                "no width has been previewed yet in state {}",
                self.state()
            ))),
        }
    }

    /// The base corner across from the first one, where the height is measured.
    pub fn third_corner(&self) -> EditorResult<Vector3<f64>> {
        match self {
            CreationSession::WidthDefined {
                first_corner,
                heading,
                width,
                depth,
            }
            | CreationSession::PlaneDefined {
                first_corner,
                heading,
                width,
                depth,
                ..
            } => Ok(first_corner + heading.orientation * *width + heading.complement * *depth),
            _ => Err(EditorError::state(format!(
                "the width isn't confirmed yet in state {}",
                self.state()
            ))),
        }
    }
}

/// Geometry for drawing the session as it stands.
#[derive(Debug, Clone, PartialEq)]
pub enum CreationPreview {
    None,
    Point(Vector3<f64>),
    Segment([Vector3<f64>; 2]),
    Quad([Vector3<f64>; 4]),
    Box(OrientedBox),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationInputKind {
    Move,
    Click,
}

/// A pointer event with the host queries already resolved, so transitions stay pure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreationInput {
    pub kind: CreationInputKind,
    /// Only resolved while idle, the other states intersect `ray` with their own planes.
    pub surface_hit: Option<Vector3<f64>>,
    pub ray: Ray,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CreationEffect {
    Advanced(CreationState),
    Created(OrientedBox),
}

/// Computes the session after `input`. Moves only update the previewed quantity, clicks
/// first update it from the click position and then advance if it is non zero.
pub fn transition(
    session: &CreationSession,
    input: &CreationInput,
    settings: &EditorSettings,
) -> EditorResult<(CreationSession, Vec<CreationEffect>)> {
    settings.validate()?;
    let previewed = update_preview(session, input, settings);
    if input.kind == CreationInputKind::Move {
        return Ok((previewed, Vec::new()));
    }

    let next = match previewed {
        CreationSession::Idle {
            first_corner: Some(first_corner),
        } => CreationSession::CornerDefined {
            first_corner,
            heading: None,
            width: 0.0,
        },
        CreationSession::CornerDefined {
            first_corner,
            heading: Some(heading),
            width,
        } if is_nonzero(width) => CreationSession::WidthDefined {
            first_corner,
            heading,
            width,
            depth: 0.0,
        },
        CreationSession::WidthDefined {
            first_corner,
            heading,
            width,
            depth,
        } if is_nonzero(depth) => CreationSession::PlaneDefined {
            first_corner,
            heading,
            width,
            depth,
            height: 0.0,
            symmetric: input.modifiers.is_held(settings.symmetric_modifier),
        },
        CreationSession::PlaneDefined {
            first_corner,
            heading,
            width,
            depth,
            height,
            ..
        } if is_nonzero(height) => {
            let symmetric = input.modifiers.is_held(settings.symmetric_modifier);
            let obb = build_box(
                &first_corner,
                &heading,
                width,
                depth,
                height,
                symmetric,
                settings,
            )?;
            return Ok((
                CreationSession::default(),
                vec![
                    CreationEffect::Created(obb),
                    CreationEffect::Advanced(CreationState::Idle),
                ],
            ));
        }
        // Nothing to confirm yet.
        unchanged => return Ok((unchanged, Vec::new())),
    };

    let state = next.state();
    Ok((next, vec![CreationEffect::Advanced(state)]))
}

/// Previews within rounding noise of zero can't be confirmed.
fn is_nonzero(value: f64) -> bool {
    value.abs() > EPSILON
}

fn update_preview(
    session: &CreationSession,
    input: &CreationInput,
    settings: &EditorSettings,
) -> CreationSession {
    let up = settings.frame.up();
    let cap = settings.max_width;
    let mut session = session.clone();
    match &mut session {
        CreationSession::Idle { first_corner } => {
            if let Some(hit) = input.surface_hit {
                *first_corner = Some(hit);
            }
        }
        CreationSession::CornerDefined {
            first_corner,
            heading,
            width,
        } => {
            if let Some(hit) = intersect_ray(&input.ray, &up, first_corner) {
                let edge = hit - *first_corner;
                let length = edge.norm();
                if length <= EPSILON {
                    *width = 0.0;
                } else {
                    let orientation = edge / length;
                    *heading = Some(Heading {
                        orientation,
                        complement: orientation.cross(&up).normalize(),
                    });
                    *width = length.min(cap);
                }
            }
        }
        CreationSession::WidthDefined {
            first_corner,
            heading,
            depth,
            ..
        } => {
            if let Some(hit) = intersect_ray(&input.ray, &up, first_corner) {
                *depth = math::distance_along_direction(&hit, first_corner, &heading.complement)
                    .clamp(-cap, cap);
            }
        }
        CreationSession::PlaneDefined {
            first_corner,
            heading,
            width,
            depth,
            height,
            symmetric,
        } => {
            *symmetric = input.modifiers.is_held(settings.symmetric_modifier);
            let third = *first_corner
                + heading.orientation * *width
                + heading.complement * *depth;
            // Vertical plane facing the viewer as much as a vertical plane can.
            let mut normal = math::project_point_on_plane(&input.ray.dir, &Vector3::zeros(), &up);
            if normal.norm() <= EPSILON {
                normal = heading.complement;
            }
            // Symmetric boxes extend |height| both ways, so the total stays within the cap.
            let height_cap = if *symmetric { cap / 2.0 } else { cap };
            if let Some(hit) = intersect_ray(&input.ray, &normal, &third) {
                *height = math::distance_along_direction(&hit, &third, &up)
                    .clamp(-height_cap, height_cap);
            } else {
                *height = height.clamp(-height_cap, height_cap);
            }
        }
    }
    session
}

fn intersect_ray(
    ray: &Ray,
    plane_normal: &Vector3<f64>,
    plane_point: &Vector3<f64>,
) -> Option<Vector3<f64>> {
    math::ray_plane_intersection(&ray.origin, &ray.dir, plane_normal, plane_point)
}

/// The local axis receiving `width` depends on which side of the first edge the depth went,
/// so the sizes stay positive and the first corner stays the local origin.
fn build_box(
    first_corner: &Vector3<f64>,
    heading: &Heading,
    width: f64,
    depth: f64,
    height: f64,
    symmetric: bool,
    settings: &EditorSettings,
) -> EditorResult<OrientedBox> {
    let frame = &settings.frame;
    let forward_angle = math::angle(&frame.north(), &heading.orientation, &frame.up())?;

    // Positive depth runs along the complement, which is the first edge turned -90 degrees,
    // so it becomes local x and the first edge local y. Negative depth is the other side.
    let (azimuth, size_x, size_y) = if depth < 0.0 {
        (forward_angle + 90.0, width, depth.abs())
    } else {
        (forward_angle, depth, width)
    };

    let half_or_full = height.abs();
    let offset_z = if height < 0.0 || symmetric {
        -half_or_full
    } else {
        0.0
    };
    let size_z = if symmetric {
        2.0 * half_or_full
    } else {
        half_or_full
    };

    Ok(OrientedBox::new(
        *first_corner,
        azimuth,
        Vector3::new(0.0, 0.0, offset_z),
        Vector3::new(size_x, size_y, size_z),
        frame,
    ))
}

/// Builds a new box from four confirmed clicks.
#[derive(Debug)]
pub struct BoxCreateController {
    settings: EditorSettings,
    events: BoxEvents,
    session: CreationSession,
    active: bool,
}

impl BoxCreateController {
    pub fn new(settings: &EditorSettings, events: BoxEvents) -> EditorResult<Self> {
        settings.validate()?;
        Ok(Self {
            settings: settings.clone(),
            events,
            session: CreationSession::default(),
            active: false,
        })
    }

    pub fn activate(&mut self) {
        log::debug!("Box creation activated.");
        self.active = true;
        self.session = CreationSession::default();
    }

    pub fn deactivate(&mut self) {
        log::debug!("Box creation deactivated in state {}.", self.session.state());
        self.active = false;
        self.session = CreationSession::default();
    }

    /// Drops whatever has been clicked so far and starts over.
    pub fn cancel(&mut self) {
        self.session = CreationSession::default();
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn state(&self) -> CreationState {
        self.session.state()
    }

    pub fn session(&self) -> &CreationSession {
        &self.session
    }

    pub fn preview(&self) -> EditorResult<CreationPreview> {
        let preview = match &self.session {
            CreationSession::Idle { first_corner } => first_corner
                .map(CreationPreview::Point)
                .unwrap_or(CreationPreview::None),
            CreationSession::CornerDefined {
                first_corner,
                heading,
                width,
            } => {
                if heading.is_some() && is_nonzero(*width) {
                    CreationPreview::Segment([*first_corner, self.session.second_corner()?])
                } else {
                    CreationPreview::Point(*first_corner)
                }
            }
            CreationSession::WidthDefined {
                first_corner,
                heading,
                depth,
                ..
            } => {
                let second = self.session.second_corner()?;
                let across = heading.complement * *depth;
                CreationPreview::Quad([*first_corner, second, second + across, first_corner + across])
            }
            CreationSession::PlaneDefined {
                first_corner,
                heading,
                width,
                depth,
                height,
                symmetric,
            } => CreationPreview::Box(build_box(
                first_corner,
                heading,
                *width,
                *depth,
                *height,
                *symmetric,
                &self.settings,
            )?),
        };
        Ok(preview)
    }

    /// Feeds one pointer event through the creation sequence. Returns the box when this
    /// event completed it, the box is also published on the created channel.
    pub fn handle_event(
        &mut self,
        event: &PointerEvent,
        scene: &dyn SceneView,
    ) -> EditorResult<Option<OrientedBox>> {
        if !self.active {
            return Ok(None);
        }
        let kind = match event.kind {
            PointerEventKind::Move => CreationInputKind::Move,
            PointerEventKind::Click => CreationInputKind::Click,
            other => {
                log::trace!("Box creation ignores {:?} events.", other);
                return Ok(None);
            }
        };

        let surface_hit = if self.session.state() == CreationState::Idle {
            match scene.cast_to_surface(&event.position) {
                Ok(hit) => Some(hit),
                Err(err) => {
                    log::trace!("No first corner preview: {}", err);
                    None
                }
            }
        } else {
            None
        };
        let input = CreationInput {
            kind,
            surface_hit,
            ray: scene.pick_ray(&event.position),
            modifiers: event.modifiers,
        };

        let (next, effects) = transition(&self.session, &input, &self.settings)?;
        self.session = next;

        let mut created = None;
        for effect in effects {
            match effect {
                CreationEffect::Advanced(state) => {
                    log::debug!("Box creation advanced to {}.", state);
                }
                CreationEffect::Created(obb) => {
                    log::debug!("Box created: {:?}", obb);
                    editor_events::emit(&self.events, BoxEvent::Created(obb.clone()));
                    created = Some(obb);
                }
            }
        }
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn settings() -> EditorSettings {
        EditorSettings::default()
    }

    fn heading_east() -> Heading {
        Heading {
            orientation: Vector3::x(),
            complement: Vector3::x().cross(&Vector3::z()),
        }
    }

    fn input(kind: CreationInputKind, ray: Ray) -> CreationInput {
        CreationInput {
            kind,
            surface_hit: None,
            ray,
            modifiers: Modifiers::empty(),
        }
    }

    #[test]
    fn idle_click_without_corner_stays_idle() {
        let (next, effects) = transition(
            &CreationSession::default(),
            &input(CreationInputKind::Click, Ray::new(Vector3::z(), -Vector3::z())),
            &settings(),
        )
        .unwrap();
        assert_eq!(next.state(), CreationState::Idle);
        assert!(effects.is_empty());
    }

    #[test]
    fn move_never_advances() {
        let mut move_input = input(CreationInputKind::Move, Ray::new(Vector3::z(), -Vector3::z()));
        move_input.surface_hit = Some(Vector3::new(1.0, 2.0, 0.0));
        let (next, effects) = transition(&CreationSession::default(), &move_input, &settings()).unwrap();
        assert_eq!(
            next,
            CreationSession::Idle {
                first_corner: Some(Vector3::new(1.0, 2.0, 0.0))
            }
        );
        assert!(effects.is_empty());
    }

    #[test]
    fn width_preview_is_capped() {
        let session = CreationSession::CornerDefined {
            first_corner: Vector3::zeros(),
            heading: None,
            width: 0.0,
        };
        let far = Ray::new(Vector3::new(50_000.0, 0.0, 10.0), -Vector3::z());
        let (next, _) = transition(&session, &input(CreationInputKind::Move, far), &settings()).unwrap();
        let CreationSession::CornerDefined { heading, width, .. } = next else {
            panic!("Should still be defining the width.");
        };
        assert_eq!(width, settings().max_width);
        assert_relative_eq!(heading.unwrap().orientation, Vector3::x());
        assert_relative_eq!(heading.unwrap().complement, -Vector3::y());
    }

    fn created_height(modifiers: Modifiers) -> f64 {
        let session = CreationSession::PlaneDefined {
            first_corner: Vector3::zeros(),
            heading: heading_east(),
            width: 5.0,
            depth: 3.0,
            height: 0.0,
            symmetric: false,
        };
        // Horizontal ray hitting the height plane far above the third corner.
        let mut click = input(
            CreationInputKind::Click,
            Ray::new(Vector3::new(5.0, -100.0, 50_000.0), Vector3::y()),
        );
        click.modifiers = modifiers;
        let (_, effects) = transition(&session, &click, &settings()).unwrap();
        let Some(CreationEffect::Created(obb)) = effects.first() else {
            panic!("Final click should create a box.");
        };
        obb.size.z
    }

    #[test]
    fn height_is_capped_to_max_width() {
        let max_width = settings().max_width;
        assert_relative_eq!(created_height(Modifiers::empty()), max_width);
        assert_relative_eq!(created_height(settings().symmetric_modifier), max_width);
    }

    #[test]
    fn inverted_limits_fail_the_transition() {
        let settings = EditorSettings {
            min_width: 5.0,
            max_width: 1.0,
            ..Default::default()
        };
        let click = input(CreationInputKind::Click, Ray::new(Vector3::z(), -Vector3::z()));
        assert!(matches!(
            transition(&CreationSession::default(), &click, &settings),
            Err(EditorError::Settings(_))
        ));
        assert!(BoxCreateController::new(&settings, BoxEvents::new()).is_err());
    }

    #[test]
    fn missed_plane_keeps_last_preview() {
        let session = CreationSession::WidthDefined {
            first_corner: Vector3::zeros(),
            heading: heading_east(),
            width: 5.0,
            depth: 2.0,
        };
        // Pointing at the sky never reaches the base plane.
        let sky = Ray::new(Vector3::new(0.0, 0.0, 10.0), Vector3::z());
        let (next, _) = transition(&session, &input(CreationInputKind::Move, sky), &settings()).unwrap();
        assert_eq!(next, session);
    }

    #[test]
    fn zero_depth_click_does_not_advance() {
        let session = CreationSession::WidthDefined {
            first_corner: Vector3::zeros(),
            heading: heading_east(),
            width: 5.0,
            depth: 0.0,
        };
        // Straight down onto the first edge, so the depth stays zero.
        let ray = Ray::new(Vector3::new(2.0, 0.0, 10.0), -Vector3::z());
        let (next, effects) = transition(&session, &input(CreationInputKind::Click, ray), &settings()).unwrap();
        assert_eq!(next.state(), CreationState::WidthDefined);
        assert!(effects.is_empty());
    }

    #[test]
    fn later_corners_require_earlier_clicks() {
        let idle = CreationSession::Idle {
            first_corner: Some(Vector3::zeros()),
        };
        assert!(matches!(idle.second_corner(), Err(EditorError::State(_))));
        assert!(matches!(idle.third_corner(), Err(EditorError::State(_))));

        let corner = CreationSession::CornerDefined {
            first_corner: Vector3::zeros(),
            heading: Some(heading_east()),
            width: 5.0,
        };
        assert_relative_eq!(corner.second_corner().unwrap(), Vector3::new(5.0, 0.0, 0.0));
        assert!(corner.third_corner().is_err());
    }

    #[test]
    fn build_box_maps_depth_sign_to_axes() {
        let heading = heading_east();
        let corner = Vector3::new(1.0, 1.0, 0.0);

        // Depth along the complement (south here) puts the depth on local x.
        let positive = build_box(&corner, &heading, 5.0, 3.0, 2.0, false, &settings()).unwrap();
        assert_relative_eq!(positive.size, Vector3::new(3.0, 5.0, 2.0));
        assert_relative_eq!(positive.corner(7), corner, epsilon = 1e-9);
        assert!(positive.contains(&(corner + Vector3::new(4.0, -2.0, 1.0))));

        let negative = build_box(&corner, &heading, 5.0, -3.0, 2.0, false, &settings()).unwrap();
        assert_relative_eq!(negative.size, Vector3::new(5.0, 3.0, 2.0));
        assert_relative_eq!(negative.azimuth, 0.0, epsilon = 1e-9);
        assert!(negative.contains(&(corner + Vector3::new(4.0, 2.0, 1.0))));
    }

    #[test]
    fn build_box_height_modes() {
        let heading = heading_east();
        let below = build_box(&Vector3::zeros(), &heading, 5.0, 3.0, -2.0, false, &settings()).unwrap();
        assert_relative_eq!(below.offset.z, -2.0);
        assert_relative_eq!(below.size.z, 2.0);

        let symmetric = build_box(&Vector3::zeros(), &heading, 5.0, 3.0, 2.0, true, &settings()).unwrap();
        assert_relative_eq!(symmetric.offset.z, -2.0);
        assert_relative_eq!(symmetric.size.z, 4.0);
    }
}
