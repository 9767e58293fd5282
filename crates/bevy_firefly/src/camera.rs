use bevy::prelude::*;

use crate::bounds::VesselBounds;
use crate::geometry::VesselGeometry;

/// Smallest orthographic size, for tiny vessels.
pub const MIN_ORTHO_SIZE: f32 = 0.3;
/// Largest orthographic size.
pub const MAX_ORTHO_SIZE: f32 = 2000.0;
/// Closest far clip plane.
pub const MIN_FAR_CLIP: f32 = 1.0;
/// Farthest far clip plane.
pub const MAX_FAR_CLIP: f32 = 1000.0;

/// How far in front of the vessel the camera sits, relative to the bounds radius.
pub const CAMERA_DISTANCE_FACTOR: f32 = 1.1;

/// Placement of the orthographic camera that renders the airstream depth.
///
/// The camera sits upstream of the vessel and looks back along the flow so the
/// whole vessel fits in view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AirstreamFraming {
    /// Half height of the orthographic view.
    pub ortho_size: f32,
    /// Far clip plane distance.
    pub far_clip: f32,
    /// World-space camera position.
    pub position: Vec3,
    /// World-space bounds center the camera looks at.
    pub target: Vec3,
}

impl AirstreamFraming {
    /// Frames `bounds` from upstream. `local_flow` is the airflow direction in vessel space.
    pub fn new(bounds: &VesselBounds, vessel: &VesselGeometry, local_flow: Vec3) -> Self {
        let (ortho_size, far_clip) = projection_for_bounds(bounds);
        let distance = bounds.radius * CAMERA_DISTANCE_FACTOR;
        let local_position = bounds.center + local_flow * distance;

        Self {
            ortho_size,
            far_clip,
            position: vessel.local_to_world_point(local_position),
            target: vessel.local_to_world_point(bounds.center),
        }
    }

    /// Camera transform looking from `position` at `target`.
    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position).looking_at(self.target, Vec3::Y)
    }
}

/// Orthographic size and far clip plane that fit the vessel.
pub fn projection_for_bounds(bounds: &VesselBounds) -> (f32, f32) {
    let extent = bounds.extents.length();
    (
        extent.clamp(MIN_ORTHO_SIZE, MAX_ORTHO_SIZE),
        (extent * 2.0).clamp(MIN_FAR_CLIP, MAX_FAR_CLIP),
    )
}
