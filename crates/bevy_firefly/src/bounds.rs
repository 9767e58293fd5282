use bevy::prelude::*;

use crate::geometry::{VesselGeometry, box_corners};

/// Radius of the reference capsule the length heuristic is calibrated against.
pub const REFERENCE_RADIUS: f32 = 2.0;

/// How strongly the vessel size stretches the effect length.
pub const LENGTH_RADIUS_FACTOR: f32 = 0.3;

/// Bounding box of a vessel in vessel-local space.
///
/// A freshly created value is invalid: the min corner starts at `+inf` and the max
/// corner at `-inf`, so any included point makes it valid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VesselBounds {
    /// Componentwise minimum of every included point.
    pub min_corner: Vec3,
    /// Componentwise maximum of every included point.
    pub max_corner: Vec3,
    /// Box center.
    pub center: Vec3,
    /// Half the box size.
    pub extents: Vec3,
    /// Length of `extents`.
    pub radius: f32,
    /// Largest box dimension.
    pub max_size: f32,
    /// The eight box corners.
    pub corners: [Vec3; 8],
}

impl Default for VesselBounds {
    fn default() -> Self {
        Self {
            min_corner: Vec3::INFINITY,
            max_corner: Vec3::NEG_INFINITY,
            center: Vec3::ZERO,
            extents: Vec3::ZERO,
            radius: 0.0,
            max_size: 0.0,
            corners: [Vec3::ZERO; 8],
        }
    }
}

impl VesselBounds {
    /// Valid bounds spanning the two corners.
    pub fn from_min_max(min_corner: Vec3, max_corner: Vec3) -> Self {
        let mut bounds = Self {
            min_corner,
            max_corner,
            ..default()
        };
        bounds.derive();
        bounds
    }

    /// Whether at least one point was included.
    pub fn is_valid(&self) -> bool {
        self.min_corner.cmple(self.max_corner).all()
    }

    fn include(&mut self, point: Vec3) {
        self.min_corner = self.min_corner.min(point);
        self.max_corner = self.max_corner.max(point);
    }

    fn derive(&mut self) {
        let size = (self.max_corner - self.min_corner).abs();
        self.extents = size * 0.5;
        self.center = self.min_corner + self.extents;
        self.radius = self.extents.length();
        self.max_size = size.max_element();
        self.corners = box_corners(self.center, self.extents);
    }

    /// Size-dependent stretch applied to the trail length.
    pub fn base_length_multiplier(&self) -> f32 {
        base_length_multiplier(self.radius)
    }
}

/// A reference-sized vessel (radius 2) yields exactly 1.
pub fn base_length_multiplier(radius: f32) -> f32 {
    1.0 + (radius / REFERENCE_RADIUS - 1.0) * LENGTH_RADIUS_FACTOR
}

/// Computes the vessel-local bounds from every usable mesh of the vessel.
///
/// With `apply_exclusion_filter` set, parts that fail the bound compatibility rule are
/// skipped. Returns `None` when no mesh contributed.
pub fn compute_bounds(vessel: &VesselGeometry, apply_exclusion_filter: bool) -> Option<VesselBounds> {
    let world_to_vessel = vessel.to_world.inverse();
    let mut bounds = VesselBounds::default();

    for part in &vessel.parts {
        if apply_exclusion_filter && !part.is_bound_compatible() {
            continue;
        }

        for mesh in part.meshes.iter().filter(|mesh| mesh.is_usable()) {
            // mesh -> world -> vessel
            let to_vessel = world_to_vessel * mesh.to_world;
            for corner in mesh.local_bounds.corners() {
                let point = to_vessel.transform_point3(corner);
                if point.is_finite() {
                    bounds.include(point);
                }
            }
        }
    }

    if !bounds.is_valid() {
        return None;
    }

    bounds.derive();
    Some(bounds)
}

/// Prefers the filtered bounds, retrying without the filter before giving up.
pub fn compute_bounds_with_fallback(vessel: &VesselGeometry) -> Option<VesselBounds> {
    compute_bounds(vessel, true).or_else(|| {
        debug!("Recalculating invalid vessel bounds without the exclusion filter");
        compute_bounds(vessel, false)
    })
}
