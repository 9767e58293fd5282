use bevy::prelude::*;
use bevy::math::Affine3A;
use bitflags::bitflags;

/// Render layer whose meshes never contribute to bounds or envelopes.
pub const EXCLUDED_LAYER: u32 = 1;

/// Name given to meshes that explicitly define a part's effect envelope.
pub const ENVELOPE_MARKER_NAME: &str = "atmofx_envelope";

/// Tag carried by hidden marker meshes. Tagged meshes only count as markers when
/// their name also contains [`ENVELOPE_MARKER_NAME`].
pub const ENVELOPE_MARKER_TAG: &str = "Icon_Hidden";

bitflags! {
    /// Modules attached to a part that change how it is treated by the effect.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PartModules: u32 {
        /// Deployable parachute. Excluded from bounds so a deployed canopy
        /// doesn't stretch the whole effect.
        const PARACHUTE = 1 << 0;
        /// Projected decal.
        const CONFORMAL_DECAL = 1 << 1;
        /// Projected flag.
        const CONFORMAL_FLAG = 1 << 2;
        /// Projected text.
        const CONFORMAL_TEXT = 1 << 3;
        /// Landing gear or wheel.
        const WHEEL = 1 << 4;
    }
}

impl PartModules {
    /// Every projected surface module.
    pub const CONFORMAL: Self = Self::CONFORMAL_DECAL
        .union(Self::CONFORMAL_FLAG)
        .union(Self::CONFORMAL_TEXT);
}

/// Opaque handle to a renderable surface owned by the host renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

/// Axis-aligned box in a mesh's local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshBounds {
    /// Box center.
    pub center: Vec3,
    /// Half the box size on each axis.
    pub half_extents: Vec3,
}

impl MeshBounds {
    /// Box around `center`.
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    /// Box spanning the two corners.
    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self {
            center: (min + max) * 0.5,
            half_extents: (max - min) * 0.5,
        }
    }

    /// The eight box corners, in local space.
    pub fn corners(&self) -> [Vec3; 8] {
        box_corners(self.center, self.half_extents)
    }
}

pub(crate) fn box_corners(center: Vec3, extents: Vec3) -> [Vec3; 8] {
    let Vec3 { x, y, z } = extents;
    [
        center + Vec3::new(x, y, z),
        center + Vec3::new(x, y, -z),
        center + Vec3::new(-x, y, z),
        center + Vec3::new(-x, y, -z),
        center + Vec3::new(x, -y, z),
        center + Vec3::new(x, -y, -z),
        center + Vec3::new(-x, -y, z),
        center + Vec3::new(-x, -y, -z),
    ]
}

/// How a mesh is rendered. Static meshes without mesh data can't contribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshKind {
    /// Regular mesh renderer.
    Static {
        /// Whether a mesh is assigned to the renderer.
        has_mesh: bool,
    },
    /// Skinned mesh renderer. Always has mesh data.
    Skinned,
}

/// A renderable sub-mesh of a part, as reported by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshGeometry {
    /// Host handle of the rendered surface.
    pub surface: SurfaceId,
    /// Object name of the mesh.
    pub name: String,
    /// Optional object tag.
    pub tag: Option<String>,
    /// Inactive meshes are ignored.
    pub active: bool,
    /// Render layer, see [`EXCLUDED_LAYER`].
    pub layer: u32,
    /// Renderer kind.
    pub kind: MeshKind,
    /// Whether the object has a renderer at all.
    pub has_renderer: bool,
    /// Bounding box in mesh local space.
    pub local_bounds: MeshBounds,
    /// Mesh local space to world space.
    pub to_world: Affine3A,
    /// Scale relative to the parent object.
    pub local_scale: Vec3,
    /// Accumulated world-space scale.
    pub lossy_scale: Vec3,
}

impl MeshGeometry {
    /// An active static mesh on the default layer with an identity transform.
    pub fn new(surface: SurfaceId, name: impl Into<String>, local_bounds: MeshBounds) -> Self {
        Self {
            surface,
            name: name.into(),
            tag: None,
            active: true,
            layer: 0,
            kind: MeshKind::Static { has_mesh: true },
            has_renderer: true,
            local_bounds,
            to_world: Affine3A::IDENTITY,
            local_scale: Vec3::ONE,
            lossy_scale: Vec3::ONE,
        }
    }

    /// Sets the world transform and derives the world-space scale from it.
    pub fn with_transform(mut self, to_world: Affine3A) -> Self {
        let (scale, _, _) = to_world.to_scale_rotation_translation();
        self.to_world = to_world;
        self.lossy_scale = scale;
        self
    }

    /// Sets the parent-relative scale.
    pub fn with_local_scale(mut self, local_scale: Vec3) -> Self {
        self.local_scale = local_scale;
        self
    }

    /// Moves the mesh to another render layer.
    pub fn with_layer(mut self, layer: u32) -> Self {
        self.layer = layer;
        self
    }

    /// Tags the mesh.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Sets the renderer kind.
    pub fn with_kind(mut self, kind: MeshKind) -> Self {
        self.kind = kind;
        self
    }

    /// Marks the mesh as inactive.
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Skinned meshes always have data, static ones only with a mesh assigned.
    pub fn has_mesh_data(&self) -> bool {
        match self.kind {
            MeshKind::Static { has_mesh } => has_mesh,
            MeshKind::Skinned => true,
        }
    }

    /// Whether the mesh sits on [`EXCLUDED_LAYER`].
    pub fn is_on_excluded_layer(&self) -> bool {
        self.layer == EXCLUDED_LAYER
    }

    /// Whether this mesh may contribute geometry at all.
    pub fn is_usable(&self) -> bool {
        self.active && !self.is_on_excluded_layer() && self.has_mesh_data()
    }

    /// Whether the mesh explicitly defines the envelope of its part.
    pub fn is_envelope_marker(&self) -> bool {
        if self.name == ENVELOPE_MARKER_NAME {
            return true;
        }
        self.tag.as_deref() == Some(ENVELOPE_MARKER_TAG)
            && self.name.contains(ENVELOPE_MARKER_NAME)
    }
}

/// A rigid sub-component of a vessel.
#[derive(Debug, Clone, PartialEq)]
pub struct PartGeometry {
    /// Part identifier, e.g. `mk1pod.v2`.
    pub name: String,
    /// Modules relevant to the effect.
    pub modules: PartModules,
    /// Renderable sub-meshes, in hierarchy order.
    pub meshes: Vec<MeshGeometry>,
}

impl PartGeometry {
    /// A part without modules or meshes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modules: PartModules::empty(),
            meshes: Vec::new(),
        }
    }

    /// Sets the part modules.
    pub fn with_modules(mut self, modules: PartModules) -> Self {
        self.modules = modules;
        self
    }

    /// Appends a mesh.
    pub fn with_mesh(mut self, mesh: MeshGeometry) -> Self {
        self.meshes.push(mesh);
        self
    }

    /// Key used to look up per-part overrides.
    pub fn config_name(&self) -> String {
        self.name.replace('.', "_")
    }

    /// Projected decals, flags and text never take part in the envelope.
    pub fn is_envelope_compatible(&self) -> bool {
        !self.modules.intersects(PartModules::CONFORMAL)
    }

    /// Bounds additionally skip parachutes.
    pub fn is_bound_compatible(&self) -> bool {
        self.is_envelope_compatible() && !self.modules.contains(PartModules::PARACHUTE)
    }

    /// Landing gear carry a flare mesh that shouldn't be wrapped by the effect.
    pub fn is_wheel_flare(&self, mesh: &MeshGeometry) -> bool {
        self.modules.contains(PartModules::WHEEL) && mesh.name.eq_ignore_ascii_case("flare")
    }

    /// Grappling devices and claws author their scale on the mesh itself.
    pub fn uses_local_scale(&self) -> bool {
        self.name.contains("GrapplingDevice") || self.name.contains("smallClaw")
    }
}

/// The geometry of a whole vessel, refreshed by the host whenever it changes.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct VesselGeometry {
    /// Vessel local space to world space.
    pub to_world: Affine3A,
    /// Parts of the vessel.
    pub parts: Vec<PartGeometry>,
}

impl VesselGeometry {
    /// A vessel placed at `to_world`.
    pub fn new(to_world: Affine3A, parts: Vec<PartGeometry>) -> Self {
        Self { to_world, parts }
    }

    /// Number of parts.
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// World-space forward axis of the vessel.
    pub fn forward(&self) -> Vec3 {
        self.to_world
            .transform_vector3(Vec3::NEG_Z)
            .normalize_or_zero()
    }

    /// Normalized world direction in vessel space.
    pub fn world_to_local_direction(&self, direction: Vec3) -> Vec3 {
        self.to_world
            .inverse()
            .transform_vector3(direction)
            .normalize_or_zero()
    }

    /// Vessel-space point in world space.
    pub fn local_to_world_point(&self, point: Vec3) -> Vec3 {
        self.to_world.transform_point3(point)
    }
}
