use bevy::prelude::*;

use crate::geometry::{MeshGeometry, PartGeometry, SurfaceId};

/// One surface the effect shader is drawn on.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeEntry {
    /// Config name of the owning part, used for color overrides.
    pub part_identifier: String,
    /// Surface the shell is drawn on.
    pub surface: SurfaceId,
    /// Reciprocal of the surface scale, so the shader can multiply instead of divide.
    pub model_scale: Vec3,
    /// Inflation of the shell beyond the surface.
    pub envelope_scale_factor: Vec3,
    /// Marker surfaces replace the original rendering of the surface.
    pub hides_source: bool,
}

/// Collects the envelope of every compatible part, in part order.
///
/// Entries are rebuilt from scratch on every call.
pub fn build_envelope(parts: &[PartGeometry], envelope_scale_factor: Vec3) -> Vec<EnvelopeEntry> {
    let mut entries = Vec::new();
    for part in parts.iter().filter(|part| part.is_envelope_compatible()) {
        build_part_envelope(part, envelope_scale_factor, &mut entries);
    }
    debug!(
        "Built {} envelope entries from {} parts",
        entries.len(),
        parts.len()
    );
    entries
}

fn build_part_envelope(part: &PartGeometry, scale_factor: Vec3, entries: &mut Vec<EnvelopeEntry>) {
    let identifier = part.config_name();

    let markers: Vec<&MeshGeometry> = part
        .meshes
        .iter()
        .filter(|mesh| mesh.is_envelope_marker())
        .collect();

    if !markers.is_empty() {
        debug!(
            "Part {} has a defined effect envelope, skipping mesh search",
            part.name
        );
        entries.extend(
            markers
                .into_iter()
                .filter(|mesh| mesh.active && mesh.has_mesh_data() && mesh.has_renderer)
                .map(|mesh| EnvelopeEntry {
                    part_identifier: identifier.clone(),
                    surface: mesh.surface,
                    model_scale: Vec3::ONE,
                    envelope_scale_factor: Vec3::ONE,
                    hides_source: true,
                }),
        );
        return;
    }

    for mesh in &part.meshes {
        if !mesh.is_usable() || part.is_wheel_flare(mesh) {
            continue;
        }
        let Some(model_scale) = model_envelope_scale(part, mesh) else {
            debug!("Skipping collapsed mesh {} of part {}", mesh.name, part.name);
            continue;
        };

        entries.push(EnvelopeEntry {
            part_identifier: identifier.clone(),
            surface: mesh.surface,
            model_scale,
            envelope_scale_factor: scale_factor,
            hides_source: false,
        });
    }
}

/// Inverse scale of a mesh. Parts that author their scale on the mesh itself use the
/// local scale instead of the inherited world scale.
///
/// Returns `None` for a mesh collapsed to zero on some axis.
pub fn model_envelope_scale(part: &PartGeometry, mesh: &MeshGeometry) -> Option<Vec3> {
    let scale = if part.uses_local_scale() {
        mesh.local_scale
    } else {
        mesh.lossy_scale
    };
    let inverse = scale.recip();
    inverse.is_finite().then_some(inverse)
}
