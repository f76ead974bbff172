use glam::Vec3;

use crate::anatomy::mesh::TriangleMesh;

#[derive(Clone, Copy, PartialEq)]
pub struct CortexParams {
    pub radius: f32,
    pub resolution: u32,
    pub fold_frequency: f32,
    pub fold_amplitude: f32,
}

impl Default for CortexParams {
    fn default() -> Self {
        Self {
            radius: 2.0,
            resolution: 128,
            fold_frequency: 3.0,
            fold_amplitude: 0.2,
        }
    }
}

impl CortexParams {
    pub fn base_sphere() -> Self {
        Self {
            fold_amplitude: 0.0,
            ..Self::default()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CortexError {
    #[error("radius must be positive, got {0}")]
    NonPositiveRadius(f32),
    #[error("resolution must be at least 2, got {0}")]
    ResolutionTooLow(u32),
    #[error("fold amplitude must be non-negative, got {0}")]
    NegativeAmplitude(f32),
}

/// Builds the cortex surface: a UV sphere of `resolution x resolution`
/// vertices, each displaced along its own radial direction by the fold
/// field `sin(x*f) * cos(y*f) * sin(z*f) * amplitude`. Same parameters
/// always produce the same mesh.
pub fn synthesize(params: &CortexParams) -> Result<TriangleMesh, CortexError> {
    if !(params.radius > 0.0) {
        return Err(CortexError::NonPositiveRadius(params.radius));
    }
    if params.resolution < 2 {
        return Err(CortexError::ResolutionTooLow(params.resolution));
    }
    if params.fold_amplitude < 0.0 {
        return Err(CortexError::NegativeAmplitude(params.fold_amplitude));
    }

    let n = params.resolution as usize;
    let step = (n - 1) as f32;

    let mut vertices = Vec::with_capacity(n * n * 3);

    for i in 0..n {
        for j in 0..n {
            let theta = std::f32::consts::PI * i as f32 / step;
            let phi = std::f32::consts::TAU * j as f32 / step;

            let p = Vec3::new(
                params.radius * theta.sin() * phi.cos(),
                params.radius * theta.cos(),
                params.radius * theta.sin() * phi.sin(),
            );

            let fold = (p.x * params.fold_frequency).sin()
                * (p.y * params.fold_frequency).cos()
                * (p.z * params.fold_frequency).sin()
                * params.fold_amplitude;

            let v = p + p * fold;
            vertices.push(v.x);
            vertices.push(v.y);
            vertices.push(v.z);
        }
    }

    let mut indices = Vec::with_capacity((n - 1) * (n - 1) * 6);
    for i in 0..n - 1 {
        for j in 0..n - 1 {
            let tl = (i * n + j) as u32;
            let tr = (i * n + j + 1) as u32;
            let bl = ((i + 1) * n + j) as u32;
            let br = ((i + 1) * n + j + 1) as u32;

            // wound so accumulated face normals point away from the center
            indices.push(tl);
            indices.push(tr);
            indices.push(bl);

            indices.push(tr);
            indices.push(br);
            indices.push(bl);
        }
    }

    let normals = accumulate_normals(&vertices, &indices);

    Ok(TriangleMesh {
        vertices,
        normals,
        indices,
    })
}

fn accumulate_normals(vertices: &[f32], indices: &[u32]) -> Vec<f32> {
    let mut normals = vec![0.0f32; vertices.len()];

    for tri in indices.chunks_exact(3) {
        let a = tri[0] as usize * 3;
        let b = tri[1] as usize * 3;
        let c = tri[2] as usize * 3;

        let pa = Vec3::new(vertices[a], vertices[a + 1], vertices[a + 2]);
        let pb = Vec3::new(vertices[b], vertices[b + 1], vertices[b + 2]);
        let pc = Vec3::new(vertices[c], vertices[c + 1], vertices[c + 2]);

        // unnormalized cross product, so each face contributes by its area
        let face = (pb - pa).cross(pc - pa);

        for base in [a, b, c] {
            normals[base] += face.x;
            normals[base + 1] += face.y;
            normals[base + 2] += face.z;
        }
    }

    for chunk in normals.chunks_exact_mut(3) {
        let v = Vec3::new(chunk[0], chunk[1], chunk[2]);
        let len = v.length();
        if len > 1e-8 {
            chunk[0] = v.x / len;
            chunk[1] = v.y / len;
            chunk[2] = v.z / len;
        }
    }

    normals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(radius: f32, resolution: u32, frequency: f32, amplitude: f32) -> CortexParams {
        CortexParams {
            radius,
            resolution,
            fold_frequency: frequency,
            fold_amplitude: amplitude,
        }
    }

    #[test]
    fn same_params_same_mesh() {
        let p = params(2.0, 32, 3.0, 0.2);
        let a = synthesize(&p).expect("valid params");
        let b = synthesize(&p).expect("valid params");
        assert_eq!(a.vertices, b.vertices);
        assert_eq!(a.normals, b.normals);
        assert_eq!(a.indices, b.indices);
    }

    #[test]
    fn vertex_count_is_resolution_squared() {
        for resolution in [2u32, 8, 33, 64] {
            let mesh = synthesize(&params(2.0, resolution, 3.0, 0.2)).expect("valid params");
            assert_eq!(mesh.vertex_count(), (resolution * resolution) as usize);
            assert_eq!(mesh.normals.len(), mesh.vertices.len());
        }
    }

    #[test]
    fn vertex_count_ignores_fold_settings() {
        let flat = synthesize(&params(2.0, 24, 0.0, 0.0)).expect("valid params");
        let folded = synthesize(&params(2.0, 24, 9.0, 1.5)).expect("valid params");
        assert_eq!(flat.vertex_count(), folded.vertex_count());
        assert_eq!(flat.indices, folded.indices);
    }

    #[test]
    fn zero_amplitude_is_a_plain_sphere() {
        let radius = 2.0;
        let mesh = synthesize(&params(radius, 48, 3.0, 0.0)).expect("valid params");
        for chunk in mesh.vertices.chunks_exact(3) {
            let len = Vec3::new(chunk[0], chunk[1], chunk[2]).length();
            assert!((len - radius).abs() < 1e-4, "vertex off the sphere: {len}");
        }
    }

    #[test]
    fn normals_point_outward() {
        let mesh = synthesize(&params(2.0, 32, 3.0, 0.2)).expect("valid params");
        let mut checked = 0;
        for (v, nrm) in mesh
            .vertices
            .chunks_exact(3)
            .zip(mesh.normals.chunks_exact(3))
        {
            let p = Vec3::new(v[0], v[1], v[2]);
            let n = Vec3::new(nrm[0], nrm[1], nrm[2]);
            if n.length() < 0.5 {
                continue; // degenerate pole fans stay zeroed
            }
            assert!(p.dot(n) > 0.0, "inward normal at {p:?}");
            checked += 1;
        }
        assert!(checked > 900);
    }

    #[test]
    fn indices_stay_in_range() {
        let mesh = synthesize(&params(1.0, 16, 3.0, 0.2)).expect("valid params");
        let count = mesh.vertex_count() as u32;
        assert!(mesh.indices.iter().all(|&i| i < count));
        assert_eq!(mesh.indices.len(), 15 * 15 * 6);
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(matches!(
            synthesize(&params(0.0, 32, 3.0, 0.2)),
            Err(CortexError::NonPositiveRadius(_))
        ));
        assert!(matches!(
            synthesize(&params(-1.0, 32, 3.0, 0.2)),
            Err(CortexError::NonPositiveRadius(_))
        ));
        assert!(matches!(
            synthesize(&params(2.0, 1, 3.0, 0.2)),
            Err(CortexError::ResolutionTooLow(1))
        ));
        assert!(matches!(
            synthesize(&params(2.0, 0, 3.0, 0.2)),
            Err(CortexError::ResolutionTooLow(0))
        ));
        assert!(matches!(
            synthesize(&params(2.0, 32, 3.0, -0.1)),
            Err(CortexError::NegativeAmplitude(_))
        ));
    }

    #[test]
    fn minimum_resolution_still_builds() {
        let mesh = synthesize(&params(2.0, 2, 3.0, 0.2)).expect("valid params");
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.indices.len(), 6);
    }
}
