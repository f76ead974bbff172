use glam::Vec3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerKind {
    NecroticCore,
    PeritumoralEdema,
    EnhancingTumor,
}

impl MarkerKind {
    pub fn label(&self) -> &'static str {
        match self {
            MarkerKind::NecroticCore => "Necrotic Core",
            MarkerKind::PeritumoralEdema => "Peritumoral Edema",
            MarkerKind::EnhancingTumor => "Enhancing Tumor",
        }
    }
}

#[derive(Clone, Copy)]
pub struct AbnormalityMarker {
    pub kind: MarkerKind,
    pub position: Vec3,
    pub radius: f32,
    pub color: [f32; 3],
    pub emissive: [f32; 3],
    pub emissive_intensity: f32,
    pub opacity: f32,
}

// Kept sorted by ascending opacity; the renderer draws the slice in order.
pub const MARKERS: &[AbnormalityMarker] = &[
    AbnormalityMarker {
        kind: MarkerKind::PeritumoralEdema,
        position: Vec3::new(1.0, 0.3, 1.0),
        radius: 0.3,
        color: [0.267, 1.0, 0.267],
        emissive: [0.0, 1.0, 0.0],
        emissive_intensity: 1.5,
        opacity: 0.4,
    },
    AbnormalityMarker {
        kind: MarkerKind::EnhancingTumor,
        position: Vec3::new(0.6, 0.7, 1.4),
        radius: 0.15,
        color: [0.267, 0.267, 1.0],
        emissive: [0.0, 0.0, 1.0],
        emissive_intensity: 1.5,
        opacity: 0.5,
    },
    AbnormalityMarker {
        kind: MarkerKind::NecroticCore,
        position: Vec3::new(0.8, 0.5, 1.2),
        radius: 0.2,
        color: [1.0, 0.267, 0.267],
        emissive: [1.0, 0.0, 0.0],
        emissive_intensity: 2.0,
        opacity: 0.6,
    },
];

/// Marker overlays to layer onto the cortex for the given analysis outcome.
pub fn overlays_for(abnormality_detected: bool) -> &'static [AbnormalityMarker] {
    if abnormality_detected { MARKERS } else { &[] }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_abnormality_means_no_overlays() {
        assert!(overlays_for(false).is_empty());
    }

    #[test]
    fn abnormality_yields_the_full_marker_set() {
        let overlays = overlays_for(true);
        assert_eq!(overlays.len(), 3);

        let kinds: Vec<_> = overlays.iter().map(|m| m.kind).collect();
        assert!(kinds.contains(&MarkerKind::NecroticCore));
        assert!(kinds.contains(&MarkerKind::PeritumoralEdema));
        assert!(kinds.contains(&MarkerKind::EnhancingTumor));
    }

    #[test]
    fn overlay_set_is_stable_across_calls() {
        let a = overlays_for(true);
        let b = overlays_for(true);
        assert!(std::ptr::eq(a, b));
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.kind, y.kind);
            assert_eq!(x.position, y.position);
            assert_eq!(x.radius, y.radius);
            assert_eq!(x.opacity, y.opacity);
        }
    }

    #[test]
    fn markers_sorted_by_opacity() {
        for pair in MARKERS.windows(2) {
            assert!(pair[0].opacity <= pair[1].opacity);
        }
    }

    #[test]
    fn markers_sit_on_the_cortex() {
        // all three attach near the default radius-2 surface
        for marker in MARKERS {
            let d = marker.position.length();
            assert!(d > 1.0 && d < 2.5, "{:?} floats at {d}", marker.kind);
        }
    }
}
