use std::time::Duration;

/// How long report generation appears to run before the text lands.
pub const REPORT_DELAY: Duration = Duration::from_millis(2000);

pub const NORMAL_REPORT: &str = "\
CLINICAL INDICATION: Brain MRI scan for routine evaluation.

TECHNIQUE: Multi-parametric MRI brain study was performed without contrast.

FINDINGS:
- Brain parenchyma: Normal signal intensity throughout the cerebral hemispheres.
- Ventricles: Normal size and configuration.
- Gray-white matter differentiation: Well-preserved.
- Midline structures: No midline shift.
- Brainstem and cerebellum: Unremarkable.
- Extra-axial spaces: No abnormal extra-axial collections.
- Vascular structures: Flow voids appear normal.

IMPRESSION:
Normal brain MRI study. No acute intracranial abnormality.

RECOMMENDATION:
No follow-up imaging required based on this study. Routine clinical follow-up as needed.";

pub const ABNORMAL_REPORT: &str = "\
CLINICAL INDICATION: Brain MRI scan for evaluation of persistent headaches.

TECHNIQUE: Multi-parametric MRI brain study was performed without contrast.

FINDINGS:
- Brain parenchyma: Focal area of T2/FLAIR hyperintensity in the right temporal lobe, measuring approximately 2.3 x 1.8 cm.
- Mass effect: Mild local mass effect with minimal surrounding edema.
- Ventricles: Normal size and configuration.
- Gray-white matter differentiation: Preserved except in the region of the lesion.
- Midline structures: No midline shift.
- Brainstem and cerebellum: Unremarkable.
- Extra-axial spaces: No abnormal extra-axial collections.
- Vascular structures: Flow voids appear normal.

IMPRESSION:
Focal abnormality in the right temporal lobe, concerning for a primary neoplastic process. Differential diagnosis includes low-grade glioma, focal cortical dysplasia, or less likely, focal encephalitis.

RECOMMENDATION:
1. Contrast-enhanced MRI is recommended for further characterization.
2. Neurosurgical consultation advised.
3. Clinical correlation with EEG may be considered to evaluate for seizure activity.";

pub fn report_for(abnormality_detected: bool) -> &'static str {
    if abnormality_detected {
        ABNORMAL_REPORT
    } else {
        NORMAL_REPORT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_picks_the_template() {
        assert_eq!(report_for(false), NORMAL_REPORT);
        assert_eq!(report_for(true), ABNORMAL_REPORT);
        assert_ne!(NORMAL_REPORT, ABNORMAL_REPORT);
    }

    #[test]
    fn both_templates_carry_the_full_report_sections() {
        for report in [NORMAL_REPORT, ABNORMAL_REPORT] {
            assert!(report.starts_with("CLINICAL INDICATION:"));
            assert!(report.contains("TECHNIQUE:"));
            assert!(report.contains("FINDINGS:"));
            assert!(report.contains("IMPRESSION:"));
            assert!(report.contains("RECOMMENDATION:"));
        }
    }

    #[test]
    fn only_the_abnormal_template_describes_a_lesion() {
        assert!(ABNORMAL_REPORT.contains("right temporal lobe"));
        assert!(ABNORMAL_REPORT.contains("Neurosurgical consultation advised."));
        assert!(!NORMAL_REPORT.contains("lesion"));
        assert!(NORMAL_REPORT.contains("No acute intracranial abnormality."));
    }
}
