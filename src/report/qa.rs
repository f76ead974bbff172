use std::time::Duration;

/// How long the assistant appears to think before an answer lands.
pub const ANSWER_DELAY: Duration = Duration::from_millis(1500);

pub const STARTER_QUESTIONS: &[&str] = &[
    "Is there any evidence of a tumor?",
    "Do you see signs of abnormal tissue?",
    "How do the ventricles look?",
    "Is there any indication of stroke?",
];

// Checked in order. `abnormal` must stay ahead of `normal`, which is a
// substring of it.
const KEYWORD_ANSWERS: &[(&str, &str)] = &[
    (
        "tumor",
        "Based on the MRI scan, there is a focal area of abnormal signal intensity which may be consistent with a neoplasm. The specific region shows characteristics that would warrant further investigation with contrast enhancement and possibly a biopsy for definitive diagnosis.",
    ),
    (
        "stroke",
        "I don't see evidence of an acute stroke on this particular scan. The diffusion-weighted sequences don't demonstrate restricted diffusion that would indicate acute ischemia. However, a clinical correlation with the patient's symptoms is always recommended.",
    ),
    (
        "abnormal",
        "The scan does show an abnormality in the right temporal lobe region. It appears as an area of altered signal intensity measuring approximately 2.3 x 1.8 cm with minimal surrounding edema. This finding requires further characterization.",
    ),
    (
        "normal",
        "The overall brain structure appears within normal limits. Ventricles are of normal size, no midline shift is observed, and the gray-white matter differentiation is preserved. No focal lesions or abnormal enhancement patterns are identified.",
    ),
    (
        "contrast",
        "This scan was performed without contrast. For better characterization of any potential lesions, especially to evaluate for breakdown of the blood-brain barrier, a contrast-enhanced study would be beneficial.",
    ),
    (
        "atrophy",
        "There is no significant evidence of cortical atrophy on this scan. The sulcal and ventricular spaces appear age-appropriate without signs of pathological volume loss.",
    ),
    (
        "ventricles",
        "The ventricular system is of normal size and configuration. There is no evidence of hydrocephalus or ventricular compression.",
    ),
];

const DEFAULT_ANSWER: &str = "Based on the provided MRI scan, I can see the brain structures appear to be within normal anatomical parameters. I don't see any obvious pathology in the specific area you're asking about, but for a definitive clinical assessment, I'd recommend reviewing this with the radiologist or neurologist directly.";

pub fn answer_for(question: &str) -> &'static str {
    let question = question.to_lowercase();
    for (keyword, answer) in KEYWORD_ANSWERS {
        if question.contains(keyword) {
            return answer;
        }
    }
    DEFAULT_ANSWER
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starter_questions_each_hit_a_canned_answer() {
        assert!(answer_for("Is there any evidence of a tumor?").contains("neoplasm"));
        assert!(answer_for("Do you see signs of abnormal tissue?").contains("right temporal lobe"));
        assert!(answer_for("How do the ventricles look?").contains("ventricular system"));
        assert!(answer_for("Is there any indication of stroke?").contains("acute stroke"));
    }

    #[test]
    fn abnormal_outranks_its_normal_substring() {
        assert!(answer_for("Does anything look abnormal?").contains("right temporal lobe"));
        assert!(answer_for("Is everything normal?").contains("within normal limits"));
    }

    #[test]
    fn matching_ignores_case() {
        assert_eq!(answer_for("TUMOR?"), answer_for("tumor?"));
    }

    #[test]
    fn unmatched_questions_get_the_default_answer() {
        assert_eq!(answer_for("What about the cerebellum?"), DEFAULT_ANSWER);
        assert_eq!(answer_for(""), DEFAULT_ANSWER);
    }
}
