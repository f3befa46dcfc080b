//! Prompt Builder — renders backend requests for both batch modes.

use crate::generation::category::QuestionCategory;
use crate::generation::prompts::{
    CLASSIFICATION_PROMPT_TEMPLATE, CLASSIFICATION_SYSTEM, QUESTION_PROMPT_TEMPLATE,
    QUESTION_SYSTEM,
};
use crate::generation::request::{BackendParams, GenerationRequest, Selector};
use crate::generation::rubric::Rubric;

/// Request for one multiple choice question about a case.
pub fn build_question_request(
    case_summary: &str,
    category: QuestionCategory,
    params: BackendParams,
) -> GenerationRequest {
    let prompt = QUESTION_PROMPT_TEMPLATE
        .replace("{question_type}", category.phrase())
        .replace("{case_vignette}", case_summary);

    GenerationRequest {
        system: QUESTION_SYSTEM.to_string(),
        prompt,
        selector: Selector::Question { category },
        params,
    }
}

/// Request asking which rubric bullet best matches a piece of feedback.
pub fn build_classification_request(
    feedback: &str,
    rubric: &Rubric,
    params: BackendParams,
) -> GenerationRequest {
    let prompt = CLASSIFICATION_PROMPT_TEMPLATE
        .replace("{rubric}", &rubric.enumerated())
        .replace("{feedback}", feedback);

    GenerationRequest {
        system: CLASSIFICATION_SYSTEM.to_string(),
        prompt,
        selector: Selector::Rubric { size: rubric.len() },
        params,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::prompts::{ANSWER_KEY_BEGIN, EXPLANATION_END, QUESTION_BEGIN};

    #[test]
    fn test_question_request_fills_template() {
        let request = build_question_request(
            "A pediatric patient presents with croup.",
            QuestionCategory::MostLikelyDiagnosis,
            BackendParams::QUESTION,
        );
        assert!(request.prompt.contains("A pediatric patient presents with croup."));
        assert!(request
            .prompt
            .contains("multiple choice question for: most likely diagnosis."));
        assert!(request.prompt.contains(QUESTION_BEGIN));
        assert!(request.prompt.contains(ANSWER_KEY_BEGIN));
        assert!(request.prompt.contains(EXPLANATION_END));
        assert!(!request.prompt.contains("{case_vignette}"));
        assert_eq!(
            request.selector,
            Selector::Question {
                category: QuestionCategory::MostLikelyDiagnosis
            }
        );
        assert_eq!(request.params.max_tokens, 500);
    }

    #[test]
    fn test_classification_request_enumerates_rubric() {
        let rubric = Rubric::new(vec!["Needs help".to_string(), "Independent".to_string()]);
        let request = build_classification_request(
            "Built a strong differential.",
            &rubric,
            BackendParams::CLASSIFICATION,
        );
        assert!(request.prompt.contains("Built a strong differential."));
        assert!(request.prompt.contains("1. Needs help\n2. Independent"));
        assert!(request.prompt.contains("ONLY the number"));
        assert_eq!(request.selector, Selector::Rubric { size: 2 });
        assert_eq!(request.params.temperature, 0.0);
    }

    #[test]
    fn test_feedback_containing_placeholder_text_is_not_expanded() {
        let rubric = Rubric::new(vec!["Only bullet".to_string()]);
        let request =
            build_classification_request("{rubric}", &rubric, BackendParams::CLASSIFICATION);
        assert_eq!(request.prompt.matches("1. Only bullet").count(), 1);
    }

    #[test]
    fn test_vignette_containing_placeholder_text_is_sent_verbatim() {
        let summary = "A pediatric patient with {question_type} syndrome.";
        let request = build_question_request(
            summary,
            QuestionCategory::MostLikelyDiagnosis,
            BackendParams::QUESTION,
        );
        assert!(request.prompt.contains(summary));
    }
}
