// Prompt constants for exam question generation and feedback classification.
// The delimiter strings are shared with the response parser; change both or neither.

pub const QUESTION_BEGIN: &str = "---BEGIN QUESTION---";
pub const QUESTION_END: &str = "---END QUESTION---";
pub const ANSWER_KEY_BEGIN: &str = "---BEGIN ANSWER KEY---";
pub const ANSWER_KEY_END: &str = "---END ANSWER KEY---";
pub const EXPLANATION_BEGIN: &str = "---BEGIN EXPLANATION---";
pub const EXPLANATION_END: &str = "---END EXPLANATION---";

/// System role for question generation.
pub const QUESTION_SYSTEM: &str = "You are an expert in pediatric medical education.";

/// Question generation prompt. Replace `{case_vignette}` and `{question_type}` before sending.
pub const QUESTION_PROMPT_TEMPLATE: &str = r#"Given the following pediatric case vignette:
{case_vignette}

Generate a USMLE/NBME style multiple choice question for: {question_type}.
The question must be formatted in multiple choice style with exactly four answer options labeled A, B, C, and D.
Clearly indicate the correct answer.
Also, provide a detailed explanation for why that answer is correct.
Format your response using the following sections and delimiters exactly:

---BEGIN QUESTION---
Question:
<Your multiple choice question including answer options>
---END QUESTION---

---BEGIN ANSWER KEY---
Answer Key:
<The correct answer letter (e.g., A, B, C, or D)>
---END ANSWER KEY---

---BEGIN EXPLANATION---
Explanation:
<The detailed explanation for the correct answer>
---END EXPLANATION---
"#;

/// System role for feedback classification.
pub const CLASSIFICATION_SYSTEM: &str = "You are an experienced clinical educator who evaluates \
    preceptor feedback on medical students against entrustable professional activity descriptors.";

/// Classification prompt. Replace `{feedback}` and `{rubric}` before sending.
pub const CLASSIFICATION_PROMPT_TEMPLATE: &str = r#"Read the following preceptor feedback about a medical student:

{feedback}

Which ONE of the following behavior descriptors best matches the feedback?

{rubric}

Respond with ONLY the number of the best-matching descriptor. Do NOT include any other text."#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_template_carries_every_delimiter_verbatim() {
        for delimiter in [
            QUESTION_BEGIN,
            QUESTION_END,
            ANSWER_KEY_BEGIN,
            ANSWER_KEY_END,
            EXPLANATION_BEGIN,
            EXPLANATION_END,
        ] {
            assert!(
                QUESTION_PROMPT_TEMPLATE.contains(delimiter),
                "template is missing {delimiter}"
            );
        }
    }
}
