use serde::{Deserialize, Serialize};

/// One row of the exam roster: a learner's logged case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub recipient_key: String,
    pub primary_diagnosis: String,
    /// Exactly three differentials, in column order.
    pub differentials: [String; 3],
}

impl CaseRecord {
    pub fn recipient_key(&self) -> &str {
        &self.recipient_key
    }
}

/// One row of the preceptor feedback roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub recipient_key: String,
    pub first_answer: String,
    pub second_answer: String,
    /// Preceptor rating, already coerced into 1..=5.
    pub rating: u8,
}

impl FeedbackRecord {
    pub fn recipient_key(&self) -> &str {
        &self.recipient_key
    }

    /// Both free-text answers joined into the text sent for classification.
    /// Blank answers are left out.
    pub fn feedback_text(&self) -> String {
        [self.first_answer.trim(), self.second_answer.trim()]
            .into_iter()
            .filter(|a| !a.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
