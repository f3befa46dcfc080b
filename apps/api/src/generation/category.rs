//! Question categories and the policy that picks one per case.
//!
//! Category choice only varies presentation. It is injected as a `CategoryPolicy`
//! so batches can run with a pinned category (tests) or a random one (production).

use std::fmt;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// The anchoring question types a generated question may target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionCategory {
    NextBestStep,
    MostLikelyDiagnosis,
}

impl QuestionCategory {
    pub const ALL: [QuestionCategory; 2] = [
        QuestionCategory::NextBestStep,
        QuestionCategory::MostLikelyDiagnosis,
    ];

    /// The phrase placed in the prompt.
    pub fn phrase(&self) -> &'static str {
        match self {
            QuestionCategory::NextBestStep => "next best step in management",
            QuestionCategory::MostLikelyDiagnosis => "most likely diagnosis",
        }
    }

    /// The phrase in title case, for document headings.
    pub fn title(&self) -> &'static str {
        match self {
            QuestionCategory::NextBestStep => "Next Best Step In Management",
            QuestionCategory::MostLikelyDiagnosis => "Most Likely Diagnosis",
        }
    }
}

impl fmt::Display for QuestionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.phrase())
    }
}

/// Chooses the category for a case. `case_index` is the 0-based position of the
/// record within the whole batch.
pub trait CategoryPolicy: Send + Sync {
    fn choose(&self, case_index: usize) -> QuestionCategory;
}

/// Uniform random choice from `QuestionCategory::ALL`.
pub struct RandomCategory;

impl CategoryPolicy for RandomCategory {
    fn choose(&self, _case_index: usize) -> QuestionCategory {
        QuestionCategory::ALL
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(QuestionCategory::NextBestStep)
    }
}

/// Always the same category.
pub struct FixedCategory(pub QuestionCategory);

impl CategoryPolicy for FixedCategory {
    fn choose(&self, _case_index: usize) -> QuestionCategory {
        self.0
    }
}

/// Cycles through `QuestionCategory::ALL` by case index.
pub struct RoundRobinCategory;

impl CategoryPolicy for RoundRobinCategory {
    fn choose(&self, case_index: usize) -> QuestionCategory {
        QuestionCategory::ALL[case_index % QuestionCategory::ALL.len()]
    }
}

/// Builds the policy named by the `QUESTION_CATEGORY_POLICY` setting.
/// `random` (default), `round_robin`, or a category name to pin it.
pub fn policy_from_name(name: &str) -> Option<Box<dyn CategoryPolicy>> {
    match name.trim().to_ascii_lowercase().as_str() {
        "random" => Some(Box::new(RandomCategory)),
        "round_robin" => Some(Box::new(RoundRobinCategory)),
        "next_best_step" => Some(Box::new(FixedCategory(QuestionCategory::NextBestStep))),
        "most_likely_diagnosis" => Some(Box::new(FixedCategory(
            QuestionCategory::MostLikelyDiagnosis,
        ))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_category_is_always_in_the_fixed_set() {
        let policy = RandomCategory;
        for i in 0..50 {
            assert!(QuestionCategory::ALL.contains(&policy.choose(i)));
        }
    }

    #[test]
    fn test_round_robin_alternates() {
        let policy = RoundRobinCategory;
        assert_eq!(policy.choose(0), QuestionCategory::NextBestStep);
        assert_eq!(policy.choose(1), QuestionCategory::MostLikelyDiagnosis);
        assert_eq!(policy.choose(2), QuestionCategory::NextBestStep);
    }

    #[test]
    fn test_policy_from_name() {
        assert!(policy_from_name("random").is_some());
        assert!(policy_from_name("Round_Robin").is_some());
        let pinned = policy_from_name("most_likely_diagnosis").unwrap();
        assert_eq!(pinned.choose(7), QuestionCategory::MostLikelyDiagnosis);
        assert!(policy_from_name("coin_flip").is_none());
    }

    #[test]
    fn test_title_and_phrase() {
        assert_eq!(QuestionCategory::NextBestStep.phrase(), "next best step in management");
        assert_eq!(QuestionCategory::MostLikelyDiagnosis.title(), "Most Likely Diagnosis");
    }
}
