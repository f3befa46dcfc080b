use serde::Serialize;

/// Entrustable behavior descriptors for clinical reasoning, ordered from
/// least to most entrustable. Index `i` (1-based) is also the meaning of a
/// preceptor rating of `i`.
pub const ENTRUSTABLE_BEHAVIORS: [&str; 5] = [
    "Unable to create a plausible differential diagnosis. No insight to poor clinical reasoning.",
    "Struggles to create an appropriate differential without significant guidance. \
     Unable to identify diagnostics that would narrow the differential.",
    "Creates a basic differential diagnosis with some guidance. \
     Identifies common diagnostics but inconsistently prioritizes them.",
    "Independently creates an appropriate, prioritized differential diagnosis. \
     Selects diagnostics that meaningfully narrow the differential.",
    "Creates a thorough, prioritized differential that includes less common diagnoses. \
     Anticipates diagnostic results and adjusts reasoning accordingly.",
];

/// A fixed, enumerated list of behavioral descriptors used as classification targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rubric {
    bullets: Vec<String>,
}

impl Default for Rubric {
    fn default() -> Self {
        Self::new(ENTRUSTABLE_BEHAVIORS.iter().map(|b| b.to_string()).collect())
    }
}

impl Rubric {
    pub fn new(bullets: Vec<String>) -> Self {
        Self { bullets }
    }

    pub fn len(&self) -> usize {
        self.bullets.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.bullets.is_empty()
    }

    /// Looks up a bullet by its 1-based index.
    pub fn bullet(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.bullets.get(i))
            .map(String::as_str)
    }

    /// `1. first\n2. second\n…` as shown to the backend.
    pub fn enumerated(&self) -> String {
        self.bullets
            .iter()
            .enumerate()
            .map(|(i, b)| format!("{}. {}", i + 1, b))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
