//! Classification verdict types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Verdict label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    /// AI-generated singing/speech (classifier decision value 1)
    #[serde(rename = "AI")]
    Ai,
    /// Human performance (classifier decision value 0)
    #[serde(rename = "REAL")]
    Real,
}

impl Label {
    /// Map a classifier decision value; only 0 and 1 are meaningful
    pub fn from_decision(value: i64) -> Option<Self> {
        match value {
            1 => Some(Label::Ai),
            0 => Some(Label::Real),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Ai => "AI",
            Label::Real => "REAL",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label plus the probability mass of the predicted class
///
/// `probability` is the confidence in `label`, not P(AI).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: Label,
    pub probability: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_from_decision() {
        assert_eq!(Label::from_decision(1), Some(Label::Ai));
        assert_eq!(Label::from_decision(0), Some(Label::Real));
        assert_eq!(Label::from_decision(2), None);
    }

    #[test]
    fn test_result_serializes_wire_labels() {
        let result = ClassificationResult {
            label: Label::Ai,
            probability: 0.75,
        };
        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json["label"], "AI");
        assert_eq!(json["probability"], 0.75);

        let real = serde_json::to_value(Label::Real).unwrap();
        assert_eq!(real, "REAL");
    }
}
