//! Verdict-to-ease mapping
//!
//! Anki's four answer buttons: 1 = Again, 2 = Hard, 3 = Good, 4 = Easy.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::judge::Verdict;
use crate::{Error, Result};

/// Confidence above which a correct answer is promoted to Easy
pub const HIGH_CONFIDENCE: f64 = 0.85;

/// Review feedback level, always in `1..=4`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Ease(u8);

impl Ease {
    pub const AGAIN: Ease = Ease(1);
    pub const HARD: Ease = Ease(2);
    pub const GOOD: Ease = Ease(3);
    pub const EASY: Ease = Ease(4);

    /// Validate a raw ease value
    pub fn new(value: i64) -> Result<Self> {
        match value {
            1..=4 => Ok(Ease(value as u8)),
            _ => Err(Error::Validation("ease must be 1..4".to_string())),
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "again",
            2 => "hard",
            3 => "good",
            _ => "easy",
        }
    }
}

impl TryFrom<i64> for Ease {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        Ease::new(value)
    }
}

impl From<Ease> for u8 {
    fn from(ease: Ease) -> u8 {
        ease.0
    }
}

impl fmt::Display for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Map a verdict and judge confidence to a suggested ease.
///
/// Total: NaN or out-of-range confidence never promotes to Easy.
pub fn map_ease(verdict: Verdict, confidence: f64) -> Ease {
    match verdict {
        Verdict::Correct if confidence > HIGH_CONFIDENCE => Ease::EASY,
        Verdict::Correct => Ease::GOOD,
        Verdict::Partial => Ease::HARD,
        Verdict::Wrong => Ease::AGAIN,
    }
}

/// Ease for a deterministic verdict, which always carries full confidence
pub fn ease_from_verdict(verdict: Verdict) -> Ease {
    map_ease(verdict, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_ease() {
        assert_eq!(map_ease(Verdict::Correct, 1.0), Ease::EASY);
        assert_eq!(map_ease(Verdict::Correct, 0.9), Ease::EASY);
        assert_eq!(map_ease(Verdict::Correct, 0.85), Ease::GOOD);
        assert_eq!(map_ease(Verdict::Correct, 0.2), Ease::GOOD);
        assert_eq!(map_ease(Verdict::Partial, 1.0), Ease::HARD);
        assert_eq!(map_ease(Verdict::Wrong, 1.0), Ease::AGAIN);
    }

    #[test]
    fn test_map_ease_is_total() {
        let confidences = [
            f64::NAN,
            f64::INFINITY,
            f64::NEG_INFINITY,
            -1.0,
            0.0,
            0.85,
            0.850001,
            2.0,
        ];
        for verdict in [Verdict::Correct, Verdict::Partial, Verdict::Wrong] {
            for confidence in confidences {
                let ease = map_ease(verdict, confidence);
                assert!((1..=4).contains(&ease.value()));
                assert_eq!(ease, map_ease(verdict, confidence));
            }
        }
        assert_eq!(map_ease(Verdict::Correct, f64::NAN), Ease::GOOD);
    }

    #[test]
    fn test_ease_from_verdict() {
        assert_eq!(ease_from_verdict(Verdict::Correct).value(), 4);
        assert_eq!(ease_from_verdict(Verdict::Partial).value(), 2);
        assert_eq!(ease_from_verdict(Verdict::Wrong).value(), 1);
    }

    #[test]
    fn test_ease_validation() {
        assert_eq!(Ease::new(3).unwrap(), Ease::GOOD);
        assert!(matches!(Ease::new(0), Err(Error::Validation(_))));
        assert!(matches!(Ease::new(5), Err(Error::Validation(_))));
        assert!(matches!(Ease::new(-1), Err(Error::Validation(_))));
    }

    #[test]
    fn test_ease_serde() {
        assert_eq!(serde_json::to_string(&Ease::HARD).unwrap(), "2");
        assert_eq!(serde_json::from_str::<Ease>("4").unwrap(), Ease::EASY);
        assert!(serde_json::from_str::<Ease>("7").is_err());
    }
}
