use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use loteria_db::models::{Histogram, Pattern, PatternCandidate, Session};

use crate::error::ValidationError;

/// Que faire d'une clé (date, jornada) déjà occupée par un histogramme différent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WritePolicy {
    /// Recalcul programmé : le nouvel histogramme remplace l'ancien.
    Recompute,
    /// Création manuelle : la clé occupée est refusée.
    Create,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAction {
    Insert,
    Overwrite { id: i64 },
}

pub fn validate_shape(values: &[u32]) -> Result<Histogram, ValidationError> {
    values
        .try_into()
        .map_err(|_| ValidationError::Shape { len: values.len() })
}

pub fn validate_candidate(candidate: &PatternCandidate) -> Result<Histogram, ValidationError> {
    validate_shape(&candidate.histogram)
}

/// Règle d'unicité : un histogramme identique est toujours refusé, un
/// histogramme différent dépend de la politique.
pub fn decide(
    date: NaiveDate,
    session: Session,
    histogram: &Histogram,
    existing: Option<&Pattern>,
    policy: WritePolicy,
) -> Result<WriteAction, ValidationError> {
    let Some(existing) = existing else {
        return Ok(WriteAction::Insert);
    };
    if existing.histogram == *histogram {
        return Err(ValidationError::Duplicate { date, session });
    }
    match policy {
        WritePolicy::Recompute => Ok(WriteAction::Overwrite { id: existing.id }),
        WritePolicy::Create => Err(ValidationError::KeyTaken { date, session }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 2).unwrap()
    }

    fn stored(histogram: Histogram) -> Pattern {
        Pattern { id: 7, date: date(), session: Session::Night, histogram }
    }

    #[test]
    fn test_shape_ok() {
        let values: Vec<u32> = (0..10).collect();
        assert_eq!(validate_shape(&values).unwrap(), [0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_shape_wrong_length() {
        assert_eq!(validate_shape(&[1; 9]), Err(ValidationError::Shape { len: 9 }));
        assert_eq!(validate_shape(&[1; 11]), Err(ValidationError::Shape { len: 11 }));
        assert_eq!(validate_shape(&[]), Err(ValidationError::Shape { len: 0 }));
    }

    #[test]
    fn test_candidate_shape() {
        let candidate = PatternCandidate { date: date(), session: Session::Day, histogram: vec![0; 12] };
        assert_eq!(validate_candidate(&candidate), Err(ValidationError::Shape { len: 12 }));
    }

    #[test]
    fn test_no_existing_inserts() {
        for policy in [WritePolicy::Recompute, WritePolicy::Create] {
            assert_eq!(decide(date(), Session::Night, &[1; 10], None, policy), Ok(WriteAction::Insert));
        }
    }

    #[test]
    fn test_identical_is_duplicate() {
        let existing = stored([1; 10]);
        for policy in [WritePolicy::Recompute, WritePolicy::Create] {
            assert_eq!(
                decide(date(), Session::Night, &[1; 10], Some(&existing), policy),
                Err(ValidationError::Duplicate { date: date(), session: Session::Night })
            );
        }
    }

    #[test]
    fn test_different_depends_on_policy() {
        let existing = stored([1; 10]);
        assert_eq!(
            decide(date(), Session::Night, &[2; 10], Some(&existing), WritePolicy::Recompute),
            Ok(WriteAction::Overwrite { id: 7 })
        );
        assert_eq!(
            decide(date(), Session::Night, &[2; 10], Some(&existing), WritePolicy::Create),
            Err(ValidationError::KeyTaken { date: date(), session: Session::Night })
        );
    }
}
