use serde::{Deserialize, Serialize};

use loteria_db::models::{Histogram, Pattern, DIGITS};

use crate::error::NotFound;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum VoidMode {
    /// Même ensemble de positions vides, ni plus ni moins.
    #[default]
    Exact,
    /// Au moins une position vide en commun.
    Partial,
}

/// Comparaison d'une case entre la référence et un candidat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotComparison {
    Match(u32),
    Mismatch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoidMatch {
    pub pattern: Pattern,
    /// Mode exact : positions vides partagées. Mode partiel : cases `Match`.
    pub matched_indices: Vec<usize>,
    pub slots: Option<[SlotComparison; DIGITS]>,
}

pub fn zero_indices(histogram: &Histogram) -> Vec<usize> {
    histogram
        .iter()
        .enumerate()
        .filter(|(_, &count)| count == 0)
        .map(|(i, _)| i)
        .collect()
}

pub fn compare_slots(reference: &Histogram, candidate: &Histogram) -> [SlotComparison; DIGITS] {
    let mut slots = [SlotComparison::Mismatch; DIGITS];
    for (i, slot) in slots.iter_mut().enumerate() {
        if reference[i] == candidate[i] {
            *slot = SlotComparison::Match(reference[i]);
        }
    }
    slots
}

fn matched(slots: &[SlotComparison; DIGITS]) -> Vec<usize> {
    slots
        .iter()
        .enumerate()
        .filter(|(_, slot)| matches!(slot, SlotComparison::Match(_)))
        .map(|(i, _)| i)
        .collect()
}

pub fn find_void_matches(
    reference: &Pattern,
    candidates: &[Pattern],
    mode: VoidMode,
) -> Result<Vec<VoidMatch>, NotFound> {
    let voids = zero_indices(&reference.histogram);
    if voids.is_empty() {
        return Err(NotFound::NoVoidPositions);
    }

    let matches = candidates
        .iter()
        .filter(|c| c.id != reference.id)
        .filter_map(|c| {
            let candidate_voids = zero_indices(&c.histogram);
            match mode {
                VoidMode::Exact => (candidate_voids == voids).then(|| VoidMatch {
                    pattern: c.clone(),
                    matched_indices: voids.clone(),
                    slots: None,
                }),
                VoidMode::Partial => {
                    let shares_void = candidate_voids.iter().any(|i| voids.contains(i));
                    shares_void.then(|| {
                        let slots = compare_slots(&reference.histogram, &c.histogram);
                        VoidMatch {
                            pattern: c.clone(),
                            matched_indices: matched(&slots),
                            slots: Some(slots),
                        }
                    })
                }
            }
        })
        .collect();

    Ok(matches)
}
