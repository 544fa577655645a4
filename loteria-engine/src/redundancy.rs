use serde::{Deserialize, Serialize};

use loteria_db::models::{Histogram, Pattern};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedundancyResult {
    pub pattern: Pattern,
    pub match_count: usize,
}

/// Nombre de cases de même valeur entre deux histogrammes.
pub fn match_count(a: &Histogram, b: &Histogram) -> usize {
    a.iter().zip(b.iter()).filter(|(x, y)| x == y).count()
}

/// Candidats dont le nombre de cases égales dépasse `threshold`, triés par
/// score décroissant ; l'ordre d'entrée départage les ex æquo.
pub fn rank_redundancy(reference: &Pattern, candidates: &[Pattern], threshold: usize) -> Vec<RedundancyResult> {
    let mut results: Vec<RedundancyResult> = candidates
        .iter()
        .filter(|c| c.id != reference.id)
        .map(|c| RedundancyResult {
            pattern: c.clone(),
            match_count: match_count(&reference.histogram, &c.histogram),
        })
        .filter(|r| r.match_count > threshold)
        .collect();

    // sort_by est stable
    results.sort_by(|a, b| b.match_count.cmp(&a.match_count));
    results
}
