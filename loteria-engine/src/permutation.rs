use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

const SUFFIX_LEN: usize = 3;

/// Toutes les permutations distinctes des caractères de `number`.
pub fn permutations(number: &str) -> BTreeSet<String> {
    let chars: Vec<char> = number.chars().collect();
    permute(&chars)
}

fn permute(chars: &[char]) -> BTreeSet<String> {
    let mut result = BTreeSet::new();
    if chars.len() <= 1 {
        result.insert(chars.iter().collect());
        return result;
    }

    for i in 0..chars.len() {
        let mut remaining = chars.to_vec();
        let current = remaining.remove(i);
        for sub in permute(&remaining) {
            let mut s = String::with_capacity(chars.len());
            s.push(current);
            s.push_str(&sub);
            result.insert(s);
        }
    }
    result
}

/// Les 3 derniers caractères, ou la chaîne entière si elle est plus courte.
pub fn suffix_key(number: &str) -> String {
    let count = number.chars().count();
    number.chars().skip(count.saturating_sub(SUFFIX_LEN)).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberQuery {
    pub number: String,
    pub permutations: BTreeSet<String>,
    pub suffix: String,
}

impl NumberQuery {
    pub fn new(number: &str) -> Self {
        Self {
            number: number.to_string(),
            permutations: permutations(number),
            suffix: suffix_key(number),
        }
    }

    /// Permutation exacte, OU le candidat (3 caractères au moins) se termine
    /// par la clé de suffixe. Une recherche courte ("12") trouve donc "4512".
    pub fn matches(&self, candidate: &str) -> bool {
        if self.permutations.contains(candidate) {
            return true;
        }
        candidate.chars().count() >= SUFFIX_LEN && candidate.ends_with(&self.suffix)
    }
}
