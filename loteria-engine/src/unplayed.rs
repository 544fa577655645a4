use loteria_db::models::{ASTRO_POSITIONS, DIGITS};

use crate::error::ValidationError;

pub const WILDCARD: char = '*';

/// Chiffres jamais sortis, par position, sur les numéros de 4 chiffres.
/// Renvoie `None` si aucun numéro de 4 chiffres ne contribue ; un caractère
/// non numérique est une erreur, quelle que soit la longueur du numéro.
pub fn unplayed_digits<'a, I>(numbers: I) -> Result<Option<[Vec<u8>; ASTRO_POSITIONS]>, ValidationError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = [[false; DIGITS]; ASTRO_POSITIONS];
    let mut contributing = 0usize;

    for number in numbers {
        let digits = number
            .chars()
            .map(|c| c.to_digit(10).map(|d| d as usize))
            .collect::<Option<Vec<usize>>>()
            .ok_or_else(|| ValidationError::MalformedNumber { number: number.to_string() })?;
        if digits.len() != ASTRO_POSITIONS {
            continue;
        }
        for (position, digit) in digits.into_iter().enumerate() {
            seen[position][digit] = true;
        }
        contributing += 1;
    }

    if contributing == 0 {
        return Ok(None);
    }

    Ok(Some(seen.map(|row| {
        (0..DIGITS as u8)
            .filter(|&d| !row[d as usize])
            .collect()
    })))
}

fn digit_or_wildcard(list: &[u8], i: usize) -> char {
    list.get(i)
        .map(|&d| char::from(b'0' + d))
        .unwrap_or(WILDCARD)
}

/// Recombine les chiffres non joués en numéros candidats.
pub fn combine_unplayed(unplayed: &[Vec<u8>; ASTRO_POSITIONS]) -> Vec<String> {
    // une position saturée : un seul numéro, avec joker
    if unplayed.iter().any(|list| list.is_empty()) {
        return vec![unplayed.iter().map(|list| digit_or_wildcard(list, 0)).collect()];
    }

    let longest = unplayed.iter().map(Vec::len).max().unwrap_or(0);
    (0..longest)
        .map(|i| unplayed.iter().map(|list| digit_or_wildcard(list, i)).collect())
        .collect()
}

pub fn unplayed_numbers<'a, I>(numbers: I) -> Result<Option<Vec<String>>, ValidationError>
where
    I: IntoIterator<Item = &'a str>,
{
    Ok(unplayed_digits(numbers)?.map(|lists| combine_unplayed(&lists)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_but(excluded: &[u8]) -> Vec<u8> {
        (0..10).filter(|d| !excluded.contains(d)).collect()
    }

    #[test]
    fn test_unplayed_per_position() {
        let lists = unplayed_digits(["1234", "5678"]).unwrap().unwrap();
        assert_eq!(lists[0], all_but(&[1, 5]));
        assert_eq!(lists[1], all_but(&[2, 6]));
        assert_eq!(lists[2], all_but(&[3, 7]));
        assert_eq!(lists[3], all_but(&[4, 8]));
    }

    #[test]
    fn test_only_four_digit_numbers_count() {
        let lists = unplayed_digits(["1234", "999", "12345"]).unwrap().unwrap();
        assert_eq!(lists[0], all_but(&[1]));
        assert_eq!(unplayed_digits(["123", "45"]), Ok(None));
    }

    #[test]
    fn test_zip_with_padding() {
        let lists = [vec![0, 2], vec![1], vec![3, 4, 5], vec![9]];
        assert_eq!(combine_unplayed(&lists), vec!["0139", "2*4*", "**5*"]);
    }

    #[test]
    fn test_saturated_position_single_result() {
        // la première position voit les 10 chiffres
        let numbers: Vec<String> = (0..10).map(|d| format!("{}000", d)).collect();
        let result = unplayed_numbers(numbers.iter().map(String::as_str)).unwrap().unwrap();
        assert_eq!(result, vec!["*111"]);
    }

    #[test]
    fn test_results_have_four_characters() {
        let result = unplayed_numbers(["1234", "5678", "9012"]).unwrap().unwrap();
        assert!(!result.is_empty());
        for number in &result {
            assert_eq!(number.chars().count(), 4);
            assert!(number.chars().all(|c| c.is_ascii_digit() || c == WILDCARD));
        }
    }

    #[test]
    fn test_malformed_number_fails() {
        assert_eq!(
            unplayed_digits(["1234", "12a4"]),
            Err(ValidationError::MalformedNumber { number: "12a4".to_string() })
        );
        assert!(unplayed_numbers(["x9"]).is_err());
    }
}
