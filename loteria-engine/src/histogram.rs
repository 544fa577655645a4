use serde::{Deserialize, Serialize};

use loteria_db::models::{DrawRecord, Histogram, ASTRO_POSITIONS, DIGITS, SIGN_COUNT};

use crate::error::{EngineResult, NotFound, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstroHistograms {
    pub rows: [Histogram; ASTRO_POSITIONS],
    pub signs: [u32; SIGN_COUNT],
    /// Tirages ignorés pour le comptage positionnel (pas exactement 4 caractères).
    pub skipped: usize,
}

fn digit_of(number: &str, c: char) -> Result<usize, ValidationError> {
    c.to_digit(10)
        .map(|d| d as usize)
        .ok_or_else(|| ValidationError::MalformedNumber { number: number.to_string() })
}

/// Compte chaque chiffre de chaque numéro, quelle que soit sa position.
pub fn extract_histogram<'a, I>(numbers: I) -> EngineResult<Histogram>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut histogram = [0u32; DIGITS];
    let mut contributing = 0usize;

    for number in numbers {
        for c in number.chars() {
            histogram[digit_of(number, c)?] += 1;
        }
        contributing += 1;
    }

    if contributing == 0 {
        return Err(NotFound::NoDraws.into());
    }
    Ok(histogram)
}

pub fn extract_from_draws(draws: &[DrawRecord]) -> EngineResult<Histogram> {
    extract_histogram(draws.iter().map(|d| d.number.as_str()))
}

/// Quatre histogrammes positionnels plus le comptage des signes.
pub fn extract_astro(draws: &[DrawRecord]) -> EngineResult<AstroHistograms> {
    if draws.is_empty() {
        return Err(NotFound::NoDraws.into());
    }

    let mut rows = [[0u32; DIGITS]; ASTRO_POSITIONS];
    let mut signs = [0u32; SIGN_COUNT];
    let mut skipped = 0usize;

    for draw in draws {
        let chars: Vec<char> = draw.number.chars().collect();
        if chars.len() == ASTRO_POSITIONS {
            let digits = chars
                .iter()
                .map(|&c| digit_of(&draw.number, c))
                .collect::<Result<Vec<_>, _>>()?;
            for (row, digit) in rows.iter_mut().zip(digits) {
                row[digit] += 1;
            }
        } else {
            skipped += 1;
        }

        if let Some(sign) = draw.sign {
            signs[sign.ordinal() - 1] += 1;
        }
    }

    Ok(AstroHistograms { rows, signs, skipped })
}

pub fn total(histogram: &Histogram) -> u32 {
    histogram.iter().sum()
}
