use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DIGITS: usize = 10;
pub const ASTRO_POSITIONS: usize = 4;
pub const SIGN_COUNT: usize = 12;
pub const ASTRO_LOTTERY: &str = "Astro";

/// Histogramme de fréquence des chiffres : index = chiffre 0-9.
pub type Histogram = [u32; DIGITS];

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum Session {
    #[serde(rename = "Dia")]
    #[value(name = "dia", alias = "day")]
    Day,
    #[serde(rename = "Tarde")]
    #[value(name = "tarde", alias = "afternoon")]
    Afternoon,
    #[serde(rename = "Noche")]
    #[value(name = "noche", alias = "night")]
    Night,
}

impl Session {
    pub const ALL: [Session; 3] = [Session::Day, Session::Afternoon, Session::Night];

    /// Libellé stocké en base.
    pub fn label(&self) -> &'static str {
        match self {
            Session::Day => "Dia",
            Session::Afternoon => "Tarde",
            Session::Night => "Noche",
        }
    }
}

impl std::fmt::Display for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for Session {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match fold_accents(s.trim()).to_lowercase().as_str() {
            "dia" | "day" | "mañana" | "manana" => Ok(Session::Day),
            "tarde" | "afternoon" => Ok(Session::Afternoon),
            "noche" | "night" => Ok(Session::Night),
            _ => bail!("Jornada inconnue : '{}'", s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AstroSign {
    Aries = 1,
    Tauro = 2,
    Geminis = 3,
    Cancer = 4,
    Leo = 5,
    Virgo = 6,
    Libra = 7,
    Escorpio = 8,
    Sagitario = 9,
    Capricornio = 10,
    Acuario = 11,
    Piscis = 12,
}

impl AstroSign {
    pub const ALL: [AstroSign; SIGN_COUNT] = [
        AstroSign::Aries,
        AstroSign::Tauro,
        AstroSign::Geminis,
        AstroSign::Cancer,
        AstroSign::Leo,
        AstroSign::Virgo,
        AstroSign::Libra,
        AstroSign::Escorpio,
        AstroSign::Sagitario,
        AstroSign::Capricornio,
        AstroSign::Acuario,
        AstroSign::Piscis,
    ];

    /// Rang 1-12 du signe.
    pub fn ordinal(&self) -> usize {
        *self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            AstroSign::Aries => "Aries",
            AstroSign::Tauro => "Tauro",
            AstroSign::Geminis => "Geminis",
            AstroSign::Cancer => "Cancer",
            AstroSign::Leo => "Leo",
            AstroSign::Virgo => "Virgo",
            AstroSign::Libra => "Libra",
            AstroSign::Escorpio => "Escorpio",
            AstroSign::Sagitario => "Sagitario",
            AstroSign::Capricornio => "Capricornio",
            AstroSign::Acuario => "Acuario",
            AstroSign::Piscis => "Piscis",
        }
    }
}

impl std::fmt::Display for AstroSign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for AstroSign {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let folded = fold_accents(s.trim()).to_lowercase();
        AstroSign::ALL
            .iter()
            .copied()
            .find(|sign| sign.name().to_lowercase() == folded)
            .ok_or_else(|| anyhow::anyhow!("Signe zodiacal inconnu : '{}'", s))
    }
}

/// Un résultat de tirage tel qu'ingéré ("Ticket" ou "Sorteo").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawRecord {
    pub id: Option<i64>,
    pub date: NaiveDate,
    pub session: Session,
    pub lottery: String,
    pub number: String,
    pub sign: Option<AstroSign>,
}

impl DrawRecord {
    pub fn new(date: NaiveDate, session: Session, lottery: &str, number: &str) -> Self {
        Self {
            id: None,
            date,
            session,
            lottery: lottery.to_string(),
            number: number.to_string(),
            sign: None,
        }
    }

    pub fn with_sign(mut self, sign: AstroSign) -> Self {
        self.sign = Some(sign);
        self
    }

    pub fn is_lottery(&self, name: &str) -> bool {
        self.lottery.eq_ignore_ascii_case(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub id: i64,
    pub date: NaiveDate,
    pub session: Session,
    pub histogram: Histogram,
}

/// Patron saisi de l'extérieur, avant validation de sa forme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternCandidate {
    pub date: NaiveDate,
    pub session: Session,
    pub histogram: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstroPattern {
    pub id: i64,
    pub year: i32,
    pub month: u32,
    pub session: Session,
    pub computed_on: NaiveDate,
    pub rows: [Histogram; ASTRO_POSITIONS],
    pub signs: [u32; SIGN_COUNT],
}

/// Remplace les voyelles accentuées par leur forme simple (ñ est conservé).
pub fn fold_accents(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' | 'ü' => 'u',
            'Á' => 'A',
            'É' => 'E',
            'Í' => 'I',
            'Ó' => 'O',
            'Ú' | 'Ü' => 'U',
            other => other,
        })
        .collect()
}

pub fn validate_draw(draw: &DrawRecord) -> Result<()> {
    let number = &draw.number;
    if number.is_empty() || draw.lottery.trim().is_empty() {
        bail!("Tirage incomplet (numéro ou loterie manquant)");
    }
    if !number.chars().all(|c| c.is_ascii_digit()) {
        bail!("Numéro '{}' invalide : chiffres uniquement", number);
    }
    if number.len() < 3 || number.len() > 4 {
        bail!("Numéro '{}' invalide : 3 ou 4 chiffres attendus", number);
    }
    if draw.is_lottery(ASTRO_LOTTERY) {
        if number.len() != 4 {
            bail!("Numéro Astro '{}' invalide : 4 chiffres attendus", number);
        }
        if draw.sign.is_none() {
            bail!("Le signe zodiacal est obligatoire pour la loterie Astro");
        }
    }
    Ok(())
}
