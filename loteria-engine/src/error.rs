use chrono::NaiveDate;
use thiserror::Error;

use loteria_db::models::Session;
use loteria_db::rusqlite;

/// Résultats "introuvables" : flux normal, à remonter tel quel à l'appelant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFound {
    #[error("aucun tirage ne contribue au patron")]
    NoDraws,
    #[error("le patron de référence n'a aucune position vide")]
    NoVoidPositions,
    #[error("aucun patron candidat ne dépasse le seuil")]
    NoCandidates,
    #[error("patron {0} introuvable")]
    Pattern(i64),
    #[error("aucun tirage ne correspond au numéro {0}")]
    NoMatchingDraws(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("l'histogramme doit avoir 10 cases, reçu {len}")]
    Shape { len: usize },
    #[error("un patron identique existe déjà pour le {date} ({session})")]
    Duplicate { date: NaiveDate, session: Session },
    #[error("un autre patron existe déjà pour le {date} ({session})")]
    KeyTaken { date: NaiveDate, session: Session },
    #[error("numéro '{number}' mal formé : chiffres uniquement")]
    MalformedNumber { number: String },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    NotFound(#[from] NotFound),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Écriture concurrente sur la même clé ; à réessayer.
    #[error("conflit d'écriture pour le patron du {date} ({session})")]
    Conflict { date: NaiveDate, session: Session },
    #[error("erreur SQLite : {0}")]
    Sql(#[from] rusqlite::Error),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl EngineError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::NotFound(_))
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, EngineError::Validation(ValidationError::Duplicate { .. }))
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
