use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use loteria_db::db::{DrawQuery, PatternFilter};
use loteria_db::models::{AstroPattern, DrawRecord, Pattern, PatternCandidate, Session};

use crate::config::EngineConfig;
use crate::error::{EngineResult, NotFound, ValidationError};
use crate::histogram::{extract_astro, extract_from_draws};
use crate::permutation::NumberQuery;
use crate::redundancy::{rank_redundancy, RedundancyResult};
use crate::store::{DrawSource, PatternStore};
use crate::unplayed::unplayed_numbers;
use crate::validator::{validate_candidate, WritePolicy};
use crate::void::{find_void_matches, VoidMatch, VoidMode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstroComputation {
    pub pattern: AstroPattern,
    /// Tirages écartés du comptage positionnel.
    pub skipped: usize,
}

/// Point d'entrée des opérations d'analyse, sur un stockage et une configuration.
pub struct PatternEngine<'a, S> {
    store: &'a S,
    config: &'a EngineConfig,
}

impl<'a, S> PatternEngine<'a, S>
where
    S: DrawSource + PatternStore,
{
    pub fn new(store: &'a S, config: &'a EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        self.store
    }

    pub fn config(&self) -> &EngineConfig {
        self.config
    }

    /// Tirages agrégés pour (date, jornada), avec alias et exclusions.
    pub fn daily_draws(&self, date: NaiveDate, session: Session) -> EngineResult<Vec<DrawRecord>> {
        self.store.fetch_draws(&self.config.daily_query(date, session))
    }

    /// Calcule et enregistre le patron de (date, jornada).
    pub fn compute_pattern(&self, date: NaiveDate, session: Session) -> EngineResult<Pattern> {
        let draws = self.daily_draws(date, session)?;
        let histogram = extract_from_draws(&draws)?;
        self.store.store_pattern(date, session, &histogram, WritePolicy::Recompute)
    }

    pub fn create_pattern(&self, candidate: &PatternCandidate) -> EngineResult<Pattern> {
        let histogram = validate_candidate(candidate)?;
        self.store
            .store_pattern(candidate.date, candidate.session, &histogram, WritePolicy::Create)
    }

    pub fn load_pattern(&self, id: i64) -> EngineResult<Pattern> {
        self.store
            .find_pattern_by_id(id)?
            .ok_or_else(|| NotFound::Pattern(id).into())
    }

    pub fn compute_redundancy(&self, reference: &Pattern) -> EngineResult<Vec<RedundancyResult>> {
        let candidates = self.store.list_patterns(&PatternFilter::default())?;
        let ranked = rank_redundancy(reference, &candidates, self.config.redundancy_threshold);
        if ranked.is_empty() {
            return Err(NotFound::NoCandidates.into());
        }
        Ok(ranked)
    }

    pub fn compute_redundancy_for(&self, id: i64) -> EngineResult<Vec<RedundancyResult>> {
        let reference = self.load_pattern(id)?;
        self.compute_redundancy(&reference)
    }

    /// `mode` à `None` : mode de la configuration.
    pub fn compute_void_matches(&self, id: i64, mode: Option<VoidMode>) -> EngineResult<Vec<VoidMatch>> {
        let reference = self.load_pattern(id)?;
        self.void_matches_of(&reference, mode)
    }

    pub fn void_matches_of(&self, reference: &Pattern, mode: Option<VoidMode>) -> EngineResult<Vec<VoidMatch>> {
        let candidates = self.store.list_patterns(&PatternFilter::default())?;
        let mode = mode.unwrap_or(self.config.void_mode);
        Ok(find_void_matches(reference, &candidates, mode)?)
    }

    /// Tirages dont le numéro est une permutation de `number` ou partage ses
    /// 3 derniers chiffres, du plus récent au plus ancien.
    pub fn search_by_number(&self, number: &str) -> EngineResult<Vec<DrawRecord>> {
        let number = number.trim();
        if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::MalformedNumber { number: number.to_string() }.into());
        }

        let query = NumberQuery::new(number);
        let draws: Vec<DrawRecord> = self
            .store
            .fetch_draws(&DrawQuery::default())?
            .into_iter()
            .filter(|d| query.matches(&d.number))
            .collect();

        if draws.is_empty() {
            return Err(NotFound::NoMatchingDraws(number.to_string()).into());
        }
        Ok(draws)
    }

    pub fn compute_unplayed_numbers(&self, date: NaiveDate, session: Session) -> EngineResult<Vec<String>> {
        let draws = self.daily_draws(date, session)?;
        unplayed_numbers(draws.iter().map(|d| d.number.as_str()))?
            .ok_or_else(|| NotFound::NoDraws.into())
    }

    /// Patron Astro du mois de `date` ; un patron existant pour le même mois
    /// est remplacé et daté de `date`.
    pub fn compute_astro_pattern(&self, date: NaiveDate, session: Session) -> EngineResult<AstroComputation> {
        let draws = self.store.fetch_draws(&self.config.astro_month_query(date, session))?;
        let extracted = extract_astro(&draws)?;
        let pattern = AstroPattern {
            id: 0,
            year: date.year(),
            month: date.month(),
            session,
            computed_on: date,
            rows: extracted.rows,
            signs: extracted.signs,
        };
        Ok(AstroComputation {
            pattern: self.store.store_astro_pattern(&pattern)?,
            skipped: extracted.skipped,
        })
    }

    pub fn find_astro_pattern(&self, date: NaiveDate, session: Session) -> EngineResult<AstroPattern> {
        self.store
            .find_astro_pattern(date, session)?
            .ok_or_else(|| NotFound::NoDraws.into())
    }
}
