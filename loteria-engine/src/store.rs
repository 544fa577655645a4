use chrono::{Datelike, NaiveDate};

use loteria_db::db::{self, DrawQuery, PatternFilter};
use loteria_db::models::{AstroPattern, DrawRecord, Histogram, Pattern, Session};
use loteria_db::rusqlite::Connection;

use crate::error::{EngineError, EngineResult};
use crate::validator::{decide, WriteAction, WritePolicy};

/// Source des tirages (collaborateur de requête).
pub trait DrawSource {
    fn fetch_draws(&self, query: &DrawQuery) -> EngineResult<Vec<DrawRecord>>;
}

/// Stockage des patrons. `store_pattern` lit, décide et écrit de façon atomique.
pub trait PatternStore {
    fn find_pattern(&self, date: NaiveDate, session: Session) -> EngineResult<Option<Pattern>>;
    fn find_pattern_by_id(&self, id: i64) -> EngineResult<Option<Pattern>>;
    fn list_patterns(&self, filter: &PatternFilter) -> EngineResult<Vec<Pattern>>;
    fn store_pattern(
        &self,
        date: NaiveDate,
        session: Session,
        histogram: &Histogram,
        policy: WritePolicy,
    ) -> EngineResult<Pattern>;
    fn find_astro_pattern(&self, date: NaiveDate, session: Session) -> EngineResult<Option<AstroPattern>>;
    fn store_astro_pattern(&self, pattern: &AstroPattern) -> EngineResult<AstroPattern>;
}

/// Exécute l'écriture décidée. Une clé prise entre la lecture et l'insertion
/// devient `Conflict`.
fn apply_write(
    conn: &Connection,
    date: NaiveDate,
    session: Session,
    histogram: &Histogram,
    action: WriteAction,
) -> EngineResult<i64> {
    match action {
        WriteAction::Insert => match db::insert_pattern(conn, date, session, histogram) {
            Ok(id) => Ok(id),
            Err(e) if db::is_unique_violation(&e) => Err(EngineError::Conflict { date, session }),
            Err(e) => Err(e.into()),
        },
        WriteAction::Overwrite { id } => {
            db::update_pattern_histogram(conn, id, histogram)?;
            Ok(id)
        }
    }
}

impl DrawSource for Connection {
    fn fetch_draws(&self, query: &DrawQuery) -> EngineResult<Vec<DrawRecord>> {
        Ok(db::fetch_draws(self, query)?)
    }
}

impl PatternStore for Connection {
    fn find_pattern(&self, date: NaiveDate, session: Session) -> EngineResult<Option<Pattern>> {
        Ok(db::find_pattern(self, date, session)?)
    }

    fn find_pattern_by_id(&self, id: i64) -> EngineResult<Option<Pattern>> {
        Ok(db::find_pattern_by_id(self, id)?)
    }

    fn list_patterns(&self, filter: &PatternFilter) -> EngineResult<Vec<Pattern>> {
        Ok(db::list_patterns(self, filter)?)
    }

    fn store_pattern(
        &self,
        date: NaiveDate,
        session: Session,
        histogram: &Histogram,
        policy: WritePolicy,
    ) -> EngineResult<Pattern> {
        let tx = db::begin_immediate(self)?;
        let existing = db::find_pattern(&tx, date, session)?;
        let action = decide(date, session, histogram, existing.as_ref(), policy)?;

        let id = apply_write(&tx, date, session, histogram, action)?;
        tx.commit()?;

        Ok(Pattern { id, date, session, histogram: *histogram })
    }

    fn find_astro_pattern(&self, date: NaiveDate, session: Session) -> EngineResult<Option<AstroPattern>> {
        Ok(db::find_astro_pattern(self, date.year(), date.month(), session)?)
    }

    fn store_astro_pattern(&self, pattern: &AstroPattern) -> EngineResult<AstroPattern> {
        let id = db::upsert_astro_pattern(self, pattern)?;
        Ok(AstroPattern { id, ..pattern.clone() })
    }
}
