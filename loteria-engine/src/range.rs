use std::time::Instant;

use chrono::NaiveDate;
use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use loteria_db::models::{DrawRecord, Histogram, Session};

use crate::engine::PatternEngine;
use crate::error::{EngineError, EngineResult, NotFound};
use crate::histogram::extract_from_draws;
use crate::store::{DrawSource, PatternStore};
use crate::validator::WritePolicy;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitOutcome {
    Stored { id: i64 },
    /// Patron identique déjà enregistré.
    Unchanged,
    /// Aucun tirage pour cette unité.
    Skipped,
    Failed(String),
    /// Échéance atteinte avant cette unité.
    NotAttempted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitReport {
    pub date: NaiveDate,
    pub session: Session,
    pub outcome: UnitOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeReport {
    pub units: Vec<UnitReport>,
}

impl RangeReport {
    fn count(&self, pred: impl Fn(&UnitOutcome) -> bool) -> usize {
        self.units.iter().filter(|u| pred(&u.outcome)).count()
    }

    pub fn stored(&self) -> usize {
        self.count(|o| matches!(o, UnitOutcome::Stored { .. }))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, UnitOutcome::Unchanged))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, UnitOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, UnitOutcome::Failed(_)))
    }

    pub fn not_attempted(&self) -> usize {
        self.count(|o| matches!(o, UnitOutcome::NotAttempted))
    }
}

/// Toutes les paires (date, jornada) de `from` à `to` inclus, dans l'ordre chronologique.
pub fn range_units(from: NaiveDate, to: NaiveDate, sessions: &[Session]) -> Vec<(NaiveDate, Session)> {
    from.iter_days()
        .take_while(|d| *d <= to)
        .flat_map(|d| sessions.iter().map(move |&s| (d, s)))
        .collect()
}

fn expired(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

fn outcome_of(date: NaiveDate, session: Session, result: EngineResult<i64>) -> UnitOutcome {
    match result {
        Ok(id) => UnitOutcome::Stored { id },
        Err(e) if e.is_duplicate() => {
            log::info!("{} {} : patron inchangé", date, session);
            UnitOutcome::Unchanged
        }
        Err(EngineError::NotFound(NotFound::NoDraws)) => {
            log::info!("{} {} : aucun tirage", date, session);
            UnitOutcome::Skipped
        }
        Err(e) => {
            log::warn!("{} {} : échec du calcul : {}", date, session, e);
            UnitOutcome::Failed(e.to_string())
        }
    }
}

/// Recalcule les patrons de chaque (date, jornada) de la plage. Sans jornada
/// demandée, seules les jornadas logiques de la configuration sont parcourues.
/// Une unité en échec n'interrompt pas les autres ; passé `deadline`, les
/// unités restantes ne sont plus écrites.
pub fn compute_range<S>(
    engine: &PatternEngine<'_, S>,
    from: NaiveDate,
    to: NaiveDate,
    sessions: &[Session],
    deadline: Option<Instant>,
    progress: &ProgressBar,
) -> RangeReport
where
    S: DrawSource + PatternStore,
{
    let logical;
    let sessions = if sessions.is_empty() {
        logical = engine.config().logical_sessions();
        &logical[..]
    } else {
        sessions
    };
    let units = range_units(from, to, sessions);
    progress.set_length(units.len() as u64);

    // Lecture séquentielle : la connexion n'est pas partagée entre threads.
    let fetched: Vec<Option<EngineResult<Vec<DrawRecord>>>> = units
        .iter()
        .map(|&(date, session)| {
            if expired(deadline) {
                None
            } else {
                Some(engine.daily_draws(date, session))
            }
        })
        .collect();

    let extracted: Vec<Option<EngineResult<Histogram>>> = fetched
        .into_par_iter()
        .map(|draws| {
            let histogram = draws.map(|d| d.and_then(|draws| extract_from_draws(&draws)));
            progress.inc(1);
            histogram
        })
        .collect();

    let mut report = RangeReport::default();
    for (&(date, session), histogram) in units.iter().zip(extracted) {
        let outcome = match histogram {
            Some(_) if expired(deadline) => UnitOutcome::NotAttempted,
            None => UnitOutcome::NotAttempted,
            Some(histogram) => {
                let stored = histogram.and_then(|h| {
                    engine
                        .store()
                        .store_pattern(date, session, &h, WritePolicy::Recompute)
                        .map(|p| p.id)
                });
                outcome_of(date, session, stored)
            }
        };
        report.units.push(UnitReport { date, session, outcome });
    }
    progress.finish_and_clear();

    let not_attempted = report.not_attempted();
    if not_attempted > 0 {
        log::warn!("Échéance atteinte : {} unité(s) non traitée(s)", not_attempted);
    }
    log::info!(
        "Plage {} → {} : {} enregistré(s), {} inchangé(s), {} sans tirage, {} échec(s)",
        from,
        to,
        report.stored(),
        report.unchanged(),
        report.skipped(),
        report.failed(),
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::test_support::{date, insert_all, test_conn};
    use loteria_db::db;

    fn draw(d: u32, session: Session, number: &str) -> DrawRecord {
        DrawRecord::new(date(d), session, "Dorado", number)
    }

    #[test]
    fn test_range_units_order() {
        let units = range_units(date(1), date(2), &[Session::Day, Session::Night]);
        assert_eq!(units, vec![
            (date(1), Session::Day),
            (date(1), Session::Night),
            (date(2), Session::Day),
            (date(2), Session::Night),
        ]);
        assert!(range_units(date(3), date(2), &[Session::Day]).is_empty());
    }

    #[test]
    fn test_range_partial_failures() {
        let conn = test_conn();
        insert_all(&conn, &[
            draw(1, Session::Night, "1234"),
            draw(2, Session::Night, "5678"),
            draw(3, Session::Night, "9012"),
        ]);
        let config = EngineConfig::default();
        let engine = PatternEngine::new(&conn, &config);
        // le 2 janvier existe déjà à l'identique
        engine.compute_pattern(date(2), Session::Night).unwrap();

        let report = compute_range(
            &engine,
            date(1),
            date(4),
            &[Session::Night],
            None,
            &ProgressBar::hidden(),
        );
        assert_eq!(report.units.len(), 4);
        assert_eq!(report.stored(), 2);
        assert_eq!(report.unchanged(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 0);
        assert_eq!(report.units[3].outcome, UnitOutcome::Skipped);
        assert_eq!(db::count_patterns(&conn).unwrap(), 3);
    }

    #[test]
    fn test_range_malformed_number_fails_one_unit() {
        let conn = test_conn();
        insert_all(&conn, &[draw(1, Session::Day, "12a4"), draw(2, Session::Day, "1234")]);
        let config = EngineConfig::default();
        let engine = PatternEngine::new(&conn, &config);

        let report = compute_range(&engine, date(1), date(2), &[Session::Day], None, &ProgressBar::hidden());
        assert!(matches!(report.units[0].outcome, UnitOutcome::Failed(_)));
        assert!(matches!(report.units[1].outcome, UnitOutcome::Stored { .. }));
    }

    #[test]
    fn test_default_range_counts_each_draw_once() {
        let conn = test_conn();
        insert_all(&conn, &[
            draw(1, Session::Day, "111"),
            draw(1, Session::Afternoon, "222"),
            draw(1, Session::Night, "3333"),
        ]);
        let config = EngineConfig::default();
        let engine = PatternEngine::new(&conn, &config);

        let report = compute_range(&engine, date(1), date(1), &[], None, &ProgressBar::hidden());
        let sessions: Vec<Session> = report.units.iter().map(|u| u.session).collect();
        assert_eq!(sessions, vec![Session::Day, Session::Night]);
        assert_eq!(report.stored(), 2);

        let patterns = db::list_patterns(&conn, &db::PatternFilter::default()).unwrap();
        assert!(patterns.iter().all(|p| p.session != Session::Afternoon));
        let counted: u32 = patterns.iter().flat_map(|p| p.histogram.iter()).sum();
        assert_eq!(counted, 10);
    }

    #[test]
    fn test_range_expired_deadline() {
        let conn = test_conn();
        insert_all(&conn, &[draw(1, Session::Night, "1234")]);
        let config = EngineConfig::default();
        let engine = PatternEngine::new(&conn, &config);

        let report = compute_range(
            &engine,
            date(1),
            date(3),
            &[],
            Some(Instant::now()),
            &ProgressBar::hidden(),
        );
        assert_eq!(report.units.len(), 6);
        assert_eq!(report.not_attempted(), 6);
        assert_eq!(db::count_patterns(&conn).unwrap(), 0);
    }
}
