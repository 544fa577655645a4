use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Transaction, TransactionBehavior};
use std::path::Path;

use crate::models::{AstroPattern, AstroSign, DrawRecord, Histogram, Pattern, Session};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    date     TEXT NOT NULL,
    session  TEXT NOT NULL,
    lottery  TEXT NOT NULL,
    number   TEXT NOT NULL,
    sign     TEXT,
    UNIQUE (number, date, session, lottery)
);
CREATE INDEX IF NOT EXISTS idx_draws_date ON draws (date);

CREATE TABLE IF NOT EXISTS patterns (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    date      TEXT NOT NULL,
    session   TEXT NOT NULL,
    histogram TEXT NOT NULL,
    UNIQUE (date, session)
);

CREATE TABLE IF NOT EXISTS astro_patterns (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    year        INTEGER NOT NULL,
    month       INTEGER NOT NULL,
    session     TEXT NOT NULL,
    computed_on TEXT NOT NULL,
    rows        TEXT NOT NULL,
    signs       TEXT NOT NULL,
    UNIQUE (year, month, session)
);
";

/// Filtre de sélection des tirages. Les listes vides ne filtrent rien.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub sessions: Vec<Session>,
    pub lottery: Option<String>,
    pub excluded_lotteries: Vec<String>,
}

impl DrawQuery {
    pub fn on(date: NaiveDate, sessions: Vec<Session>) -> Self {
        Self {
            from: Some(date),
            to: Some(date),
            sessions,
            ..Self::default()
        }
    }

    pub fn accepts(&self, draw: &DrawRecord) -> bool {
        if !self.sessions.is_empty() && !self.sessions.contains(&draw.session) {
            return false;
        }
        if let Some(lottery) = &self.lottery {
            if !draw.is_lottery(lottery) {
                return false;
            }
        }
        !self.excluded_lotteries.iter().any(|name| draw.is_lottery(name))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatternFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub session: Option<Session>,
}

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("loteria.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Impossible d'ouvrir la base {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Échec de la migration")?;
    Ok(())
}

/// Transaction `BEGIN IMMEDIATE` : le verrou d'écriture est pris dès la lecture.
pub fn begin_immediate(conn: &Connection) -> rusqlite::Result<Transaction<'_>> {
    Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
}

pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

// ── Tirages ──

pub fn insert_draw(conn: &Connection, draw: &DrawRecord) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO draws (date, session, lottery, number, sign)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            draw.date,
            draw.session.label(),
            draw.lottery,
            draw.number,
            draw.sign.map(|s| s.name()),
        ],
    ).context("Échec de l'insertion")?;
    Ok(changed > 0)
}

type DrawRow = (i64, NaiveDate, String, String, String, Option<String>);

fn draw_from_row(row: DrawRow) -> Result<DrawRecord> {
    let (id, date, session, lottery, number, sign) = row;
    let sign = match sign.filter(|s| !s.is_empty()) {
        Some(s) => Some(s.parse::<AstroSign>()?),
        None => None,
    };
    Ok(DrawRecord {
        id: Some(id),
        date,
        session: session.parse()?,
        lottery,
        number,
        sign,
    })
}

fn query_draws(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<Vec<DrawRecord>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
        ))
    })?.collect::<Result<Vec<DrawRow>, _>>()?;
    rows.into_iter().map(draw_from_row).collect()
}

pub fn fetch_draws(conn: &Connection, query: &DrawQuery) -> Result<Vec<DrawRecord>> {
    let draws = query_draws(
        conn,
        "SELECT id, date, session, lottery, number, sign FROM draws
         WHERE (?1 IS NULL OR date >= ?1) AND (?2 IS NULL OR date <= ?2)
         ORDER BY date DESC, id DESC",
        rusqlite::params![query.from, query.to],
    ).context("Échec de la lecture des tirages")?;
    Ok(draws.into_iter().filter(|d| query.accepts(d)).collect())
}

pub fn fetch_last_draws(conn: &Connection, limit: u32) -> Result<Vec<DrawRecord>> {
    query_draws(
        conn,
        "SELECT id, date, session, lottery, number, sign FROM draws
         ORDER BY date DESC, id DESC LIMIT ?1",
        [limit],
    )
}

pub fn count_draws(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))?;
    Ok(count)
}

// ── Patrons ──

type PatternRow = (i64, NaiveDate, String, String);

fn pattern_from_row(row: PatternRow) -> Result<Pattern> {
    let (id, date, session, histogram) = row;
    let values: Vec<u32> = serde_json::from_str(&histogram)
        .with_context(|| format!("Histogramme illisible pour le patron {}", id))?;
    let histogram: Histogram = values.try_into().map_err(|v: Vec<u32>| {
        anyhow::anyhow!("Patron {} : {} cases au lieu de 10", id, v.len())
    })?;
    Ok(Pattern {
        id,
        date,
        session: session.parse()?,
        histogram,
    })
}

fn query_patterns(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Pattern>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    })?.collect::<Result<Vec<PatternRow>, _>>()?;
    rows.into_iter().map(pattern_from_row).collect()
}

pub fn find_pattern(conn: &Connection, date: NaiveDate, session: Session) -> Result<Option<Pattern>> {
    let row: Option<PatternRow> = conn.query_row(
        "SELECT id, date, session, histogram FROM patterns WHERE date = ?1 AND session = ?2",
        rusqlite::params![date, session.label()],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
    ).optional()?;
    row.map(pattern_from_row).transpose()
}

pub fn find_pattern_by_id(conn: &Connection, id: i64) -> Result<Option<Pattern>> {
    let row: Option<PatternRow> = conn.query_row(
        "SELECT id, date, session, histogram FROM patterns WHERE id = ?1",
        [id],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
    ).optional()?;
    row.map(pattern_from_row).transpose()
}

/// Insère un patron et renvoie son identifiant. Une clé (date, jornada) déjà
/// présente remonte comme violation de contrainte.
pub fn insert_pattern(
    conn: &Connection,
    date: NaiveDate,
    session: Session,
    histogram: &Histogram,
) -> rusqlite::Result<i64> {
    let json = serde_json::to_string(histogram)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
    conn.execute(
        "INSERT INTO patterns (date, session, histogram) VALUES (?1, ?2, ?3)",
        rusqlite::params![date, session.label(), json],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_pattern_histogram(conn: &Connection, id: i64, histogram: &Histogram) -> rusqlite::Result<()> {
    let json = serde_json::to_string(histogram)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
    conn.execute(
        "UPDATE patterns SET histogram = ?1 WHERE id = ?2",
        rusqlite::params![json, id],
    )?;
    Ok(())
}

pub fn list_patterns(conn: &Connection, filter: &PatternFilter) -> Result<Vec<Pattern>> {
    query_patterns(
        conn,
        "SELECT id, date, session, histogram FROM patterns
         WHERE (?1 IS NULL OR date >= ?1) AND (?2 IS NULL OR date <= ?2)
           AND (?3 IS NULL OR session = ?3)
         ORDER BY id",
        rusqlite::params![filter.from, filter.to, filter.session.map(|s| s.label())],
    ).context("Échec de la lecture des patrons")
}

pub fn count_patterns(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM patterns", [], |row| row.get(0))?;
    Ok(count)
}

// ── Patrons Astro ──

type AstroRow = (i64, i32, u32, String, NaiveDate, String, String);

fn astro_from_row(row: AstroRow) -> Result<AstroPattern> {
    let (id, year, month, session, computed_on, rows, signs) = row;
    Ok(AstroPattern {
        id,
        year,
        month,
        session: session.parse()?,
        computed_on,
        rows: serde_json::from_str(&rows)
            .with_context(|| format!("Lignes illisibles pour le patron Astro {}", id))?,
        signs: serde_json::from_str(&signs)
            .with_context(|| format!("Signes illisibles pour le patron Astro {}", id))?,
    })
}

pub fn find_astro_pattern(
    conn: &Connection,
    year: i32,
    month: u32,
    session: Session,
) -> Result<Option<AstroPattern>> {
    let row: Option<AstroRow> = conn.query_row(
        "SELECT id, year, month, session, computed_on, rows, signs FROM astro_patterns
         WHERE year = ?1 AND month = ?2 AND session = ?3",
        rusqlite::params![year, month, session.label()],
        |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
            ))
        },
    ).optional()?;
    row.map(astro_from_row).transpose()
}

/// Insère ou remplace le patron Astro de (année, mois, jornada). Renvoie son identifiant.
pub fn upsert_astro_pattern(conn: &Connection, pattern: &AstroPattern) -> Result<i64> {
    let rows = serde_json::to_string(&pattern.rows)?;
    let signs = serde_json::to_string(&pattern.signs)?;
    let id: i64 = conn.query_row(
        "INSERT INTO astro_patterns (year, month, session, computed_on, rows, signs)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT (year, month, session)
         DO UPDATE SET computed_on = excluded.computed_on, rows = excluded.rows, signs = excluded.signs
         RETURNING id",
        rusqlite::params![
            pattern.year,
            pattern.month,
            pattern.session.label(),
            pattern.computed_on,
            rows,
            signs,
        ],
        |row| row.get(0),
    ).context("Échec de l'enregistrement du patron Astro")?;
    Ok(id)
}
