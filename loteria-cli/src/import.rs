use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use loteria_db::rusqlite::Connection;
use std::io::Read;
use std::path::Path;

use loteria_db::db::insert_draw;
use loteria_db::holidays::HolidayCache;
use loteria_db::models::{AstroSign, DrawRecord, Session, validate_draw};
use loteria_db::naming::resolve_lottery;

/// "PIJAO DE ORO" -> "Pijao De Oro"
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .with_context(|| format!("Format de date invalide: '{}'", raw))
}

fn parse_record(record: &csv::StringRecord, holidays: &mut HolidayCache) -> Result<DrawRecord> {
    let get = |idx: usize| -> String {
        record.get(idx).map(|s| s.trim().to_string()).unwrap_or_default()
    };

    let number = get(0);
    let full_name = title_case(&get(1));
    let raw_sign = get(2);
    let raw_session = get(3);
    let date = parse_date(&get(4))?;

    let (lottery, resolved) = resolve_lottery(&full_name, date, holidays);
    let session = if raw_session.is_empty() {
        match resolved {
            Some(session) => session,
            None => bail!("Jornada introuvable pour '{}'", full_name),
        }
    } else {
        raw_session.parse::<Session>()?
    };

    let mut draw = DrawRecord::new(date, session, &lottery, &number);
    if !raw_sign.is_empty() {
        draw = draw.with_sign(title_case(&raw_sign).parse::<AstroSign>()?);
    }
    validate_draw(&draw)?;
    Ok(draw)
}

pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

pub fn import_csv(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;
    import_reader(conn, file)
}

pub fn import_reader<R: Read>(conn: &Connection, input: R) -> Result<ImportResult> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(input);

    let tx = conn.unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    let mut holidays = HolidayCache::new();
    let mut result = ImportResult {
        total_records: 0,
        inserted: 0,
        skipped: 0,
        errors: 0,
    };

    for record_result in reader.records() {
        result.total_records += 1;
        let line = result.total_records;
        let draw = record_result
            .context("Erreur de lecture")
            .and_then(|record| parse_record(&record, &mut holidays));
        match draw {
            Ok(draw) => match insert_draw(&tx, &draw) {
                Ok(true) => result.inserted += 1,
                Ok(false) => result.skipped += 1,
                Err(e) => {
                    log::warn!("Erreur insertion ligne {}: {:#}", line, e);
                    result.errors += 1;
                }
            },
            Err(e) => {
                log::warn!("Ligne {} ignorée: {:#}", line, e);
                result.errors += 1;
            }
        }
    }

    tx.commit().context("Échec du commit")?;
    log::info!(
        "Import : {} insérés, {} doublons, {} erreurs ({} années de fériés en cache)",
        result.inserted,
        result.skipped,
        result.errors,
        holidays.cached_years(),
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loteria_db::db::{count_draws, fetch_last_draws, migrate};

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("PIJAO DE ORO"), "Pijao De Oro");
        assert_eq!(title_case("  chontico   noche "), "Chontico Noche");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_parse_date() {
        let expected = NaiveDate::from_ymd_opt(2026, 2, 17).unwrap();
        assert_eq!(parse_date("17/02/2026").unwrap(), expected);
        assert_eq!(parse_date("2026-02-17").unwrap(), expected);
        assert!(parse_date("2026/02/17").is_err());
    }

    #[test]
    fn test_import_rows() {
        let conn = test_conn();
        let csv = "number;lottery;sign;session;date\n\
                   1234;DORADO;;dia;2025-01-02\n\
                   1234;DORADO;;dia;2025-01-02\n\
                   5678;chontico noche;;;02/01/2025\n\
                   0917;astro;leo;noche;2025-01-02\n\
                   12a4;Dorado;;dia;2025-01-02\n\
                   999;Saman;;;2025-01-05\n";
        let result = import_reader(&conn, csv.as_bytes()).unwrap();

        assert_eq!(result.total_records, 6);
        assert_eq!(result.inserted, 4);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.errors, 1);
        assert_eq!(count_draws(&conn).unwrap(), 4);

        let draws = fetch_last_draws(&conn, 10).unwrap();
        let saman = draws.iter().find(|d| d.lottery == "Saman").unwrap();
        // 5 janvier 2025 : dimanche
        assert_eq!(saman.session, Session::Night);
        let chontico = draws.iter().find(|d| d.number == "5678").unwrap();
        assert_eq!(chontico.lottery, "Chontico");
        assert_eq!(chontico.session, Session::Night);
        let astro = draws.iter().find(|d| d.lottery == "Astro").unwrap();
        assert_eq!(astro.sign, Some(AstroSign::Leo));
    }

    #[test]
    fn test_astro_without_sign_rejected() {
        let conn = test_conn();
        let csv = "number;lottery;sign;session;date\n0917;Astro;;noche;2025-01-02\n";
        let result = import_reader(&conn, csv.as_bytes()).unwrap();
        assert_eq!(result.errors, 1);
        assert_eq!(count_draws(&conn).unwrap(), 0);
    }
}
