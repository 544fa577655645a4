use chrono::NaiveDate;

use loteria_db::db;
use loteria_db::models::{AstroSign, DrawRecord, Histogram, Pattern, Session, ASTRO_LOTTERY};
use loteria_db::rusqlite::Connection;

pub fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
}

pub fn test_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::migrate(&conn).unwrap();
    conn
}

/// Tirages du 1er janvier, jornada Dia, loterie "Dorado".
pub fn draws_of(numbers: &[&str]) -> Vec<DrawRecord> {
    numbers
        .iter()
        .map(|n| DrawRecord::new(date(1), Session::Day, "Dorado", n))
        .collect()
}

pub fn astro_draw(number: &str, sign: AstroSign) -> DrawRecord {
    DrawRecord::new(date(1), Session::Night, ASTRO_LOTTERY, number).with_sign(sign)
}

pub fn pattern(id: i64, histogram: Histogram) -> Pattern {
    Pattern { id, date: date(1), session: Session::Day, histogram }
}

pub fn insert_all(conn: &Connection, draws: &[DrawRecord]) {
    for draw in draws {
        db::insert_draw(conn, draw).unwrap();
    }
}
