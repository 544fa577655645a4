use std::collections::{HashMap, HashSet};

use chrono::{Datelike, Days, NaiveDate};

/// Dimanche de Pâques (algorithme de Meeus/Jones/Butcher).
pub fn easter_sunday(year: i32) -> NaiveDate {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, 4, 1).unwrap_or_default())
}

/// Loi Emiliani : le férié est reporté au lundi suivant.
fn next_monday(date: NaiveDate) -> NaiveDate {
    let offset = (7 - date.weekday().num_days_from_monday()) % 7;
    date + Days::new(offset as u64)
}

fn shift(date: NaiveDate, days: i64) -> NaiveDate {
    date + chrono::Duration::days(days)
}

/// Jours fériés officiels colombiens d'une année.
pub fn colombian_holidays(year: i32) -> HashSet<NaiveDate> {
    let ymd = |m: u32, d: u32| NaiveDate::from_ymd_opt(year, m, d).unwrap_or_default();
    let easter = easter_sunday(year);

    let mut holidays = HashSet::new();

    // Dates fixes
    for (m, d) in [(1, 1), (5, 1), (7, 20), (8, 7), (12, 8), (12, 25)] {
        holidays.insert(ymd(m, d));
    }

    // Semaine sainte
    holidays.insert(shift(easter, -3));
    holidays.insert(shift(easter, -2));

    // Reportées au lundi
    for (m, d) in [(1, 6), (3, 19), (6, 29), (8, 15), (10, 12), (11, 1), (11, 11)] {
        holidays.insert(next_monday(ymd(m, d)));
    }

    // Ascension, Corpus Christi, Sacré-Cœur
    for offset in [40, 61, 68] {
        holidays.insert(next_monday(shift(easter, offset)));
    }

    holidays
}

/// Cache explicite des fériés, une entrée par année.
#[derive(Debug, Default)]
pub struct HolidayCache {
    years: HashMap<i32, HashSet<NaiveDate>>,
}

impl HolidayCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holidays(&mut self, year: i32) -> &HashSet<NaiveDate> {
        self.years.entry(year).or_insert_with(|| colombian_holidays(year))
    }

    pub fn is_holiday(&mut self, date: NaiveDate) -> bool {
        self.holidays(date.year()).contains(&date)
    }

    pub fn invalidate(&mut self, year: i32) {
        self.years.remove(&year);
    }

    pub fn clear(&mut self) {
        self.years.clear();
    }

    pub fn cached_years(&self) -> usize {
        self.years.len()
    }
}
