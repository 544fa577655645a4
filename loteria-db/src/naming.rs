use chrono::{Datelike, NaiveDate, Weekday};

use crate::holidays::HolidayCache;
use crate::models::{fold_accents, Session};

/// Suffixes publiés après le nom de la loterie, dans l'ordre de vérification.
const SUFFIXES: [(&str, Session, bool); 9] = [
    ("Noche", Session::Night, true),
    ("Tarde", Session::Afternoon, true),
    ("Mañana", Session::Day, true),
    ("Día", Session::Day, true),
    ("1", Session::Day, true),
    ("2", Session::Afternoon, true),
    // "3" reste dans le nom de la loterie
    ("3", Session::Night, false),
    ("Sol", Session::Day, true),
    ("Luna", Session::Night, true),
];

/// Sépare "Chontico Noche" en ("Chontico", Some(Night)). Sans suffixe connu,
/// le nom est renvoyé tel quel avec `None`.
pub fn split_lottery_name(full_name: &str) -> (String, Option<Session>) {
    let full = full_name.trim();
    for (suffix, session, strip) in SUFFIXES {
        if let Some(rest) = full.strip_suffix(suffix) {
            let name = if strip && rest.ends_with(char::is_whitespace) {
                rest.trim().to_string()
            } else {
                full.to_string()
            };
            return (name, Some(session));
        }
    }
    (full.to_string(), None)
}

/// Règles de calendrier pour les loteries publiées sans suffixe de jornada.
pub fn infer_session(lottery: &str, date: NaiveDate, holidays: &mut HolidayCache) -> Option<Session> {
    let name = fold_accents(lottery.trim()).to_lowercase();
    let weekday = date.weekday();
    let holiday = holidays.is_holiday(date);

    let session = match name.as_str() {
        "saman" => {
            if weekday == Weekday::Sun || holiday {
                Session::Night
            } else {
                Session::Day
            }
        }
        "pijao de oro" => {
            if matches!(weekday, Weekday::Sat | Weekday::Sun) || holiday {
                Session::Night
            } else {
                Session::Day
            }
        }
        _ => return None,
    };

    log::info!(
        "Règle de calendrier appliquée : {} ({} {:?} férié={}) -> {}",
        lottery, date, weekday, holiday, session
    );
    Some(session)
}

/// Nom et jornada d'un résultat publié : suffixe d'abord, calendrier ensuite.
pub fn resolve_lottery(
    full_name: &str,
    date: NaiveDate,
    holidays: &mut HolidayCache,
) -> (String, Option<Session>) {
    let (name, session) = split_lottery_name(full_name);
    match session {
        Some(s) => (name, Some(s)),
        None => {
            let inferred = infer_session(&name, date, holidays);
            if inferred.is_none() {
                log::warn!("Jornada indéterminée pour '{}' du {}", full_name, date);
            }
            (name, inferred)
        }
    }
}
