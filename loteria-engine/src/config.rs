use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use loteria_db::db::DrawQuery;
use loteria_db::models::{Session, ASTRO_LOTTERY};

use crate::void::VoidMode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Jornada logique -> libellés agrégés (ex. Dia = Dia + Tarde).
    pub session_aliases: BTreeMap<Session, Vec<Session>>,
    /// Loteries exclues des patrons journaliers (familles de jeux disjointes).
    pub excluded_lotteries: Vec<String>,
    pub astro_lottery: String,
    /// Nombre de cases égales à dépasser pour qu'un patron soit redondant.
    pub redundancy_threshold: usize,
    pub void_mode: VoidMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            session_aliases: BTreeMap::from([(Session::Day, vec![Session::Day, Session::Afternoon])]),
            excluded_lotteries: vec![ASTRO_LOTTERY.to_string()],
            astro_lottery: ASTRO_LOTTERY.to_string(),
            redundancy_threshold: 3,
            void_mode: VoidMode::Exact,
        }
    }
}

impl EngineConfig {
    pub fn sessions_for(&self, session: Session) -> Vec<Session> {
        match self.session_aliases.get(&session) {
            Some(aliases) if !aliases.is_empty() => aliases.clone(),
            _ => vec![session],
        }
    }

    /// Jornadas qui ne sont pas agrégées dans une autre (Dia et Noche par défaut).
    pub fn logical_sessions(&self) -> Vec<Session> {
        Session::ALL
            .into_iter()
            .filter(|&session| {
                !self
                    .session_aliases
                    .iter()
                    .any(|(&logical, aliases)| logical != session && aliases.contains(&session))
            })
            .collect()
    }

    /// Tirages contribuant au patron journalier de (date, jornada).
    pub fn daily_query(&self, date: NaiveDate, session: Session) -> DrawQuery {
        DrawQuery {
            excluded_lotteries: self.excluded_lotteries.clone(),
            ..DrawQuery::on(date, self.sessions_for(session))
        }
    }

    /// Tirages Astro du mois calendaire de `date`.
    pub fn astro_month_query(&self, date: NaiveDate, session: Session) -> DrawQuery {
        let (first, last) = month_bounds(date);
        DrawQuery {
            from: Some(first),
            to: Some(last),
            sessions: self.sessions_for(session),
            lottery: Some(self.astro_lottery.clone()),
            excluded_lotteries: Vec::new(),
        }
    }
}

/// Premier et dernier jour du mois de `date`.
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = date.with_day(1).unwrap_or(date);
    let next_first = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    };
    let last = next_first.and_then(|d| d.pred_opt()).unwrap_or(date);
    (first, last)
}

pub fn save_config(config: &EngineConfig, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)
        .with_context(|| format!("Impossible d'écrire {:?}", path))?;
    Ok(())
}

pub fn load_config(path: &Path) -> Result<EngineConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {:?}", path))?;
    let config: EngineConfig = serde_json::from_str(&json)
        .with_context(|| format!("JSON invalide dans {:?}", path))?;
    Ok(config)
}

/// Configuration du fichier s'il existe, défauts sinon.
pub fn load_or_default(path: &Path) -> Result<EngineConfig> {
    if path.exists() {
        load_config(path)
    } else {
        log::debug!("Pas de configuration {:?}, valeurs par défaut", path);
        Ok(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.redundancy_threshold, 3);
        assert_eq!(config.void_mode, VoidMode::Exact);
        assert_eq!(config.sessions_for(Session::Day), vec![Session::Day, Session::Afternoon]);
        assert_eq!(config.sessions_for(Session::Night), vec![Session::Night]);
    }

    #[test]
    fn test_logical_sessions() {
        let mut config = EngineConfig::default();
        assert_eq!(config.logical_sessions(), vec![Session::Day, Session::Night]);

        config.session_aliases.clear();
        assert_eq!(config.logical_sessions(), Session::ALL.to_vec());
    }

    #[test]
    fn test_daily_query_uses_aliases_and_exclusions() {
        let config = EngineConfig::default();
        let query = config.daily_query(ymd(2025, 2, 3), Session::Day);
        assert_eq!(query.from, Some(ymd(2025, 2, 3)));
        assert_eq!(query.to, Some(ymd(2025, 2, 3)));
        assert_eq!(query.sessions, vec![Session::Day, Session::Afternoon]);
        assert_eq!(query.excluded_lotteries, vec!["Astro".to_string()]);
        assert_eq!(query.lottery, None);
    }

    #[test]
    fn test_month_bounds() {
        assert_eq!(month_bounds(ymd(2024, 2, 14)), (ymd(2024, 2, 1), ymd(2024, 2, 29)));
        assert_eq!(month_bounds(ymd(2025, 12, 31)), (ymd(2025, 12, 1), ymd(2025, 12, 31)));
    }

    #[test]
    fn test_astro_month_query() {
        let config = EngineConfig::default();
        let query = config.astro_month_query(ymd(2025, 4, 17), Session::Night);
        assert_eq!(query.from, Some(ymd(2025, 4, 1)));
        assert_eq!(query.to, Some(ymd(2025, 4, 30)));
        assert_eq!(query.lottery.as_deref(), Some("Astro"));
        assert!(query.excluded_lotteries.is_empty());
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let mut config = EngineConfig::default();
        config.redundancy_threshold = 5;
        config.void_mode = VoidMode::Partial;
        let json = serde_json::to_string(&config).unwrap();
        let restored: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let restored: EngineConfig = serde_json::from_str(r#"{"redundancy_threshold": 6}"#).unwrap();
        assert_eq!(restored.redundancy_threshold, 6);
        assert_eq!(restored.astro_lottery, "Astro");
        assert_eq!(restored.sessions_for(Session::Day).len(), 2);
    }
}
