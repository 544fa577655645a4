mod display;
mod import;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use loteria_db::db::{PatternFilter, count_draws, db_path, fetch_last_draws, migrate, open_db};
use loteria_db::models::{PatternCandidate, Session};
use loteria_db::rusqlite::Connection;
use loteria_engine::config::{EngineConfig, load_or_default, save_config};
use loteria_engine::range::compute_range;
use loteria_engine::store::PatternStore;
use loteria_engine::void::VoidMode;
use loteria_engine::{EngineError, EngineResult, PatternEngine};

use crate::display::{
    display_astro, display_draws, display_import_summary, display_pattern, display_patterns,
    display_range_report, display_redundancy, display_unplayed, display_void_matches,
};

#[derive(Parser)]
#[command(name = "loteria", about = "Analyse des patrons de chiffres des loteries colombiennes")]
struct Cli {
    /// Fichier de configuration JSON (valeurs par défaut s'il est absent)
    #[arg(long, global = true, default_value = "loteria.json")]
    config: PathBuf,

    /// Chemin de la base SQLite (défaut : ./data/loteria.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Importer les tirages depuis un fichier CSV (séparateur ';')
    Import {
        /// Chemin vers le fichier CSV
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Afficher le chemin de la base de données
    DbPath,

    /// Lister les derniers tirages
    List {
        /// Nombre de tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Calculer et enregistrer le patron d'une date et d'une jornada
    Pattern {
        /// Date (AAAA-MM-JJ)
        date: NaiveDate,
        #[arg(value_enum)]
        session: Session,
    },

    /// Enregistrer un patron saisi à la main
    Create {
        date: NaiveDate,
        #[arg(value_enum)]
        session: Session,
        /// Les 10 fréquences, séparées par des virgules (chiffres 0 à 9)
        #[arg(value_delimiter = ',', required = true)]
        histogram: Vec<u32>,
    },

    /// Recalculer les patrons d'une plage de dates
    Range {
        from: NaiveDate,
        to: NaiveDate,
        /// Jornadas à traiter (toutes par défaut)
        #[arg(short, long, value_enum, value_delimiter = ',')]
        sessions: Vec<Session>,
        /// Durée maximale en secondes
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Calculer le patron Astro du mois d'une date
    Astro {
        date: NaiveDate,
        #[arg(value_enum, default_value = "noche")]
        session: Session,
    },

    /// Lister les patrons enregistrés
    Patterns {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(short, long, value_enum)]
        session: Option<Session>,
    },

    /// Patrons redondants avec un patron donné
    Redundancy {
        /// Identifiant du patron de référence
        id: i64,
    },

    /// Patrons partageant les positions vides d'un patron donné
    Voids {
        id: i64,
        /// Mode de comparaison (celui de la configuration par défaut)
        #[arg(short, long, value_enum)]
        mode: Option<VoidMode>,
    },

    /// Rechercher les tirages d'un numéro (permutations et 3 derniers chiffres)
    Search {
        number: String,
    },

    /// Numéros jamais sortis par position pour une date et une jornada
    Unplayed {
        date: NaiveDate,
        #[arg(value_enum)]
        session: Session,
    },

    /// Afficher la configuration effective
    Config {
        /// Écrire la configuration dans le fichier --config
        #[arg(long)]
        write: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = load_or_default(&cli.config)?;
    let path = cli.db.clone().unwrap_or_else(db_path);

    match cli.command {
        Command::DbPath => {
            println!("{}", path.display());
            return Ok(());
        }
        Command::Config { write } => return cmd_config(&config, &cli.config, write),
        _ => {}
    }

    let conn = open_db(&path)?;
    migrate(&conn)?;
    let engine = PatternEngine::new(&conn, &config);

    match cli.command {
        Command::Import { file } => cmd_import(&conn, &file),
        Command::List { last } => cmd_list(&conn, last),
        Command::Pattern { date, session } => cmd_pattern(&engine, date, session),
        Command::Create { date, session, histogram } => {
            let candidate = PatternCandidate { date, session, histogram };
            if let Some(pattern) = not_found_as_message(engine.create_pattern(&candidate))? {
                display_pattern(&pattern);
            }
            Ok(())
        }
        Command::Range { from, to, sessions, timeout } => cmd_range(&engine, from, to, &sessions, timeout),
        Command::Astro { date, session } => {
            if let Some(astro) = not_found_as_message(engine.compute_astro_pattern(date, session))? {
                display_astro(&astro);
            }
            Ok(())
        }
        Command::Patterns { from, to, session } => {
            let patterns = conn.list_patterns(&PatternFilter { from, to, session })?;
            display_patterns(&patterns);
            Ok(())
        }
        Command::Redundancy { id } => cmd_redundancy(&engine, id),
        Command::Voids { id, mode } => cmd_voids(&engine, id, mode),
        Command::Search { number } => {
            if let Some(draws) = not_found_as_message(engine.search_by_number(&number))? {
                display_draws(&draws);
            }
            Ok(())
        }
        Command::Unplayed { date, session } => {
            if let Some(numbers) = not_found_as_message(engine.compute_unplayed_numbers(date, session))? {
                display_unplayed(&numbers);
            }
            Ok(())
        }
        Command::DbPath | Command::Config { .. } => Ok(()),
    }
}

/// Les résultats introuvables sont un message, pas une erreur.
fn not_found_as_message<T>(result: EngineResult<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(EngineError::NotFound(reason)) => {
            println!("Rien à afficher : {}.", reason);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_config(config: &EngineConfig, path: &Path, write: bool) -> Result<()> {
    if write {
        save_config(config, path)?;
        println!("Configuration écrite dans {}", path.display());
    } else {
        println!("{}", serde_json::to_string_pretty(config)?);
    }
    Ok(())
}

fn cmd_import(conn: &Connection, file: &Path) -> Result<()> {
    let result = import::import_csv(conn, file)?;
    display_import_summary(&result);
    Ok(())
}

fn cmd_list(conn: &Connection, last: u32) -> Result<()> {
    let n = count_draws(conn)?;
    if n == 0 {
        println!("Base vide. Lancez d'abord : loteria import --file <fichier.csv>");
        return Ok(());
    }
    let draws = fetch_last_draws(conn, last)?;
    display_draws(&draws);
    Ok(())
}

fn cmd_redundancy(engine: &PatternEngine<'_, Connection>, id: i64) -> Result<()> {
    let Some(reference) = not_found_as_message(engine.load_pattern(id))? else {
        return Ok(());
    };
    if let Some(results) = not_found_as_message(engine.compute_redundancy(&reference))? {
        display_redundancy(&reference, &results);
    }
    Ok(())
}

fn cmd_voids(engine: &PatternEngine<'_, Connection>, id: i64, mode: Option<VoidMode>) -> Result<()> {
    let Some(reference) = not_found_as_message(engine.load_pattern(id))? else {
        return Ok(());
    };
    let mode = mode.unwrap_or(engine.config().void_mode);
    if let Some(matches) = not_found_as_message(engine.void_matches_of(&reference, Some(mode)))? {
        display_void_matches(&reference, &matches, mode);
    }
    Ok(())
}

fn cmd_pattern(engine: &PatternEngine<'_, Connection>, date: NaiveDate, session: Session) -> Result<()> {
    match engine.compute_pattern(date, session) {
        Ok(pattern) => display_pattern(&pattern),
        Err(e) if e.is_duplicate() => {
            println!("Patron inchangé : {}", e);
            if let Some(existing) = engine.store().find_pattern(date, session)? {
                display_pattern(&existing);
            }
        }
        Err(e) => {
            not_found_as_message::<()>(Err(e))?;
        }
    }
    Ok(())
}

fn cmd_range(
    engine: &PatternEngine<'_, Connection>,
    from: NaiveDate,
    to: NaiveDate,
    sessions: &[Session],
    timeout: Option<u64>,
) -> Result<()> {
    if from > to {
        bail!("Plage invalide : {} est après {}", from, to);
    }

    let deadline = timeout.map(|secs| Instant::now() + Duration::from_secs(secs));
    let pb = ProgressBar::new(0);
    pb.set_style(ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
        .progress_chars("=> "));

    let start = Instant::now();
    let report = compute_range(engine, from, to, sessions, deadline, &pb);
    display_range_report(&report);
    println!("  Durée         : {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use loteria_engine::NotFound;

    #[test]
    fn test_cli_parses_commands() {
        let cli = Cli::try_parse_from(["loteria", "pattern", "2025-01-02", "dia"]).unwrap();
        assert!(matches!(cli.command, Command::Pattern { session: Session::Day, .. }));
        assert_eq!(cli.config, PathBuf::from("loteria.json"));

        let cli = Cli::try_parse_from(["loteria", "create", "2025-01-02", "noche", "1,0,2,0,0,0,0,0,0,3"]).unwrap();
        match cli.command {
            Command::Create { histogram, .. } => assert_eq!(histogram.len(), 10),
            _ => panic!("commande inattendue"),
        }

        let cli = Cli::try_parse_from([
            "loteria", "--db", "/tmp/x.db", "range", "2025-01-01", "2025-01-31", "-s", "dia,noche",
        ]).unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        match cli.command {
            Command::Range { sessions, .. } => assert_eq!(sessions, vec![Session::Day, Session::Night]),
            _ => panic!("commande inattendue"),
        }

        let cli = Cli::try_parse_from(["loteria", "voids", "4", "--mode", "partial"]).unwrap();
        assert!(matches!(cli.command, Command::Voids { id: 4, mode: Some(VoidMode::Partial) }));
    }

    #[test]
    fn test_unknown_pattern_id_is_a_message() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        let config = EngineConfig::default();
        let engine = PatternEngine::new(&conn, &config);

        assert!(cmd_redundancy(&engine, 42).is_ok());
        assert!(cmd_voids(&engine, 42, None).is_ok());
        assert!(cmd_voids(&engine, 42, Some(VoidMode::Partial)).is_ok());
    }

    #[test]
    fn test_not_found_is_not_an_error() {
        let result: EngineResult<u32> = Err(NotFound::NoDraws.into());
        assert_eq!(not_found_as_message(result).unwrap(), None);
        assert_eq!(not_found_as_message(Ok(3)).unwrap(), Some(3));
    }
}
