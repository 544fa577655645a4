use comfy_table::{Table, ContentArrangement, presets::UTF8_FULL, Cell, Color};
use textplots::Plot;

use crate::import::ImportResult;
use loteria_db::models::{AstroSign, DrawRecord, Histogram, Pattern, DIGITS};
use loteria_engine::engine::AstroComputation;
use loteria_engine::range::{RangeReport, UnitOutcome};
use loteria_engine::redundancy::RedundancyResult;
use loteria_engine::void::{SlotComparison, VoidMatch, VoidMode};

fn new_table(header: Vec<String>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn digit_header(first: &[&str]) -> Vec<String> {
    first
        .iter()
        .map(|s| s.to_string())
        .chain((0..DIGITS).map(|d| d.to_string()))
        .collect()
}

fn histogram_cells(histogram: &Histogram) -> impl Iterator<Item = Cell> + '_ {
    histogram.iter().map(|&count| {
        let cell = Cell::new(count);
        if count == 0 { cell.fg(Color::DarkGrey) } else { cell }
    })
}

pub fn display_draws(draws: &[DrawRecord]) {
    if draws.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let mut table = new_table(
        ["Date", "Jornada", "Loterie", "Numéro", "Signe"].map(String::from).to_vec(),
    );
    for draw in draws {
        table.add_row(vec![
            draw.date.to_string(),
            draw.session.to_string(),
            draw.lottery.clone(),
            draw.number.clone(),
            draw.sign.map(|s| s.to_string()).unwrap_or_else(|| "—".to_string()),
        ]);
    }
    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total lignes lues : {}", result.total_records);
    println!("  Insérés           : {}", result.inserted);
    println!("  Doublons ignorés  : {}", result.skipped);
    if result.errors > 0 {
        println!("  Erreurs           : {}", result.errors);
    }
}

pub fn display_pattern(pattern: &Pattern) {
    println!("\nPatron #{} du {} ({})\n", pattern.id, pattern.date, pattern.session);

    let mut table = new_table(digit_header(&[]));
    table.add_row(histogram_cells(&pattern.histogram).collect::<Vec<_>>());
    println!("{table}");

    display_histogram_chart(&pattern.histogram);
}

/// Graphique ASCII des fréquences par chiffre.
pub fn display_histogram_chart(histogram: &Histogram) {
    let points: Vec<(f32, f32)> = histogram
        .iter()
        .enumerate()
        .map(|(digit, &count)| (digit as f32, count as f32))
        .collect();
    let y_max = histogram.iter().copied().max().unwrap_or(0) as f32 + 1.0;

    let shape = textplots::Shape::Bars(&points);
    let mut chart = textplots::Chart::new_with_y_range(120, 40, 0.0, DIGITS as f32, 0.0, y_max);
    println!("{}", chart.lineplot(&shape));
}

pub fn display_patterns(patterns: &[Pattern]) {
    if patterns.is_empty() {
        println!("Aucun patron enregistré.");
        return;
    }

    let mut table = new_table(digit_header(&["#", "Date", "Jornada"]));
    for pattern in patterns {
        let mut row = vec![
            Cell::new(pattern.id),
            Cell::new(pattern.date),
            Cell::new(pattern.session),
        ];
        row.extend(histogram_cells(&pattern.histogram));
        table.add_row(row);
    }
    println!("{table}");
}

pub fn display_redundancy(reference: &Pattern, results: &[RedundancyResult]) {
    println!(
        "\nPatrons redondants avec #{} du {} ({})\n",
        reference.id, reference.date, reference.session
    );

    let mut table = new_table(digit_header(&["#", "Date", "Jornada", "Égalités"]));
    for result in results {
        let mut row = vec![
            Cell::new(result.pattern.id),
            Cell::new(result.pattern.date),
            Cell::new(result.pattern.session),
            Cell::new(format!("{}/{}", result.match_count, DIGITS)).fg(Color::Green),
        ];
        row.extend(result.pattern.histogram.iter().zip(reference.histogram.iter()).map(
            |(&count, &expected)| {
                let cell = Cell::new(count);
                if count == expected { cell.fg(Color::Green) } else { cell }
            },
        ));
        table.add_row(row);
    }
    println!("{table}");
}

pub fn display_void_matches(reference: &Pattern, matches: &[VoidMatch], mode: VoidMode) {
    let mode_name = match mode {
        VoidMode::Exact => "exact",
        VoidMode::Partial => "partiel",
    };
    println!(
        "\nVides de #{} du {} ({}), mode {}\n",
        reference.id, reference.date, reference.session, mode_name
    );

    if matches.is_empty() {
        println!("Aucun patron ne partage ces positions vides.");
        return;
    }

    let mut table = new_table(digit_header(&["#", "Date", "Jornada", "Positions"]));
    for found in matches {
        let positions = found
            .matched_indices
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let mut row = vec![
            Cell::new(found.pattern.id),
            Cell::new(found.pattern.date),
            Cell::new(found.pattern.session),
            Cell::new(positions),
        ];
        match &found.slots {
            Some(slots) => row.extend(slots.iter().map(|slot| match slot {
                SlotComparison::Match(count) => Cell::new(count).fg(Color::Green),
                SlotComparison::Mismatch => Cell::new("✗").fg(Color::Red),
            })),
            None => row.extend(histogram_cells(&found.pattern.histogram)),
        }
        table.add_row(row);
    }
    println!("{table}");
}

pub fn display_unplayed(numbers: &[String]) {
    println!("\nNuméros non joués\n");
    let mut table = new_table(vec!["#".to_string(), "Numéro".to_string()]);
    for (i, number) in numbers.iter().enumerate() {
        table.add_row(vec![(i + 1).to_string(), number.clone()]);
    }
    println!("{table}");
}

pub fn display_astro(computation: &AstroComputation) {
    let pattern = &computation.pattern;
    println!(
        "\nPatron Astro {:04}-{:02} ({}) calculé le {}\n",
        pattern.year, pattern.month, pattern.session, pattern.computed_on
    );

    let mut table = new_table(digit_header(&["Position"]));
    for (position, row) in pattern.rows.iter().enumerate() {
        let mut cells = vec![Cell::new(position + 1)];
        cells.extend(histogram_cells(row));
        table.add_row(cells);
    }
    println!("{table}");

    let mut table = new_table(vec!["Signe".to_string(), "Tirages".to_string()]);
    for sign in AstroSign::ALL {
        table.add_row(vec![sign.to_string(), pattern.signs[sign.ordinal() - 1].to_string()]);
    }
    println!("{table}");

    if computation.skipped > 0 {
        println!("  {} tirage(s) sans 4 chiffres ignoré(s)", computation.skipped);
    }
}

pub fn display_range_report(report: &RangeReport) {
    let problems: Vec<_> = report
        .units
        .iter()
        .filter(|u| matches!(u.outcome, UnitOutcome::Failed(_)))
        .collect();

    if !problems.is_empty() {
        let mut table = new_table(["Date", "Jornada", "Erreur"].map(String::from).to_vec());
        for unit in problems {
            if let UnitOutcome::Failed(message) = &unit.outcome {
                table.add_row(vec![
                    Cell::new(unit.date),
                    Cell::new(unit.session),
                    Cell::new(message).fg(Color::Red),
                ]);
            }
        }
        println!("{table}");
    }

    println!("Plage terminée :");
    println!("  Enregistrés   : {}", report.stored());
    println!("  Inchangés     : {}", report.unchanged());
    println!("  Sans tirage   : {}", report.skipped());
    println!("  Échecs        : {}", report.failed());
    if report.not_attempted() > 0 {
        println!("  Non traités   : {}", report.not_attempted());
    }
}
