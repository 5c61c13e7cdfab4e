use std::path::Path;

use anyhow::{Context, Result};

use census_lens::data::loader::{self, LoadOptions};
use census_lens::{report, views};

/// Slider default in the engineering tab.
const DEFAULT_MANPOWER_THRESHOLD: u64 = 10_000;

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let data_path = args
        .next()
        .context("usage: census-lens <census-file> [loader-options.json]")?;
    let options: LoadOptions = match args.next() {
        Some(cfg) => {
            let text = std::fs::read_to_string(&cfg)
                .with_context(|| format!("reading loader options {cfg}"))?;
            serde_json::from_str(&text).with_context(|| format!("parsing loader options {cfg}"))?
        }
        None => LoadOptions::default(),
    };

    let table = loader::load_file(Path::new(&data_path), &options)
        .context("dashboard cannot start without its dataset")?;
    log::info!(
        "loaded {} records from {data_path} ({} malformed rows excluded)",
        table.len(),
        table.skipped_rows()
    );

    // The four dashboard views, rendered as text tables. A web frontend
    // would call the same functions with its control state and draw charts.
    let service_names: Vec<&str> = views::ESSENTIAL_SERVICES
        .iter()
        .map(|(_, name)| *name)
        .collect();
    let essential = views::essential_services(&table, None)?;
    println!(
        "{}",
        report::render(
            &format!(
                "Essential services by occupation and gender ({})",
                service_names.join(", ")
            ),
            &essential
        )
    );

    let categories = table.top_level_categories();
    if let Some((code, label)) = categories.first() {
        let share = views::gender_share_by_jurisdiction(&table, code)?;
        println!(
            "{}",
            report::render(&format!("Female share of '{label}' by jurisdiction"), &share)
        );
    }

    for (code, discipline) in views::ENGINEERING {
        let manpower = views::engineering_manpower(&table, Some(code), DEFAULT_MANPOWER_THRESHOLD)?;
        println!(
            "{}",
            report::render(
                &format!(
                    "{discipline} engineering manpower by jurisdiction (>= {DEFAULT_MANPOWER_THRESHOLD})"
                ),
                &manpower
            )
        );
    }

    let sectors = views::sector_distribution(&table)?;
    print!("{}", report::render("Workforce by major sector (national)", &sectors));

    Ok(())
}
