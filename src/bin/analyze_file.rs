//! Offline analysis of a contact export.
//!
//! Usage: `analyze_file <rows.json|rows.csv> [chart.png]`
//!
//! Reads a JSON array of contact rows (or a CSV export with a header row when
//! the file ends in `.csv`), prints the quality summary as JSON and optionally
//! writes the summary chart.

use contact_quality_api::analysis::analyze;
use contact_quality_api::chart::render_summary_chart;
use contact_quality_api::export::table_from_csv;
use contact_quality_api::models::Table;
use std::env;
use std::path::Path;

const CHART_SIZE: (u32, u32) = (600, 400);

fn is_csv(path: &str) -> bool {
    Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn load_table(path: &str) -> anyhow::Result<Table> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path, e))?;

    if is_csv(path) {
        return Ok(table_from_csv(raw.as_bytes())?);
    }
    let value: serde_json::Value = serde_json::from_str(&raw)?;
    Ok(Table::from_json(value)?)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let input = args
        .next()
        .ok_or_else(|| anyhow::anyhow!("usage: analyze_file <rows.json|rows.csv> [chart.png]"))?;
    let chart_path = args.next();

    let table = load_table(&input)?;
    tracing::info!("Loaded {} contact(s) from {}", table.len(), input);

    let summary = analyze(&table);
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if let Some(path) = chart_path {
        let png = render_summary_chart(&summary, CHART_SIZE.0, CHART_SIZE.1)?;
        std::fs::write(&path, png)?;
        tracing::info!("Chart written to {}", path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_detected_by_extension() {
        assert!(is_csv("contacts.csv"));
        assert!(is_csv("dir/EXPORT.CSV"));
        assert!(!is_csv("contacts.json"));
        assert!(!is_csv("csv"));
    }

    #[test]
    fn test_csv_file_is_analyzed() {
        let path = env::temp_dir().join(format!("analyze_file_{}.csv", std::process::id()));
        std::fs::write(
            &path,
            "First Name,Last Name,E-mail Address,Mobile Phone\nAnn,Lee,ann@gmail.com,555\nAnn,Lee,ann@gmail.com,555\n",
        )
        .unwrap();

        let table = load_table(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).ok();

        let summary = analyze(&table);
        assert_eq!(summary.total_contacts, 2);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(summary.email_category_breakdown.free, 2);
    }
}
