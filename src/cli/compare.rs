use super::ui;
use crate::core::frame::Frame;
use crate::core::universe::DEFAULT_COMPARISON;
use crate::core::{Horizon, MarketData, RebasedTable, TargetCurrency, build_rebased_table};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::{Cell, Table};
use tracing::info;

pub struct CompareArgs {
    pub indices: Vec<String>,
    pub currency: Option<TargetCurrency>,
    pub horizon: Horizon,
    pub json: bool,
}

/// One line of the comparison summary.
#[derive(Debug, Clone, PartialEq)]
struct SeriesSummary {
    name: String,
    first_date: NaiveDate,
    last: f64,
    low: f64,
    high: f64,
}

pub async fn run(market: &MarketData, target: &TargetCurrency, args: &CompareArgs) -> Result<()> {
    let names: Vec<String> = if args.indices.is_empty() {
        DEFAULT_COMPARISON.iter().map(ToString::to_string).collect()
    } else {
        args.indices.clone()
    };
    info!("Comparing {} indices over {}", names.len(), args.horizon);

    let spinner = ui::new_spinner("Fetching index history");
    let table = build_rebased_table(market, &names, target, args.horizon).await;
    spinner.finish_and_clear();

    let Some(table) = table else {
        println!(
            "{}",
            ui::style_text(
                "No data available for the selected indices.",
                ui::StyleType::Error
            )
        );
        return Ok(());
    };

    if args.json {
        let json =
            serde_json::to_string_pretty(&table).context("Failed to serialize rebased series")?;
        println!("{json}");
        return Ok(());
    }

    println!(
        "\n{}",
        ui::style_text(
            &format!(
                "{} performance in {}, rebased to 100 on {}",
                table.horizon, table.target, table.window_start
            ),
            ui::StyleType::Title
        )
    );
    println!("{}", render_summary(&table));
    Ok(())
}

fn summarize(frame: &Frame) -> Vec<SeriesSummary> {
    frame
        .columns
        .iter()
        .filter_map(|column| {
            let present: Vec<(NaiveDate, f64)> = frame
                .dates
                .iter()
                .zip(&column.values)
                .filter_map(|(date, value)| value.map(|v| (*date, v)))
                .collect();
            let (first_date, _) = *present.first()?;
            let (_, last) = *present.last()?;
            let (low, high) = present
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, v)| {
                    (lo.min(*v), hi.max(*v))
                });
            Some(SeriesSummary {
                name: column.name.clone(),
                first_date,
                last,
                low,
                high,
            })
        })
        .collect()
}

fn render_summary(table: &RebasedTable) -> Table {
    let mut out = ui::new_styled_table();
    out.set_header(vec![
        ui::header_cell("Index"),
        ui::header_cell("From"),
        ui::header_cell("Last"),
        ui::header_cell("Change"),
        ui::header_cell("Low"),
        ui::header_cell("High"),
    ]);

    for summary in summarize(&table.frame) {
        out.add_row(vec![
            Cell::new(&summary.name),
            Cell::new(summary.first_date.to_string()),
            ui::number_cell(summary.last),
            ui::change_cell(summary.last - 100.0),
            ui::number_cell(summary.low),
            ui::number_cell(summary.high),
        ]);
    }
    out
}
