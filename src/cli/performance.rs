use super::ui;
use crate::core::returns::resolve_custom_window;
use crate::core::universe::INDICES;
use crate::core::{
    Horizon, MarketData, PerformanceTable, Region, ReturnColumn, TargetCurrency,
    build_performance_table,
};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::Table;
use tracing::info;

pub struct PerformanceArgs {
    pub currency: Option<TargetCurrency>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub region: Option<Region>,
    pub sort_by: Option<ReturnColumn>,
    pub ascending: bool,
    pub json: bool,
}

pub async fn run(
    market: &MarketData,
    target: &TargetCurrency,
    args: &PerformanceArgs,
) -> Result<()> {
    info!("Calculating index performance in {target}...");

    let pb = ui::new_progress_bar(INDICES.len() as u64, true);
    pb.set_message("Fetching index history");
    let progress = pb.clone();
    let (table, converted) =
        build_performance_table(market, target, &move || progress.inc(1)).await;
    pb.finish_and_clear();

    let mut table = table.with_custom_column(&converted, args.start, args.end);
    if let Some(region) = args.region {
        table = table.filter_region(region);
    }
    if let Some(column) = args.sort_by {
        table = table.sort_by(column, args.ascending);
    }

    if args.json {
        let json = serde_json::to_string_pretty(&table).context("Failed to serialize table")?;
        println!("{json}");
        return Ok(());
    }

    let window = resolve_custom_window(args.start, args.end, table.as_of);
    println!(
        "\n{}",
        ui::style_text(&format!("Performance in {}", table.target), ui::StyleType::Title)
    );
    println!("{}", render_table(&table, window));
    println!(
        "{}",
        ui::style_text(&format!("As of {}", table.as_of), ui::StyleType::Subtle)
    );
    Ok(())
}

fn render_table(table: &PerformanceTable, window: (NaiveDate, NaiveDate)) -> Table {
    let mut out = ui::new_styled_table();

    let mut header = vec![
        ui::header_cell("Index"),
        ui::header_cell("Region"),
        ui::header_cell("Local CCY"),
    ];
    header.extend(Horizon::ALL.iter().map(|h| ui::header_cell(&h.to_string())));
    header.push(ui::header_cell(&format!("Custom ({} to {})", window.0, window.1)));
    out.set_header(header);

    for row in &table.rows {
        let mut cells = vec![
            comfy_table::Cell::new(&row.name),
            comfy_table::Cell::new(row.region.to_string()),
            comfy_table::Cell::new(&row.local_currency),
        ];
        cells.extend(
            Horizon::ALL
                .iter()
                .map(|h| ui::optional_change_cell(row.value(ReturnColumn::Horizon(*h)))),
        );
        cells.push(ui::optional_change_cell(row.custom));
        out.add_row(cells);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::table::PerformanceRow;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_render_table_shows_values_and_gaps() {
        let table = PerformanceTable {
            target: "EUR".to_string(),
            as_of: date(2024, 6, 15),
            rows: vec![
                PerformanceRow {
                    name: "S&P 500".to_string(),
                    region: Region::Americas,
                    local_currency: "USD".to_string(),
                    returns: Horizon::ALL.iter().map(|h| (*h, Some(1.5))).collect(),
                    custom: Some(-2.25),
                },
                PerformanceRow {
                    name: "Nikkei 225 (Japan)".to_string(),
                    region: Region::AsiaPac,
                    local_currency: "JPY".to_string(),
                    returns: Horizon::ALL.iter().map(|h| (*h, None)).collect(),
                    custom: None,
                },
            ],
        };

        let rendered = render_table(&table, (date(2023, 12, 29), date(2024, 6, 15))).to_string();
        assert!(rendered.contains("S&P 500"));
        assert!(rendered.contains("1.50%"));
        assert!(rendered.contains("-2.25%"));
        assert!(rendered.contains("N/A"));
        assert!(rendered.contains("Custom (2023-12-29 to 2024-06-15)"));
        assert!(rendered.contains("YTD"));
        assert!(rendered.contains("Local CCY"));
        assert!(rendered.contains("JPY"));
    }
}
