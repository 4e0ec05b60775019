use comfy_table::{
    Cell, CellAlignment, Color, ContentArrangement, Table, modifiers::UTF8_ROUND_CORNERS,
    presets::UTF8_BORDERS_ONLY,
};

/// One analyzed ticker in the end-of-run summary.
pub struct SummaryRow {
    pub ticker: String,
    pub positive_entry_points: usize,
    pub risk: f64,
    pub accepted: bool,
}

fn risk_color(risk: f64) -> Color {
    if risk < 33.0 {
        Color::Green
    } else if risk < 66.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// Prints the run summary, lowest risk first.
pub fn print_summary(mut rows: Vec<SummaryRow>) {
    if rows.is_empty() {
        println!("No tickers analyzed.");
        return;
    }

    rows.sort_by(|a, b| {
        a.risk
            .partial_cmp(&b.risk)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut table = Table::new();
    table
        .load_preset(UTF8_BORDERS_ONLY)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Ticker", "Entry points", "Risk %", "Candidate"]);

    for row in rows {
        table.add_row(vec![
            Cell::new(&row.ticker),
            Cell::new(row.positive_entry_points).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.2}", row.risk))
                .set_alignment(CellAlignment::Right)
                .fg(risk_color(row.risk)),
            Cell::new(if row.accepted { "yes" } else { "" }),
        ]);
    }

    println!("{table}");
}
