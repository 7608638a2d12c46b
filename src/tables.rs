use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};
use itertools::Itertools;
use serde_json::Value;

use crate::{api::frank_energie::SessionWindow, core::Reading};

pub fn build_readings_table(readings: &[Reading]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Sensor", "State", "Attributes"]);
    for reading in readings {
        table.add_row(vec![
            Cell::new(&reading.name),
            Cell::new(format_value(&reading.state))
                .set_alignment(CellAlignment::Right)
                .fg(if reading.state.is_null() { Color::DarkYellow } else { Color::Reset }),
            Cell::new(
                reading
                    .attributes
                    .iter()
                    .map(|(key, value)| format!("{key}: {}", format_value(value)))
                    .join("\n"),
            )
            .add_attribute(Attribute::Dim),
        ]);
    }
    table
}

pub fn build_sessions_table(window: &SessionWindow) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Date", "Result", "Cumulative", "Trade index", "Status"]);
    for session in &window.sessions {
        table.add_row(vec![
            Cell::new(session.date.as_deref().unwrap_or("—")),
            Cell::new(format_number(session.result))
                .set_alignment(CellAlignment::Right)
                .fg(match session.result {
                    Some(result) if result < 0.0 => Color::Red,
                    Some(_) => Color::Green,
                    None => Color::Reset,
                }),
            Cell::new(format_number(session.cumulative_result)).set_alignment(CellAlignment::Right),
            Cell::new(format_number(session.trade_index))
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Dim),
            Cell::new(session.status.as_deref().unwrap_or("—")),
        ]);
    }
    table.add_row(vec![
        Cell::new("Period trading").add_attribute(Attribute::Bold),
        Cell::new(format_number(window.current_trading_result()))
            .set_alignment(CellAlignment::Right)
            .add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(format_number(window.period_trade_index)).set_alignment(CellAlignment::Right),
        Cell::new(""),
    ]);
    table.add_row(vec![
        Cell::new("Period total").add_attribute(Attribute::Bold),
        Cell::new(format_number(window.period_total_result)).set_alignment(CellAlignment::Right),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
    ]);
    table
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "—".to_owned(),
        Value::String(string) => string.clone(),
        value => value.to_string(),
    }
}

fn format_number(value: Option<f64>) -> String {
    value.map_or_else(|| "—".to_owned(), |value| format!("{value:.2}"))
}
