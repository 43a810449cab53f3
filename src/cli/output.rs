//! Output formatting utilities for the CLI.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use serde::Serialize;
use std::env;

use crate::domain::models::{Block, IndexStatus};

pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}

/// Truncate a string to a maximum number of characters, appending "..." if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Table with the CLI's standard borders and dynamic column widths.
pub fn base_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
    table
}

/// Render blocks as a table, with an optional score column.
pub fn format_block_table(blocks: &[Block], score: impl Fn(&Block) -> Option<f32>) -> String {
    let with_scores = blocks.iter().any(|b| score(b).is_some());
    let mut headers = vec!["ID", "Title", "Text", "Index", "Created"];
    if with_scores {
        headers.push("Score");
    }

    let mut table = base_table(&headers);
    let colors = supports_color();

    for block in blocks {
        let status = if colors {
            Cell::new(block.index_status.as_str()).fg(status_color(block.index_status))
        } else {
            Cell::new(block.index_status.as_str())
        };

        let mut row = vec![
            Cell::new(block.id),
            Cell::new(block.title.as_deref().map_or_else(|| "-".to_string(), |t| truncate(t, 30))),
            Cell::new(truncate(block.text(), 60)),
            status,
            Cell::new(block.created_at.format("%Y-%m-%d %H:%M:%S")),
        ];
        if with_scores {
            row.push(Cell::new(score(block).map_or_else(|| "-".to_string(), |s| format!("{:.4}", s))));
        }
        table.add_row(row);
    }

    table.to_string()
}

fn status_color(status: IndexStatus) -> Color {
    match status {
        IndexStatus::Indexed => Color::Green,
        IndexStatus::Pending => Color::Yellow,
        IndexStatus::IndexFailed => Color::Red,
        IndexStatus::NotApplicable => Color::DarkGrey,
    }
}

fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }
    !matches!(env::var("TERM").as_deref(), Ok("dumb"))
}
