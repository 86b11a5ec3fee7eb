// src/repl/table.rs
// Aligned text rendering of the goal listing

use super::colors;

/// Cells wider than this are cut with an ellipsis
const MAX_CELL_WIDTH: usize = 40;
const STATUS_COLUMN: usize = 1;

fn clip(cell: &str) -> String {
    let cell = cell.replace('\n', " ");
    if cell.chars().count() <= MAX_CELL_WIDTH {
        cell
    } else {
        let mut clipped: String = cell.chars().take(MAX_CELL_WIDTH - 1).collect();
        clipped.push('…');
        clipped
    }
}

/// Render rows under their headers, columns padded to the widest cell.
/// With `color`, the header is bold and statuses are colored.
pub fn render(rows: &[Vec<String>], headers: &[String], color: bool) -> String {
    if headers.is_empty() {
        return "No goals found.".to_string();
    }

    let header_cells: Vec<String> = headers.iter().map(|h| clip(h)).collect();
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            (0..headers.len())
                .map(|i| clip(row.get(i).map(String::as_str).unwrap_or("")))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = (0..headers.len())
        .map(|i| {
            body.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(header_cells[i].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: &[String], is_header: bool| -> String {
        cells
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, width))| {
                let pad = " ".repeat(width - cell.chars().count());
                let text = match (color, is_header, i) {
                    (false, _, _) => cell.clone(),
                    (true, true, _) => colors::header(cell),
                    (true, false, STATUS_COLUMN) => colors::goal_status(cell),
                    (true, false, _) => cell.clone(),
                };
                format!("{text}{pad}")
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let rule = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("  ");

    let mut out = vec![line(&header_cells, true), rule];
    out.extend(body.iter().map(|row| line(row, false)));
    out.join("\n")
}
