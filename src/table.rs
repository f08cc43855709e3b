//! Plain-text table rendering for command output.

use std::fmt::Write as _;

/// Render rows as a padded text table with a dashed rule under the header.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|cell| cell.chars().count()).collect();
    for row in rows {
        for (index, cell) in row.iter().enumerate().take(widths.len()) {
            widths[index] = widths[index].max(sanitize(cell).chars().count());
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));
    let rule: Vec<String> = widths
        .iter()
        .map(|width| "-".repeat((*width).max(3)))
        .collect();
    let _ = writeln!(output, "{}", rule.join("  "));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let mut padded = Vec::with_capacity(cells.len());
    for (index, cell) in cells.iter().enumerate().take(widths.len()) {
        let text = sanitize(cell);
        let padding = widths[index].saturating_sub(text.chars().count());
        padded.push(format!("{text}{}", " ".repeat(padding)));
    }
    let mut line = padded.join("  ");
    while line.ends_with(' ') {
        line.pop();
    }
    line
}

// Control characters would wreck alignment; fold them to spaces.
fn sanitize(cell: &str) -> String {
    cell.chars()
        .map(|ch| if ch.is_control() { ' ' } else { ch })
        .collect()
}
