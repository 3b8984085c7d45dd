//! Elastic plain-text tables for `merge --table` and `inspect`.

use std::borrow::Cow;
use std::fmt::Write as _;

use crate::merge::MergedTable;

const COLUMN_GAP: &str = "  ";

struct Layout {
    widths: Vec<usize>,
}

impl Layout {
    fn measure<S: AsRef<str>>(headers: &[S], rows: &[Vec<String>]) -> Self {
        let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h.as_ref())).collect();
        for row in rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(display_width(cell));
            }
        }
        for width in &mut widths {
            *width = (*width).max(1);
        }
        Self { widths }
    }

    fn line<S: AsRef<str>>(&self, values: &[S]) -> String {
        let mut line = values
            .iter()
            .zip(&self.widths)
            .map(|(value, width)| {
                let cell = sanitize_cell(value.as_ref());
                let padding = width.saturating_sub(display_width(&cell));
                format!("{cell}{}", " ".repeat(padding))
            })
            .collect::<Vec<_>>()
            .join(COLUMN_GAP);
        line.truncate(line.trim_end().len());
        line
    }

    fn rule(&self) -> String {
        self.widths
            .iter()
            .map(|width| "-".repeat((*width).max(3)))
            .collect::<Vec<_>>()
            .join(COLUMN_GAP)
    }
}

pub fn render_table<S: AsRef<str>>(headers: &[S], rows: &[Vec<String>]) -> String {
    let layout = Layout::measure(headers, rows);
    let mut output = String::new();
    let _ = writeln!(output, "{}", layout.line(headers));
    let _ = writeln!(output, "{}", layout.rule());
    for row in rows {
        let _ = writeln!(output, "{}", layout.line(row));
    }
    output
}

pub fn render_merged(table: &MergedTable) -> String {
    render_table(&table.headers, &table.ordered_rows())
}

pub fn print_table<S: AsRef<str>>(headers: &[S], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn display_width(value: &str) -> usize {
    let mut width = 0usize;
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            // ANSI escape sequence, e.g. \x1b[31m
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            width += 1;
        }
    }
    width
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_are_padded_to_the_widest_cell() {
        let rows = vec![
            vec!["1".to_string(), "Ana".to_string()],
            vec!["22".to_string(), "Bo".to_string()],
        ];
        let rendered = render_table(&["ID", "Name"], &rows);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], "ID  Name");
        assert_eq!(lines[1], "---  ----");
        assert_eq!(lines[2], "1   Ana");
        assert_eq!(lines[3], "22  Bo");
    }

    #[test]
    fn width_skips_ansi_sequences_and_cells_lose_line_breaks() {
        assert_eq!(display_width("\u{1b}[31mred\u{1b}[0m"), 3);
        assert_eq!(sanitize_cell("a\nb\tc"), "a b c");
    }
}
