//! Horizontal bar charts for terminal output.
//!
//! Deterministic fixed-width rendering: one row per entry, label column padded
//! to the longest label, bar length proportional to `|value| / max|value|`.
//! Negative values use a lighter glyph so sign is visible without colour.

const FULL: char = '█';
const NEGATIVE: char = '░';

/// Render `(label, value, value_text)` rows as a bar chart `width` cells wide.
pub fn render_bars(rows: &[(String, f64, String)], width: usize) -> String {
    if rows.is_empty() {
        return String::new();
    }
    let width = width.max(1);

    let label_w = rows.iter().map(|(l, _, _)| l.chars().count()).max().unwrap_or(0);
    let max_abs = rows
        .iter()
        .map(|(_, v, _)| v.abs())
        .filter(|v| v.is_finite())
        .fold(0.0, f64::max);

    let mut out = String::new();
    for (label, value, text) in rows {
        let len = bar_len(*value, max_abs, width);
        let glyph = if *value < 0.0 { NEGATIVE } else { FULL };
        let bar: String = std::iter::repeat(glyph).take(len).collect();
        let pad = label_w - label.chars().count();
        out.push_str(&format!("{label}{} │{bar:<width$} {text}", " ".repeat(pad)).trim_end());
        out.push('\n');
    }
    out
}

fn bar_len(value: f64, max_abs: f64, width: usize) -> usize {
    if !(value.is_finite() && max_abs > 0.0) {
        return 0;
    }
    let len = (value.abs() / max_abs * width as f64).round() as usize;
    // Non-zero values always get at least one cell.
    if len == 0 && value != 0.0 { 1 } else { len.min(width) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<(String, f64, String)> {
        vec![
            ("Indien".to_string(), 100.0, "100".to_string()),
            ("China".to_string(), 50.0, "50".to_string()),
            ("Japan".to_string(), -25.0, "-25".to_string()),
        ]
    }

    #[test]
    fn bars_scale_to_width() {
        let chart = render_bars(&rows(), 10);
        let lines: Vec<&str> = chart.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].matches(FULL).count(), 10);
        assert_eq!(lines[1].matches(FULL).count(), 5);
        assert_eq!(lines[2].matches(NEGATIVE).count(), 3);
        assert!(lines[1].starts_with("China  │"));
    }

    #[test]
    fn tiny_values_still_show() {
        assert_eq!(bar_len(0.001, 100.0, 10), 1);
        assert_eq!(bar_len(0.0, 100.0, 10), 0);
        assert_eq!(bar_len(f64::NAN, 100.0, 10), 0);
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert!(render_bars(&[], 10).is_empty());
    }
}
