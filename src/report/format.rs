//! Number and label formatting shared by the report writers.

/// Banner rule used between report sections.
pub fn rule(width: usize) -> String {
    "=".repeat(width)
}

/// Format an integer with thousands separators: `1234567` → `1,234,567`.
pub fn format_count(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Abbreviate large numbers with K/M/B suffixes.
pub fn format_large_number(n: i64) -> String {
    let value = n as f64;
    if value >= 1_000_000_000.0 {
        format!("{:.2}B", value / 1_000_000_000.0)
    } else if value >= 1_000_000.0 {
        format!("{:.2}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.2}K", value / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Render a percent change, or `-` when it is undefined.
pub fn format_change(pct: Option<f64>, decimals: usize) -> String {
    match pct {
        Some(v) => format!("{:.*}%", decimals, v),
        None => "-".to_string(),
    }
}

/// `address_level_1` → `Address Level 1`.
pub fn title_case(column: &str) -> String {
    column
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Render rows as a right-aligned plain-text table.
pub fn text_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let columns = headers
        .len()
        .max(rows.iter().map(Vec::len).max().unwrap_or(0));
    let mut widths = vec![0usize; columns];
    for (i, h) in headers.iter().enumerate() {
        widths[i] = widths[i].max(h.chars().count());
    }
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let render = |cells: &[String]| -> String {
        (0..columns)
            .map(|i| {
                let cell = cells.get(i).map(String::as_str).unwrap_or("");
                format!("{:>width$}", cell, width = widths[i])
            })
            .collect::<Vec<_>>()
            .join(" ")
    };

    let mut out = render(headers);
    out.push('\n');
    for row in rows {
        out.push_str(&render(row));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
        assert_eq!(format_count(-45000), "-45,000");
    }

    #[test]
    fn test_format_large_number() {
        assert_eq!(format_large_number(512), "512");
        assert_eq!(format_large_number(2_500), "2.50K");
        assert_eq!(format_large_number(2_540_000), "2.54M");
        assert_eq!(format_large_number(2_540_000_000), "2.54B");
    }

    #[test]
    fn test_format_change() {
        assert_eq!(format_change(None, 2), "-");
        assert_eq!(format_change(Some(50.0), 2), "50.00%");
        assert_eq!(format_change(Some(-3.14159), 1), "-3.1%");
        assert_eq!(format_change(Some(0.0), 2), "0.00%");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("address_level_1"), "Address Level 1");
        assert_eq!(title_case("change_type"), "Change Type");
        assert_eq!(title_case("class"), "Class");
    }

    #[test]
    fn test_text_table_alignment() {
        let headers = vec!["theme".to_string(), "added".to_string()];
        let rows = vec![vec!["base".to_string(), "12345".to_string()]];
        let table = text_table(&headers, &rows);
        assert_eq!(table, "theme added\n base 12345\n");
    }
}
