use crate::query::{Reduced, ResultTable};

// ---------------------------------------------------------------------------
// Plain-text rendering of a ResultTable
// ---------------------------------------------------------------------------

/// Render one result table as an aligned text block for the CLI consumer.
/// A chart library would consume the same rows; this is just the terminal
/// stand-in for it.
pub fn render(title: &str, result: &ResultTable) -> String {
    let mut out = String::new();
    out.push_str(title);
    out.push('\n');
    out.push_str(&"-".repeat(title.chars().count()));
    out.push('\n');

    if result.is_empty() {
        out.push_str("(no matching records)\n");
        return out;
    }

    let labels: Vec<String> = result.rows().iter().map(|(k, _)| k.to_string()).collect();
    let width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);

    for ((_, value), label) in result.rows().iter().zip(&labels) {
        out.push_str(&format!("{label:width$}  {}\n", format_value(value)));
    }
    out
}

fn format_value(value: &Reduced) -> String {
    match value {
        Reduced::Count(n) => group_digits(*n),
        Reduced::Share(v) => format!("{:.1}%", v * 100.0),
        Reduced::Undefined => "n/a".to_string(),
    }
}

/// Thousands separators: `1234567` → `"1,234,567"`.
fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
