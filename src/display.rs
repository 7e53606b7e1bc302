use std::cmp;

/// Put two rendered tables next to each other, `gap` columns apart.
pub fn side_by_side(left: &str, right: &str, gap: usize) -> String {
    if left.is_empty() {
        return right.to_string();
    } else if right.is_empty() {
        return left.to_string();
    }
    let left: Vec<&str> = left.lines().collect();
    let right: Vec<&str> = right.lines().collect();
    let height = cmp::max(left.len(), right.len());
    let width = left.iter().map(|s| s.len()).max().unwrap_or(0);

    let mut result = String::new();
    for row in 0..height {
        let l = left.get(row).copied().unwrap_or("");
        let r = right.get(row).copied().unwrap_or("");
        result.push_str(&format!("{:<pad$}{}\n", l, r, pad = width + gap));
    }
    result
}

/// Render `rows` as a boxed, centered, single column table.
pub fn into_table(title: &str, rows: &[String]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    let width = rows.iter().map(|s| s.len()).max().unwrap_or(0);
    let width = cmp::max(width, title.len());

    let divider = format!("+{}+\n", "-".repeat(width));
    let mut table = String::with_capacity((2 * rows.len() + 3) * (width + 3));
    table.push_str(&divider);
    table.push_str(&format!("|{:^width$}|\n", title, width = width));
    for row in rows.iter() {
        table.push_str(&divider);
        table.push_str(&format!("|{:^width$}|\n", row, width = width));
    }
    table.push_str(&divider);
    table
}
