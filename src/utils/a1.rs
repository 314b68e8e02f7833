//! A1 notation helpers for Sheets ranges.

use crate::utils::error::{AppError, Result};

/// 0-based column index → column letters (0 → "A", 26 → "AA").
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Column letters → 0-based column index.
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let mut n = 0usize;
    for c in letters.chars() {
        n = n * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    Some(n - 1)
}

/// Sheet name as it must appear in a range (quoted when it has spaces or punctuation).
pub fn quote_sheet(name: &str) -> String {
    if name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

/// `Sheet!A5:M5`
pub fn row_range(sheet: &str, first_col: usize, last_col: usize, row: usize) -> String {
    format!(
        "{}!{}{}:{}{}",
        quote_sheet(sheet),
        column_letter(first_col),
        row,
        column_letter(last_col),
        row
    )
}

/// `Sheet!B2`
pub fn cell_ref(sheet: &str, col: usize, row: usize) -> String {
    format!("{}!{}{}", quote_sheet(sheet), column_letter(col), row)
}

/// Parsed range. Missing parts mean "unbounded".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A1Range {
    pub sheet: String,
    pub start_col: Option<usize>,
    pub start_row: Option<usize>,
    pub end_col: Option<usize>,
    pub end_row: Option<usize>,
}

pub fn parse_range(range: &str) -> Result<A1Range> {
    let (sheet_part, cells) = match split_sheet(range) {
        Some((sheet, cells)) => (sheet, Some(cells)),
        None => (range, None),
    };

    let sheet = unquote_sheet(sheet_part);
    if sheet.is_empty() {
        return Err(AppError::invalid_input("range", format!("no sheet name in '{}'", range)));
    }

    let mut parsed = A1Range {
        sheet,
        start_col: None,
        start_row: None,
        end_col: None,
        end_row: None,
    };

    if let Some(cells) = cells {
        let mut parts = cells.splitn(2, ':');
        let start = parts.next().unwrap_or_default();
        let end = parts.next().unwrap_or(start);
        let (sc, sr) = split_cell(start, range)?;
        let (ec, er) = split_cell(end, range)?;
        parsed.start_col = sc;
        parsed.start_row = sr;
        parsed.end_col = ec;
        parsed.end_row = er;
    }

    Ok(parsed)
}

fn split_sheet(range: &str) -> Option<(&str, &str)> {
    // 引號內可能出現 '!'，從最後一個拆
    let idx = range.rfind('!')?;
    Some((&range[..idx], &range[idx + 1..]))
}

fn unquote_sheet(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('\'') && trimmed.ends_with('\'') {
        trimmed[1..trimmed.len() - 1].replace("''", "'")
    } else {
        trimmed.to_string()
    }
}

fn split_cell(cell: &str, range: &str) -> Result<(Option<usize>, Option<usize>)> {
    let letters: String = cell.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let digits = &cell[letters.len()..];

    let col = if letters.is_empty() {
        None
    } else {
        column_index(&letters)
    };
    let row = if digits.is_empty() {
        None
    } else {
        Some(digits.parse::<usize>().map_err(|_| {
            AppError::invalid_input("range", format!("bad cell reference in '{}'", range))
        })?)
    };
    Ok((col, row))
}
