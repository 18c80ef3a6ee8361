//! Plain-text numeric tables.
//!
//! The structured input files consumed by `from_file` constructors are
//! whitespace-separated numeric tables, with blank lines and `#` comment
//! lines ignored.

use crate::error::ModelError;

/// Parse a text table into rows of floats.
///
/// Returns `FileFormat` if the table is empty or any token fails to parse
/// as a float.
pub(crate) fn parse_rows(text: &str) -> Result<Vec<Vec<f64>>, ModelError> {
    let mut rows = Vec::new();
    for line in text.lines() {
        let line = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        };
        if line.trim().is_empty() {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|tok| tok.parse::<f64>().or(Err(ModelError::FileFormat)))
            .collect::<Result<Vec<f64>, _>>()?;
        rows.push(row);
    }
    if rows.is_empty() {
        return Err(ModelError::FileFormat);
    }
    Ok(rows)
}

/// True when every row has the given column count.
pub(crate) fn is_rectangular(rows: &[Vec<f64>], ncols: usize) -> bool {
    rows.iter().all(|r| r.len() == ncols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_and_skips_comments() {
        let rows = parse_rows("# header\n1.0 2.0\n\n3.0 4.0 # trailing\n").unwrap();
        assert_eq!(rows, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    }

    #[test]
    fn rejects_non_numeric_tokens() {
        assert!(matches!(
            parse_rows("1.0 two\n"),
            Err(ModelError::FileFormat)
        ));
    }

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(parse_rows("\n# only\n"), Err(ModelError::FileFormat)));
    }
}
