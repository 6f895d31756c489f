/*!
Reading the numeric override tables.

The tables are plain CSV files of numbers. A file whose first character is a
letter starts with a header row, which is skipped. Cells that are not finite
numbers (`nan` and `inf` count as such), and if requested cells that are
exactly zero, repeat the value from the same column in the row above. A table
only needs to spell out what changes from one row to the next.
*/
use crate::error::SimulationError;
use log::trace;
use std::path::Path;

/// A table of numbers. A cell is `None` where it asked to repeat the previous
/// row but there was no previous row.
pub type Rows = Vec<Vec<Option<f64>>>;

pub fn read_table<P: AsRef<Path>>(path: P, zero_repeats: bool) -> Result<Rows, SimulationError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        SimulationError::config(format!("could not read table {}: {}", path.display(), e))
    })?;
    trace!("Reading table {}", path.display());
    parse_table(&contents, zero_repeats)
}

pub fn parse_table(contents: &str, zero_repeats: bool) -> Result<Rows, SimulationError> {
    let has_header = contents
        .chars()
        .next()
        .map_or(false, |c| c.is_alphabetic());
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(has_header)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(contents.as_bytes());

    let mut rows: Rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        let previous = rows.last();
        let row = record
            .iter()
            .enumerate()
            .map(|(column, cell)| match cell.parse::<f64>() {
                Ok(v) if v.is_finite() && !(zero_repeats && v == 0.) => Some(v),
                _ => previous.and_then(|p| p.get(column).copied().flatten()),
            })
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

/// Check that every row of a table has exactly `columns` cells.
pub fn expect_columns(rows: &Rows, columns: usize, table: &str) -> Result<(), SimulationError> {
    for (i, row) in rows.iter().enumerate() {
        if row.len() != columns {
            return Err(SimulationError::config(format!(
                "{} table row {} has {} columns, expected {}",
                table,
                i + 1,
                row.len(),
                columns
            )));
        }
    }
    Ok(())
}

/// The value of a cell that must be present.
pub fn cell(rows: &Rows, row: usize, column: usize, table: &str) -> Result<f64, SimulationError> {
    rows.get(row)
        .and_then(|r| r.get(column).copied().flatten())
        .ok_or_else(|| {
            SimulationError::config(format!(
                "{} table row {} column {} has no value",
                table,
                row + 1,
                column + 1
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_skipped_only_if_it_starts_with_a_letter() {
        let with = parse_table("grade,proportion\n1,0.5\n", false).unwrap();
        assert_eq!(with, vec![vec![Some(1.), Some(0.5)]]);
        let without = parse_table("0,0.5\n1,0.5\n", false).unwrap();
        assert_eq!(without.len(), 2);
    }

    #[test]
    fn non_numeric_cells_repeat_the_row_above() {
        let rows = parse_table("1,2,3\n4,-,6\n7,,x\n", false).unwrap();
        assert_eq!(rows[1], vec![Some(4.), Some(2.), Some(6.)]);
        assert_eq!(rows[2], vec![Some(7.), Some(2.), Some(6.)]);
    }

    #[test]
    fn non_finite_cells_repeat_the_row_above() {
        let rows = parse_table("1,2,3\nnan,inf,-infinity\n", false).unwrap();
        assert_eq!(rows[1], vec![Some(1.), Some(2.), Some(3.)]);
        let rows = parse_table("NaN,1\n", false).unwrap();
        assert_eq!(rows[0], vec![None, Some(1.)]);
    }

    #[test]
    fn zeros_repeat_only_when_asked() {
        let kept = parse_table("1,2\n0,3\n", false).unwrap();
        assert_eq!(kept[1], vec![Some(0.), Some(3.)]);
        let repeated = parse_table("1,2\n0,3\n", true).unwrap();
        assert_eq!(repeated[1], vec![Some(1.), Some(3.)]);
    }

    #[test]
    fn first_row_cannot_repeat() {
        let rows = parse_table("1,?\n", false).unwrap();
        assert_eq!(rows[0], vec![Some(1.), None]);
        assert!(cell(&rows, 0, 1, "test").is_err());
        assert_eq!(cell(&rows, 0, 0, "test").unwrap(), 1.);
    }

    #[test]
    fn column_counts_are_checked() {
        let rows = parse_table("1,2,3,4\n1,2,3\n", false).unwrap();
        assert!(expect_columns(&rows, 4, "age").is_err());
        assert!(expect_columns(&rows[..1].to_vec(), 4, "age").is_ok());
    }

    #[test]
    fn missing_file_is_a_configuration_error() {
        match read_table("/nonexistent/table.csv", false) {
            Err(SimulationError::InvalidConfiguration(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }
}
