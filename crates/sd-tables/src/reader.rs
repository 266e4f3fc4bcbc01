//! Reading tables back.

use std::path::Path;

use crate::format::TableFormat;
use crate::schema::TableSchema;
use crate::writer::TableError;

/// Read the data rows of a table written by [`AppendTable`](crate::AppendTable).
///
/// Returns `Ok(None)` when the file does not exist, and an empty vector for
/// an empty file. The header must match `schema` exactly and every row must
/// have the schema's width.
pub fn read_table(
    path: &Path,
    schema: &TableSchema,
    format: TableFormat,
) -> Result<Option<Vec<Vec<String>>>, TableError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(TableError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let mut rows = format.parse(&text).map_err(|source| TableError::Format {
        path: path.to_path_buf(),
        source,
    })?;
    if rows.is_empty() {
        return Ok(Some(rows));
    }

    let header = rows.remove(0);
    if header.len() != schema.width() || header.iter().zip(schema.columns).any(|(a, b)| a != b) {
        return Err(TableError::HeaderMismatch {
            path: path.to_path_buf(),
            expected: schema.columns.iter().map(|c| c.to_string()).collect(),
            found: header,
        });
    }

    if let Some(bad) = rows.iter().find(|row| row.len() != schema.width()) {
        return Err(TableError::Arity {
            table: schema.name.to_string(),
            expected: schema.width(),
            got: bad.len(),
        });
    }
    Ok(Some(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{drift_schema, scores_schema};
    use crate::AppendTable;
    use tempfile::TempDir;

    #[test]
    fn missing_table_is_none() {
        let rows = read_table(
            Path::new("/nonexistent/scores.csv"),
            &scores_schema(),
            TableFormat::default(),
        )
        .unwrap();
        assert!(rows.is_none());
    }

    #[test]
    fn reads_back_appended_rows_in_order() {
        let temp = TempDir::new().unwrap();
        let format = TableFormat::default();
        let table = AppendTable::new(temp.path().join("scores.csv"), scores_schema(), format);
        table.append(&[["A", "10.0", "food", "-1"]]).unwrap();
        table
            .append(&[["B,2", "", "hair care", "-1"], ["C", "3.5", "x|y", "17"]])
            .unwrap();

        let rows = read_table(table.path(), &scores_schema(), format)
            .unwrap()
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], ["A", "10.0", "food", "-1"]);
        assert_eq!(rows[1], ["B,2", "", "hair care", "-1"]);
        assert_eq!(rows[2], ["C", "3.5", "x|y", "17"]);
    }

    #[test]
    fn wrong_header_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("drift.csv");
        std::fs::write(&path, "id,score,industry,percentile\n").unwrap();
        let err = read_table(&path, &drift_schema(), TableFormat::default()).unwrap_err();
        assert!(matches!(err, TableError::HeaderMismatch { .. }));
    }

    #[test]
    fn short_row_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("drift.csv");
        std::fs::write(&path, "run_id,id,percentile\n0,A\n").unwrap();
        let err = read_table(&path, &drift_schema(), TableFormat::default()).unwrap_err();
        assert!(matches!(err, TableError::Arity { got: 2, .. }));
    }
}
