//! Загрузка CSV в таблицу строк

use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use crate::error::{PipelineError, Result};

/// Таблица без приведения типов: заголовки и строки как есть
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<StringRecord>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// "Sleep Duration" -> "Sleep_Duration"
pub fn normalize_header(raw: &str) -> String {
    raw.trim().split_whitespace().collect::<Vec<_>>().join("_")
}

pub fn load_csv(path: &Path) -> Result<RawTable> {
    let load_error = |reason: String| PipelineError::DataLoad {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| load_error(e.to_string()))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| load_error(e.to_string()))?
        .iter()
        .map(normalize_header)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record.map_err(|e| load_error(e.to_string()))?);
    }

    if rows.is_empty() {
        return Err(load_error("file contains no data rows".to_string()));
    }

    tracing::info!("Loaded {} rows, {} columns from {}", rows.len(), headers.len(), path.display());

    Ok(RawTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn normalizes_headers() {
        assert_eq!(normalize_header("Sleep Duration"), "Sleep_Duration");
        assert_eq!(normalize_header("  Quality of Sleep "), "Quality_of_Sleep");
        assert_eq!(normalize_header("Age"), "Age");
    }

    #[test]
    fn loads_rows_with_normalized_headers() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Person ID,Sleep Duration,Blood Pressure").unwrap();
        writeln!(file, "1,6.1,126/83").unwrap();
        writeln!(file, "2,7.8,120/80").unwrap();

        let table = load_csv(file.path()).unwrap();
        assert_eq!(table.headers, vec!["Person_ID", "Sleep_Duration", "Blood_Pressure"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.column_index("Blood_Pressure"), Some(2));
        assert_eq!(&table.rows[1][2], "120/80");
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = load_csv(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::DataLoad { .. }));
    }

    #[test]
    fn header_only_file_is_a_load_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Person ID,Age").unwrap();

        let err = load_csv(file.path()).unwrap_err();
        match err {
            PipelineError::DataLoad { reason, .. } => assert!(reason.contains("no data rows")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn ragged_row_is_a_load_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Person ID,Age,Occupation").unwrap();
        writeln!(file, "1,27,Nurse").unwrap();
        writeln!(file, "2,31").unwrap();

        let err = load_csv(file.path()).unwrap_err();
        assert!(matches!(err, PipelineError::DataLoad { .. }), "{err}");
    }

    #[test]
    fn invalid_utf8_is_a_load_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"Person ID,Occupation\n1,Nurse\n2,Engin\xff\xfeer\n").unwrap();

        let err = load_csv(file.path()).unwrap_err();
        assert!(matches!(err, PipelineError::DataLoad { .. }), "{err}");
    }
}
