// ==========================================
// 餐饮出品编排系统 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// ==========================================

use crate::importer::error::ImportError;
use crate::importer::order_importer_trait::{FileParser, RawRow};
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::error::Error;
use std::fs::File;
use std::path::Path;

type ParseResult = Result<Vec<RawRow>, Box<dyn Error + Send + Sync>>;

fn ensure_exists(path: &Path) -> Result<(), ImportError> {
    if path.exists() {
        Ok(())
    } else {
        Err(ImportError::FileNotFound(path.display().to_string()))
    }
}

/// 按表头组装一行（跳过全空行）
fn build_row<I>(headers: &[String], values: I) -> Option<RawRow>
where
    I: IntoIterator<Item = String>,
{
    let mut row_map = HashMap::new();
    for (col_idx, value) in values.into_iter().enumerate() {
        if let Some(header) = headers.get(col_idx) {
            if !header.is_empty() {
                row_map.insert(header.clone(), value.trim().to_string());
            }
        }
    }
    if row_map.values().all(|v| v.is_empty()) {
        None
    } else {
        Some(row_map)
    }
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_raw_records(&self, file_path: &Path) -> ParseResult {
        ensure_exists(file_path)?;

        if let Some(ext) = file_path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(Box::new(ImportError::UnsupportedFormat(
                    ext.to_string_lossy().to_string(),
                )));
            }
        }

        let file = File::open(file_path).map_err(ImportError::from)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()
            .map_err(ImportError::from)?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result.map_err(ImportError::from)?;
            if let Some(row) = build_row(&headers, record.iter().map(|v| v.to_string())) {
                records.push(row);
            }
        }

        Ok(records)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_to_raw_records(&self, file_path: &Path) -> ParseResult {
        ensure_exists(file_path)?;

        let ext = file_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if ext != "xlsx" && ext != "xls" {
            return Err(Box::new(ImportError::UnsupportedFormat(ext)));
        }

        let mut workbook = open_workbook_auto(file_path).map_err(ImportError::from)?;

        // 读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(ImportError::from)?;

        let mut rows = range.rows();
        let header_row = rows.next().ok_or(ImportError::EmptyFile)?;
        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let records = rows
            .filter_map(|data_row| build_row(&headers, data_row.iter().map(|cell| cell.to_string())))
            .collect();
        Ok(records)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse_to_raw_records(&self, file_path: &Path) -> ParseResult {
        let ext = file_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvParser.parse_to_raw_records(file_path),
            "xlsx" | "xls" => ExcelParser.parse_to_raw_records(file_path),
            _ => Err(Box::new(ImportError::UnsupportedFormat(ext))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn csv_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn test_csv_parser_valid_file() {
        let file = csv_file(&["订单号,商品编码,数量", "A001,GZ-PORK,2", "A001,NOODLE-BEEF,1"]);

        let records = CsvParser.parse_to_raw_records(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("订单号").map(String::as_str), Some("A001"));
        assert_eq!(records[1].get("商品编码").map(String::as_str), Some("NOODLE-BEEF"));
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        assert!(CsvParser.parse_to_raw_records(Path::new("non_existent.csv")).is_err());
    }

    #[test]
    fn test_csv_parser_skip_empty_rows() {
        let file = csv_file(&["订单号,数量", "A001,2", ",", "A002,1"]);
        let records = CsvParser.parse_to_raw_records(file.path()).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_universal_parser_rejects_unknown_extension() {
        let file = Builder::new().suffix(".txt").tempfile().unwrap();
        assert!(UniversalFileParser.parse_to_raw_records(file.path()).is_err());
    }
}
