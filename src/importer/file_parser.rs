// ==========================================
// 需求周同步工具 - 文件解析器实现
// ==========================================
// 职责: 文件 → SheetGrid（类型化单元格网格）
// 支持: Excel (.xlsx/.xls/.xlsm/.ods) / CSV (.csv)
// ==========================================

use crate::importer::error::{DocumentError, DocumentResult};
use crate::importer::sheet_grid::{CellValue, SheetGrid};
use calamine::{open_workbook_auto, Data, DataType, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;

/// 支持的 Excel 扩展名
pub const EXCEL_EXTENSIONS: &[&str] = &["xlsx", "xls", "xlsm", "ods"];

/// 工作表选择方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetSelector<'a> {
    First,
    Named(&'a str),
    Prefix(&'a str),
}

impl SheetSelector<'_> {
    fn pick(&self, names: &[String]) -> Option<String> {
        match self {
            SheetSelector::First => names.first().cloned(),
            SheetSelector::Named(name) => names.iter().find(|n| n.as_str() == *name).cloned(),
            SheetSelector::Prefix(prefix) => names.iter().find(|n| n.starts_with(prefix)).cloned(),
        }
    }

    fn describe(&self) -> String {
        match self {
            SheetSelector::First => "<第一个工作表>".to_string(),
            SheetSelector::Named(name) => name.to_string(),
            SheetSelector::Prefix(prefix) => format!("{}*", prefix),
        }
    }
}

// ==========================================
// WorkbookReader Trait
// ==========================================
// 用途: 读取工作表为 SheetGrid
// 实现者: CalamineReader, CsvReader, UniversalFileParser
pub trait WorkbookReader: Send + Sync {
    /// 读取选中的工作表
    ///
    /// # 返回
    /// - Ok(SheetGrid): 0 基绝对寻址的单元格网格
    /// - Err: 文件不存在、格式不支持、工作表缺失、解析失败
    fn read_sheet(&self, file_path: &Path, selector: SheetSelector<'_>)
        -> DocumentResult<SheetGrid>;
}

fn ensure_exists(path: &Path) -> DocumentResult<()> {
    if !path.exists() {
        return Err(DocumentError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

// ==========================================
// Excel Reader 实现 (calamine)
// ==========================================
pub struct CalamineReader;

impl CalamineReader {
    fn convert_cell(cell: &Data) -> CellValue {
        match cell {
            Data::Empty | Data::Error(_) => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
            Data::DateTime(_) | Data::DateTimeIso(_) => match cell.as_datetime() {
                Some(dt) => CellValue::Date(dt),
                None => CellValue::Text(cell.to_string()),
            },
            Data::DurationIso(s) => CellValue::Text(s.clone()),
        }
    }
}

impl WorkbookReader for CalamineReader {
    fn read_sheet(
        &self,
        file_path: &Path,
        selector: SheetSelector<'_>,
    ) -> DocumentResult<SheetGrid> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if !EXCEL_EXTENSIONS.contains(&ext.as_str()) {
            return Err(DocumentError::UnsupportedFormat(ext));
        }

        // 打开 Excel 文件
        let mut workbook = open_workbook_auto(file_path)?;
        let sheet_names = workbook.sheet_names();
        if sheet_names.is_empty() {
            return Err(DocumentError::ExcelParseError(
                "Excel 文件无工作表".to_string(),
            ));
        }

        let sheet_name = selector
            .pick(&sheet_names)
            .ok_or_else(|| DocumentError::SheetNotFound(selector.describe()))?;
        let range = workbook.worksheet_range(&sheet_name)?;

        // calamine 的 Range 从首个非空单元格开始，这里补齐为绝对坐标
        let (row_offset, col_offset) = range.start().unwrap_or((0, 0));
        let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); row_offset as usize];
        for data_row in range.rows() {
            let mut cells = vec![CellValue::Empty; col_offset as usize];
            cells.extend(data_row.iter().map(Self::convert_cell));
            rows.push(cells);
        }

        Ok(SheetGrid::new(sheet_name, rows))
    }
}

// ==========================================
// CSV Reader 实现
// ==========================================
// CSV 视为单个工作表，名称取文件名（不含扩展名）
pub struct CsvReader;

impl CsvReader {
    fn sheet_name(path: &Path) -> String {
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("csv")
            .to_string()
    }
}

impl WorkbookReader for CsvReader {
    fn read_sheet(
        &self,
        file_path: &Path,
        selector: SheetSelector<'_>,
    ) -> DocumentResult<SheetGrid> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "csv" {
            return Err(DocumentError::UnsupportedFormat(ext));
        }

        let name = Self::sheet_name(file_path);
        if selector.pick(std::slice::from_ref(&name)).is_none() {
            return Err(DocumentError::SheetNotFound(selector.describe()));
        }

        // 打开 CSV 文件（表头作为第 0 行保留在网格中）
        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let cells = record
                .iter()
                .map(|value| {
                    let trimmed = value.trim();
                    if trimmed.is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::Text(trimmed.to_string())
                    }
                })
                .collect();
            rows.push(cells);
        }

        Ok(SheetGrid::new(name, rows))
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    /// 扩展名是否受支持
    pub fn is_supported(path: &Path) -> bool {
        let ext = extension_of(path);
        ext == "csv" || EXCEL_EXTENSIONS.contains(&ext.as_str())
    }

    fn delegate(path: &Path) -> DocumentResult<&'static dyn WorkbookReader> {
        let ext = extension_of(path);
        match ext.as_str() {
            "csv" => Ok(&CsvReader as &dyn WorkbookReader),
            e if EXCEL_EXTENSIONS.contains(&e) => Ok(&CalamineReader as &dyn WorkbookReader),
            _ => Err(DocumentError::UnsupportedFormat(ext)),
        }
    }
}

impl WorkbookReader for UniversalFileParser {
    fn read_sheet(
        &self,
        file_path: &Path,
        selector: SheetSelector<'_>,
    ) -> DocumentResult<SheetGrid> {
        Self::delegate(file_path)?.read_sheet(file_path, selector)
    }
}

/// 文本日期解析（CSV 或文本格式单元格）
pub fn parse_date_text(value: &str) -> Option<NaiveDate> {
    let text = value.trim();
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d", "%d.%m.%Y", "%m/%d/%Y", "%Y/%m/%d"];
    const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d.%m.%Y %H:%M"];

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn csv_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(temp_file, "{}", line).unwrap();
        }
        temp_file
    }

    #[test]
    fn test_csv_reader_keeps_header_row() {
        let temp_file = csv_file(&[
            "Customer Item,Quantity,Planned Receipt Date",
            "X1,5,2025-01-10",
            "X2,,2025-01-11",
        ]);

        let grid = CsvReader
            .read_sheet(temp_file.path(), SheetSelector::First)
            .unwrap();

        assert_eq!(grid.height(), 3);
        assert_eq!(grid.get(0, 0).as_text().unwrap(), "Customer Item");
        assert_eq!(grid.get(1, 1).as_number(), Some(5.0));
        assert_eq!(grid.get(2, 1), &CellValue::Empty);
    }

    #[test]
    fn test_csv_reader_file_not_found() {
        let result = CsvReader.read_sheet(Path::new("non_existent.csv"), SheetSelector::First);
        assert!(matches!(result, Err(DocumentError::FileNotFound(_))));
    }

    #[test]
    fn test_universal_parser_rejects_unknown_extension() {
        let temp_file = Builder::new().suffix(".txt").tempfile().unwrap();
        let result = UniversalFileParser.read_sheet(temp_file.path(), SheetSelector::First);
        assert!(matches!(result, Err(DocumentError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_corrupt_excel_is_document_error() {
        let mut temp_file = Builder::new().suffix(".xlsx").tempfile().unwrap();
        writeln!(temp_file, "not a zip archive").unwrap();
        let result = UniversalFileParser.read_sheet(temp_file.path(), SheetSelector::First);
        assert!(result.is_err());
    }

    #[test]
    fn test_selector_pick() {
        let names = vec!["Zeitraum bis Bedarfsende".to_string(), "BKM Lieferbeziehung".to_string()];
        assert_eq!(
            SheetSelector::Prefix("BKM").pick(&names).as_deref(),
            Some("BKM Lieferbeziehung")
        );
        assert_eq!(SheetSelector::Named("EDI").pick(&names), None);
        assert_eq!(
            SheetSelector::First.pick(&names).as_deref(),
            Some("Zeitraum bis Bedarfsende")
        );
    }

    #[test]
    fn test_parse_date_text() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 10);
        assert_eq!(parse_date_text("2025-01-10"), expected);
        assert_eq!(parse_date_text("20250110"), expected);
        assert_eq!(parse_date_text("10.01.2025"), expected);
        assert_eq!(parse_date_text("2025-01-10 00:00:00"), expected);
        assert_eq!(parse_date_text("soon"), None);
    }
}
