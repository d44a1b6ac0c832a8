// ==========================================
// 工程报价系统 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx/.xls/.ods，仅第一个工作表) / CSV (.csv)
// 输入: 文件路径 或 上传缓冲区
// 说明: 表头按原文保留（不去空格），列名匹配只认显式列出的写法
// 说明: 行号为表头之后的数据行序号，空白行保留（由行解析计为跳过）
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::material_importer_trait::{FileParser, RawRow, SourceRow};
use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader};
use csv::{ByteRecord, ReaderBuilder};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

// ==========================================
// CSV Parser 实现
// ==========================================
// 逐行按 UTF-8 解码：某一行解码失败只影响该行
pub struct CsvParser;

impl CsvParser {
    fn read_records<R: std::io::Read>(&self, source: R) -> ImportResult<Vec<SourceRow>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(source);

        // 表头无法解码时按有损转换，此类列名不会命中任何同义词
        let headers: Vec<String> = reader
            .byte_headers()?
            .iter()
            .map(|h| String::from_utf8_lossy(h).into_owned())
            .collect();

        let mut records = Vec::new();
        for (idx, result) in reader.byte_records().enumerate() {
            let record = result?;
            let cells = decode_record(&headers, &record)
                .map_err(|e| format!("无效的 UTF-8 编码: {}", e));

            records.push(SourceRow {
                row_number: idx + 1,
                cells,
            });
        }

        Ok(records)
    }
}

/// 按表头解码一行
fn decode_record(headers: &[String], record: &ByteRecord) -> Result<RawRow, std::str::Utf8Error> {
    let mut row_map = HashMap::new();

    for (col_idx, raw) in record.iter().enumerate() {
        if let Some(header) = headers.get(col_idx) {
            row_map.insert(header.clone(), std::str::from_utf8(raw)?.to_string());
        }
    }

    Ok(row_map)
}

impl FileParser for CsvParser {
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<SourceRow>> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        let ext = extension_of(&file_path.to_string_lossy());
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        self.read_records(file)
    }

    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<Vec<SourceRow>> {
        self.read_records(bytes)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<SourceRow>> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        let ext = extension_of(&file_path.to_string_lossy());
        if !matches!(ext.as_str(), "xlsx" | "xls" | "ods") {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;
        read_first_sheet(&mut workbook)
    }

    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<Vec<SourceRow>> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
        read_first_sheet(&mut workbook)
    }
}

/// 读取第一个工作表：首行为表头，其余为数据行
fn read_first_sheet<RS, R>(workbook: &mut R) -> ImportResult<Vec<SourceRow>>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: std::fmt::Display,
{
    let sheet_names = workbook.sheet_names();
    let sheet_name = sheet_names
        .first()
        .cloned()
        .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

    Ok(rows_from_range(&range))
}

fn rows_from_range(range: &Range<Data>) -> Vec<SourceRow> {
    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(|cell| cell.to_string()).collect(),
        None => return Vec::new(),
    };

    let mut records = Vec::new();
    for (idx, data_row) in rows.enumerate() {
        let mut row_map = HashMap::new();

        for (col_idx, cell) in data_row.iter().enumerate() {
            if let Some(header) = headers.get(col_idx) {
                // 无表头的列不参与映射
                if header.is_empty() {
                    continue;
                }
                row_map.insert(header.clone(), cell.to_string());
            }
        }

        records.push(SourceRow::new(idx + 1, row_map));
    }

    records
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<Vec<SourceRow>> {
        let path = file_path.as_ref();
        let ext = extension_of(&path.to_string_lossy());

        match ext.as_str() {
            "csv" => CsvParser.parse_to_raw_records(path),
            "xlsx" | "xls" | "ods" => ExcelParser.parse_to_raw_records(path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }

    /// 解析上传内容（按原始文件名识别格式）
    pub fn parse_bytes(&self, file_name: &str, bytes: &[u8]) -> ImportResult<Vec<SourceRow>> {
        let ext = extension_of(file_name);

        match ext.as_str() {
            "csv" => CsvParser.parse_bytes(bytes),
            "xlsx" | "xls" | "ods" => ExcelParser.parse_bytes(bytes),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

/// 小写扩展名（无扩展名时为空串）
fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn fixture(name: &str) -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name)
    }

    fn cells(row: &SourceRow) -> &RawRow {
        row.cells.as_ref().unwrap()
    }

    #[test]
    fn test_csv_parser_valid_file() {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(temp_file, "nombre,Valor Int.,UN.").unwrap();
        writeln!(temp_file, "Cable THHN,450,m").unwrap();
        writeln!(temp_file, "Tubo PVC,1200,C/u").unwrap();

        let records = CsvParser.parse_to_raw_records(temp_file.path()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].row_number, 1);
        assert_eq!(cells(&records[0]).get("nombre"), Some(&"Cable THHN".to_string()));
        assert_eq!(cells(&records[0]).get("Valor Int."), Some(&"450".to_string()));
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser.parse_to_raw_records(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_csv_blank_rows_keep_numbering() {
        let data = "nombre,valor_int\nCable,450\n,\n,\nTubo,abc\n";
        let records = CsvParser.parse_bytes(data.as_bytes()).unwrap();

        assert_eq!(records.len(), 4);
        assert!(cells(&records[1]).values().all(|v| v.is_empty()));
        assert_eq!(records[3].row_number, 4);
        assert_eq!(cells(&records[3]).get("nombre"), Some(&"Tubo".to_string()));
    }

    #[test]
    fn test_csv_undecodable_row_fails_alone() {
        // 第 2 行为 Windows-1252 编码的 "Caño"
        let data: &[u8] = b"nombre,valor_int\nCable,450\nCa\xF1o PVC,1200\nFoco,2990\n";
        let records = CsvParser.parse_bytes(data).unwrap();

        assert_eq!(records.len(), 3);
        assert!(records[0].cells.is_ok());
        assert_eq!(records[1].row_number, 2);
        assert!(records[1].cells.as_ref().unwrap_err().contains("UTF-8"));
        assert_eq!(cells(&records[2]).get("nombre"), Some(&"Foco".to_string()));
    }

    #[test]
    fn test_headers_kept_verbatim() {
        let data = " nombre,valor_int\nCable,450\n";
        let records = CsvParser.parse_bytes(data.as_bytes()).unwrap();
        assert!(cells(&records[0]).contains_key(" nombre"));
        assert!(!cells(&records[0]).contains_key("nombre"));
    }

    #[test]
    fn test_universal_parser_rejects_unknown_extension() {
        let result = UniversalFileParser.parse_bytes("catalogo.pdf", b"%PDF");
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(ext)) if ext == "pdf"));
    }

    #[test]
    fn test_universal_parser_dispatches_csv_bytes() {
        let records = UniversalFileParser
            .parse_bytes("Catalogo.CSV", "Nombre,Precio\nFoco LED,2990\n".as_bytes())
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(cells(&records[0]).get("Precio"), Some(&"2990".to_string()));
    }

    #[test]
    fn test_excel_fixture_numeric_cells_and_unnamed_column() {
        let records = ExcelParser
            .parse_to_raw_records(&fixture("lista_precios.xlsx"))
            .unwrap();

        assert_eq!(records.len(), 5);

        let cable = cells(&records[0]);
        assert_eq!(cable.get("Descripcion"), Some(&"Cable THHN 12 AWG".to_string()));
        assert_eq!(cable.get("Valor Int."), Some(&"450".to_string()));
        assert!(!cable.contains_key(""));

        assert_eq!(cells(&records[1]).get("Valor Int."), Some(&"2990.5".to_string()));
        assert!(cells(&records[2]).values().all(|v| v.is_empty()));
        assert_eq!(records[3].row_number, 4);
    }

    #[test]
    fn test_excel_bytes_match_file() {
        let path = fixture("lista_precios.xlsx");
        let bytes = std::fs::read(&path).unwrap();

        let from_bytes = UniversalFileParser.parse_bytes("lista_precios.xlsx", &bytes).unwrap();
        let from_file = UniversalFileParser.parse(&path).unwrap();
        assert_eq!(from_bytes, from_file);
    }

    #[test]
    fn test_excel_bytes_garbage_is_parse_error() {
        let result = ExcelParser.parse_bytes(b"not a workbook");
        assert!(matches!(result, Err(ImportError::ExcelParseError(_))));
    }
}
