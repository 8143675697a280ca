// ==========================================
// 导入层集成测试
// ==========================================
// 测试目标: 真实 xlsx / csv 文件经读取器与提取器后的记录
// ==========================================


use demand_sync::config::{FlatTableLayout, MatrixLayout};
use demand_sync::importer::{
    DocumentError, ExtractContext, FlatTableExtractor, MatrixExtractor, RecordExtractor,
    UniversalFileParser,
};
use tempfile::TempDir;
use test_helpers::*;

#[test]
fn test_matrix_file_with_marker_and_backlog() {
    let dir = TempDir::new().unwrap();
    let path = write_matrix_file(
        dir.path(),
        "abruf.xlsx",
        "A0001234",
        &["01/2025", "02/2025", "03/2025"],
        &[Some(10.0), Some(4.0), None],
        &[
            MarkerFixture {
                label: "ABS 77A",
                quantities: vec![Some(5.0), Some(6.0), Some(7.0)],
                backlog: Some(3.5),
            },
            MarkerFixture {
                label: "ABS gesamt",
                quantities: vec![Some(1.0)],
                backlog: None,
            },
        ],
    );

    let extraction = MatrixExtractor::new(MatrixLayout::default())
        .extract(&path, &UniversalFileParser, &ExtractContext::new(date(2025, 1, 8)))
        .unwrap();

    assert_eq!(extraction.demand.len(), 2);
    assert_eq!(extraction.markers.len(), 1);
    let marker = &extraction.markers[0];
    assert_eq!(marker.customer_item, "A0001234");
    assert_eq!(marker.sub_key, "77A");
    assert_eq!(marker.quantities, vec![Some(6), Some(7), None, None, None]);
    assert_eq!(marker.backlog, Some(3.5));
}

#[test]
fn test_matrix_file_without_named_sheet_is_skipped() {
    let dir = TempDir::new().unwrap();
    let path = write_flat_table(dir.path(), "ma.xlsx", &[("X1", 1.0, "2025-01-10")]);

    let result = MatrixExtractor::new(MatrixLayout::default()).extract(
        &path,
        &UniversalFileParser,
        &ExtractContext::new(date(2025, 1, 8)),
    );

    assert!(matches!(result, Err(DocumentError::SheetNotFound(_))));
}

#[test]
fn test_flat_table_from_csv() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ma.csv");
    std::fs::write(
        &path,
        "Customer Item,Quantity,Planned Receipt Date\nX1,5,10.01.2025\nX1,3,2025-01-10\nX2,-1,2025-01-10\n",
    )
    .unwrap();

    let extraction = FlatTableExtractor::new(FlatTableLayout::default())
        .extract(&path, &UniversalFileParser, &ExtractContext::new(date(2025, 1, 8)))
        .unwrap();

    assert_eq!(extraction.demand.len(), 2);
    assert!(extraction
        .demand
        .iter()
        .all(|r| r.calendar_week.to_string() == "25CW02"));
    assert_eq!(extraction.skipped.len(), 1);
}
