// ==========================================
// 需求周同步工具 - 跟踪表 xlsx 存储实现
// ==========================================
// 工具: umya-spreadsheet（读-改-写，保留其余工作表与样式）
// 坐标: 内部 0 基 (row, col)；umya 为 1 基 (col, row)，仅在本文件转换
// 保存: 同目录临时文件 + rename，整文件替换
// ==========================================

use crate::config::GridLayout;
use crate::domain::record::{GridKey, WINDOW_WIDTH};
use crate::engine::reconcile::{normalize_stored_key, TrackedRow, TrackingGrid};
use crate::importer::sheet_grid::format_number;
use crate::repository::error::{PersistenceError, PersistenceResult};
use crate::repository::tracking_store::TrackingStore;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, info, instrument, warn};
use umya_spreadsheet::{reader::xlsx, writer, CellRawValue, Spreadsheet, Worksheet};

/// 保存用临时文件前缀（文件发现时排除）
pub const TEMP_FILE_PREFIX: &str = ".demand-sync-";

pub struct XlsxTrackingStore {
    path: PathBuf,
    layout: GridLayout,
    book: Option<Spreadsheet>,
}

impl XlsxTrackingStore {
    /// # 参数
    /// - path: 跟踪表文件路径
    /// - layout: 列布局
    pub fn new(path: impl Into<PathBuf>, layout: GridLayout) -> Self {
        Self {
            path: path.into(),
            layout,
            book: None,
        }
    }

    /// Office 占用锁文件 "~$<文件名>"
    fn lock_file(&self) -> Option<PathBuf> {
        let name = self.path.file_name()?.to_str()?;
        Some(self.path.with_file_name(format!("~${}", name)))
    }

    /// 新行填充色（RGB 自动补 Alpha）
    fn fill_argb(&self) -> String {
        let color = self.layout.new_row_fill.trim().trim_start_matches('#').to_uppercase();
        if color.len() == 6 {
            format!("FF{}", color)
        } else {
            color
        }
    }

    fn rows_from_sheet(&self, ws: &Worksheet) -> TrackingGrid {
        let layout = &self.layout;
        let highest_row = ws.get_highest_row();
        let mut grid = TrackingGrid::new(layout.first_data_row);

        for &col in &layout.window_cols {
            if let Some(label) = cell_text(ws, layout.header_row, col) {
                grid.load_header(col, label);
            }
        }

        for row in layout.first_data_row..highest_row {
            let (Some(item), Some(raw_marker)) = (
                cell_text(ws, row, layout.item_col),
                cell_text(ws, row, layout.marker_col),
            ) else {
                continue;
            };

            let (sub_key, normalized) =
                normalize_stored_key(&raw_marker, &layout.legacy_marker_prefix);
            let mut window = [None; WINDOW_WIDTH];
            for (slot, &col) in layout.window_cols.iter().take(WINDOW_WIDTH).enumerate() {
                window[slot] = cell_number(ws, row, col);
            }
            let backlog = cell_number(ws, row, layout.backlog_col);

            let mut tracked = TrackedRow::loaded(row, GridKey::new(item, sub_key), window, backlog);
            tracked.key_normalized = normalized;
            grid.push_loaded(tracked);
        }

        grid.reserve_until(highest_row);
        grid
    }

    fn write_rows(&self, ws: &mut Worksheet, grid: &TrackingGrid) -> (usize, usize) {
        let layout = &self.layout;
        let fill = self.fill_argb();
        let needed_cols = layout
            .window_cols
            .iter()
            .chain([layout.item_col, layout.marker_col, layout.backlog_col].iter())
            .max()
            .map_or(0, |c| c + 1);
        let fill_width = ws.get_highest_column().max(needed_cols);

        let (mut new_rows, mut touched_rows) = (0, 0);
        for row in grid.rows().iter().filter(|r| r.is_touched()) {
            touched_rows += 1;
            let sheet_row = row.sheet_row;

            if row.is_new {
                new_rows += 1;
                set_text(ws, sheet_row, layout.item_col, &row.key.customer_item);
                set_text(ws, sheet_row, layout.marker_col, &row.key.sub_key);
                for col in 0..fill_width {
                    ws.get_style_mut((col + 1, sheet_row + 1))
                        .set_background_color(fill.as_str());
                }
            } else if row.key_normalized {
                set_text(ws, sheet_row, layout.marker_col, &row.key.sub_key);
            }

            for (slot, &col) in layout.window_cols.iter().take(WINDOW_WIDTH).enumerate() {
                if let (true, Some(value)) = (row.is_window_dirty(slot), row.window[slot]) {
                    ws.get_cell_mut((col + 1, sheet_row + 1))
                        .set_value_number(value);
                }
            }
            if let (true, Some(backlog)) = (row.is_backlog_dirty(), row.backlog) {
                ws.get_cell_mut((layout.backlog_col + 1, sheet_row + 1))
                    .set_value_number(backlog);
            }
        }

        for (col, label) in grid.dirty_header() {
            set_text(ws, layout.header_row, col, label);
        }

        (new_rows, touched_rows)
    }

    /// 写入同目录临时文件后整体替换
    fn save_atomically(&self, book: &Spreadsheet) -> PersistenceResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let temp = tempfile::Builder::new()
            .prefix(TEMP_FILE_PREFIX)
            .suffix(".xlsx")
            .tempfile_in(&dir)?;

        writer::xlsx::write(book, temp.path())
            .map_err(|e| PersistenceError::WriteFailed(e.to_string()))?;

        // 替换后沿用原文件权限
        if let Ok(metadata) = std::fs::metadata(&self.path) {
            std::fs::set_permissions(temp.path(), metadata.permissions())?;
        }

        temp.persist(&self.path).map_err(|e| match e.error.kind() {
            ErrorKind::PermissionDenied => PersistenceError::Locked(self.path.display().to_string()),
            _ => PersistenceError::WriteFailed(e.error.to_string()),
        })?;
        Ok(())
    }
}

impl TrackingStore for XlsxTrackingStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn load(&mut self) -> PersistenceResult<TrackingGrid> {
        if !self.path.exists() {
            return Err(PersistenceError::NotFound(self.path.display().to_string()));
        }

        let book = xlsx::read(&self.path).map_err(|e| PersistenceError::Corrupt(e.to_string()))?;
        let ws = book
            .get_sheet_by_name(&self.layout.sheet_name)
            .ok_or_else(|| PersistenceError::SheetNotFound(self.layout.sheet_name.clone()))?;

        let grid = self.rows_from_sheet(ws);
        debug!(rows = grid.len(), "跟踪表加载完成");
        self.book = Some(book);
        Ok(grid)
    }

    #[instrument(skip(self, grid), fields(path = %self.path.display()))]
    fn commit(&mut self, grid: &TrackingGrid) -> PersistenceResult<()> {
        if let Some(lock) = self.lock_file() {
            if lock.exists() {
                warn!(lock = %lock.display(), "跟踪表正被其他程序打开");
                return Err(PersistenceError::Locked(self.path.display().to_string()));
            }
        }

        let mut book = self.book.take().ok_or(PersistenceError::NotLoaded)?;
        let ws = book
            .get_sheet_by_name_mut(&self.layout.sheet_name)
            .ok_or_else(|| PersistenceError::SheetNotFound(self.layout.sheet_name.clone()))?;

        let (new_rows, touched_rows) = self.write_rows(ws, grid);
        let result = self.save_atomically(&book);
        self.book = Some(book);
        result?;

        info!(new_rows, touched_rows, "跟踪表已保存");
        Ok(())
    }
}

// ==========================================
// 单元格读写辅助（0 基 → umya 1 基）
// ==========================================

fn cell_text(ws: &Worksheet, row: u32, col: u32) -> Option<String> {
    let cell = ws.get_cell((col + 1, row + 1))?;
    let text = match cell.get_cell_value().get_raw_value() {
        CellRawValue::Numeric(n) => format_number(*n),
        CellRawValue::String(s) => s.to_string(),
        CellRawValue::RichText(rt) => rt.get_text().to_string(),
        CellRawValue::Lazy(s) => s.to_string(),
        _ => return None,
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn cell_number(ws: &Worksheet, row: u32, col: u32) -> Option<f64> {
    let cell = ws.get_cell((col + 1, row + 1))?;
    match cell.get_cell_value().get_raw_value() {
        CellRawValue::Numeric(n) => Some(*n),
        CellRawValue::String(s) => s.trim().parse().ok(),
        CellRawValue::Lazy(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn set_text(ws: &mut Worksheet, row: u32, col: u32, value: &str) {
    ws.get_cell_mut((col + 1, row + 1)).set_value_string(value);
}
