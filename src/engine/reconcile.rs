// ==========================================
// 需求周同步工具 - 跟踪表对账 / Upsert 引擎
// ==========================================
// 职责: 标记记录 → 跟踪表行（命中覆盖，未命中追加）
// 键:   (物料号, 子键)
// 红线: 仅覆盖，不累加（同一输入重复运行结果不变）
// 红线: 引擎只改内存中的 TrackingGrid，落盘由 TrackingStore 负责
// ==========================================

use crate::config::GridLayout;
use crate::domain::record::{GridKey, MarkerRecord, WINDOW_WIDTH};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info, instrument, warn};

// ==========================================
// TrackedRow - 跟踪表中的一行
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedRow {
    pub sheet_row: u32, // 0 基行号
    pub key: GridKey,
    pub window: [Option<f64>; WINDOW_WIDTH],
    pub backlog: Option<f64>,
    pub is_new: bool,
    pub key_normalized: bool, // 加载时去掉了旧前缀，需要回写子键
    dirty_window: [bool; WINDOW_WIDTH],
    dirty_backlog: bool,
}

impl TrackedRow {
    /// 从已有工作表加载的行
    pub fn loaded(
        sheet_row: u32,
        key: GridKey,
        window: [Option<f64>; WINDOW_WIDTH],
        backlog: Option<f64>,
    ) -> Self {
        Self {
            sheet_row,
            key,
            window,
            backlog,
            is_new: false,
            key_normalized: false,
            dirty_window: [false; WINDOW_WIDTH],
            dirty_backlog: false,
        }
    }

    fn appended(sheet_row: u32, key: GridKey) -> Self {
        Self {
            is_new: true,
            ..Self::loaded(sheet_row, key, [None; WINDOW_WIDTH], None)
        }
    }

    /// 覆盖窗口单元格（值不变时不标脏）
    pub fn set_window(&mut self, slot: usize, value: f64) {
        if let Some(cell) = self.window.get_mut(slot) {
            if *cell != Some(value) {
                *cell = Some(value);
                self.dirty_window[slot] = true;
            }
        }
    }

    pub fn set_backlog(&mut self, value: f64) {
        if self.backlog != Some(value) {
            self.backlog = Some(value);
            self.dirty_backlog = true;
        }
    }

    pub fn is_window_dirty(&self, slot: usize) -> bool {
        self.dirty_window.get(slot).copied().unwrap_or(false)
    }

    pub fn is_backlog_dirty(&self) -> bool {
        self.dirty_backlog
    }

    /// 是否有任何需要写回的单元格
    pub fn is_touched(&self) -> bool {
        self.is_new
            || self.key_normalized
            || self.dirty_backlog
            || self.dirty_window.iter().any(|d| *d)
    }
}

// ==========================================
// TrackingGrid - 跟踪表内存模型
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct TrackingGrid {
    rows: Vec<TrackedRow>,
    index: HashMap<GridKey, usize>,
    header: BTreeMap<u32, String>, // 列号 → 周标签（全表共享）
    dirty_header: BTreeSet<u32>,
    next_sheet_row: u32,
}

impl TrackingGrid {
    /// 空网格（first_free_row 为下一个可追加的 0 基行号）
    pub fn new(first_free_row: u32) -> Self {
        Self {
            next_sheet_row: first_free_row,
            ..Self::default()
        }
    }

    /// 加载已有行（重复键时后出现的行生效）
    pub fn push_loaded(&mut self, row: TrackedRow) {
        let idx = self.rows.len();
        self.next_sheet_row = self.next_sheet_row.max(row.sheet_row + 1);
        if let Some(previous) = self.index.insert(row.key.clone(), idx) {
            warn!(
                key = %row.key,
                previous_row = self.rows[previous].sheet_row + 1,
                row = row.sheet_row + 1,
                "跟踪表存在重复键，以后出现的行为准"
            );
        }
        self.rows.push(row);
    }

    /// 加载已有的表头标签
    pub fn load_header(&mut self, col: u32, label: impl Into<String>) {
        self.header.insert(col, label.into());
    }

    /// 保证追加行不低于指定行号（工作表已使用区域的下一行）
    pub fn reserve_until(&mut self, first_free_row: u32) {
        self.next_sheet_row = self.next_sheet_row.max(first_free_row);
    }

    pub fn find(&self, key: &GridKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// 追加新行并登记索引
    pub fn append_row(&mut self, key: GridKey) -> usize {
        let idx = self.rows.len();
        let row = TrackedRow::appended(self.next_sheet_row, key.clone());
        self.next_sheet_row += 1;
        self.rows.push(row);
        self.index.insert(key, idx);
        idx
    }

    pub fn row(&self, idx: usize) -> Option<&TrackedRow> {
        self.rows.get(idx)
    }

    pub fn row_mut(&mut self, idx: usize) -> Option<&mut TrackedRow> {
        self.rows.get_mut(idx)
    }

    pub fn rows(&self) -> &[TrackedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn header(&self) -> &BTreeMap<u32, String> {
        &self.header
    }

    /// 本次运行改动过的表头列
    pub fn dirty_header(&self) -> impl Iterator<Item = (u32, &str)> + '_ {
        self.dirty_header
            .iter()
            .filter_map(|col| self.header.get(col).map(|label| (*col, label.as_str())))
    }

    fn set_header(&mut self, col: u32, label: String) {
        if self.header.get(&col) != Some(&label) {
            self.header.insert(col, label);
            self.dirty_header.insert(col);
        }
    }
}

/// 存储的子键标准化（去掉旧格式前缀 "ABS "）
///
/// # 返回
/// (标准化后的子键, 是否发生了改写)
pub fn normalize_stored_key(raw: &str, legacy_prefix: &str) -> (String, bool) {
    let trimmed = raw.trim();
    let prefix = legacy_prefix.trim();
    if !prefix.is_empty() {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            if rest.starts_with(char::is_whitespace) {
                return (rest.trim().to_string(), true);
            }
        }
    }
    (trimmed.to_string(), false)
}

// ==========================================
// ReconcileReport - 对账结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub updated: usize,
    pub inserted: usize,
    pub backlog_written: usize,
    pub header_overwrites: usize, // 同一表头列被不同标签覆盖的次数
}

/// 标记记录对账（Upsert）
///
/// # 参数
/// - grid: 已加载的跟踪表（会被修改）
/// - markers: 本次运行的标记记录（按提取顺序）
/// - layout: 跟踪表列布局
///
/// # 返回
/// 对账统计
#[instrument(skip(grid, markers, layout), fields(markers = markers.len(), rows = grid.len()))]
pub fn reconcile(
    grid: &mut TrackingGrid,
    markers: &[MarkerRecord],
    layout: &GridLayout,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    let mut assigned: HashMap<u32, String> = HashMap::new(); // 本次运行已写入的表头

    for marker in markers {
        let key = marker.grid_key();
        let idx = match grid.find(&key) {
            Some(idx) => {
                report.updated += 1;
                idx
            }
            None => {
                report.inserted += 1;
                let idx = grid.append_row(key.clone());
                debug!(key = %key, "追加新行");
                idx
            }
        };

        for (slot, quantity, week) in marker.slots() {
            let Some(&col) = layout.window_cols.get(slot) else {
                continue;
            };
            if let Some(quantity) = quantity {
                if let Some(row) = grid.row_mut(idx) {
                    row.set_window(slot, quantity as f64);
                }
            }
            if let Some(week) = week {
                let label = week.to_string();
                if let Some(previous) = assigned.insert(col, label.clone()) {
                    if previous != label {
                        report.header_overwrites += 1;
                        warn!(col, previous = %previous, label = %label, key = %key, "表头周标签冲突，以后写入者为准");
                    }
                }
                grid.set_header(col, label);
            }
        }

        if let Some(backlog) = marker.backlog {
            if let Some(row) = grid.row_mut(idx) {
                row.set_backlog(backlog);
                report.backlog_written += 1;
            }
        }
    }

    info!(
        updated = report.updated,
        inserted = report.inserted,
        backlog_written = report.backlog_written,
        header_overwrites = report.header_overwrites,
        "对账完成"
    );
    report
}
