// ==========================================
// 需求周同步工具 - 跟踪表存储 Trait
// ==========================================
// 职责: 定义跟踪表加载 / 提交接口（不包含实现）
// 红线: 提交前不得写盘；提交为整文件替换
// 实现者: XlsxTrackingStore
// ==========================================

use crate::engine::reconcile::TrackingGrid;
use crate::repository::error::PersistenceResult;

pub trait TrackingStore {
    /// 加载跟踪表为内存模型（按 (物料号, 子键) 建立索引）
    fn load(&mut self) -> PersistenceResult<TrackingGrid>;

    /// 将改动过的单元格写回并保存
    ///
    /// # 参数
    /// - grid: 对账后的内存模型（只写脏单元格、新行与表头）
    fn commit(&mut self, grid: &TrackingGrid) -> PersistenceResult<()>;
}
