// ==========================================
// 矿山设备车队决策支持系统 - 期间补齐引擎
// ==========================================
// 职责: 日期范围内缺失的期间补零
// 红线: 不覆盖已有期间
// 输出: BTreeMap 天然按 (年, 季度/月) 升序
// ==========================================

use crate::domain::period::{DateRange, PeriodKey};
use crate::domain::types::BreakdownType;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tracing::instrument;

/// 期间序列（按期间键升序）
pub type PeriodSeries<V> = BTreeMap<PeriodKey, V>;

// ==========================================
// GapFiller - 期间补齐引擎
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct GapFiller;

impl GapFiller {
    pub fn new() -> Self {
        Self
    }

    /// 补齐范围内的全部期间
    ///
    /// # 参数
    /// - `series`: 稀疏期间序列（原地补齐）
    /// - `range`: 日期范围（闭区间）
    /// - `breakdown`: 粒度
    ///
    /// # 返回
    /// - 新插入的期间数
    #[instrument(level = "debug", skip(self, series), fields(existing = series.len()))]
    pub fn fill<V: Default>(
        &self,
        series: &mut PeriodSeries<V>,
        range: &DateRange,
        breakdown: BreakdownType,
    ) -> usize {
        let mut inserted = 0;
        for period in range.periods(breakdown) {
            if let Entry::Vacant(slot) = series.entry(period) {
                slot.insert(V::default());
                inserted += 1;
            }
        }
        inserted
    }

    /// 按日历年补齐（年度图表）
    pub fn fill_years<V: Default>(&self, series: &mut BTreeMap<i32, V>, range: &DateRange) -> usize {
        let mut inserted = 0;
        for year in range.years() {
            if let Entry::Vacant(slot) = series.entry(year) {
                slot.insert(V::default());
                inserted += 1;
            }
        }
        inserted
    }
}
