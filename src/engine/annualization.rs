// ==========================================
// 矿山设备车队决策支持系统 - 年化归一
// ==========================================
// 职责: 把五要素按比例放大/缩小到整年小时数 (8760 / 8784)
// 约束: 观测合计为 0 时不缩放；实际与计划各用各自合计
// ==========================================

use crate::domain::facts::CtfComponents;
use crate::domain::period::hours_in_year;
use crate::engine::ratio::safe_ratio;

#[derive(Debug, Default, Clone, Copy)]
pub struct AnnualizationNormalizer;

impl AnnualizationNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// 按 `year` 的全年小时数归一
    pub fn normalize(&self, components: &CtfComponents, year: i32) -> CtfComponents {
        let observed = components.total();
        if observed == 0.0 {
            return *components;
        }
        components.scaled(safe_ratio(hours_in_year(year), observed))
    }
}
