// ==========================================
// 矿山设备车队决策支持系统 - 同型号设备对齐
// ==========================================
// 职责: 把同一型号多台设备的累计序列按"服役年次"对齐并求平均
// 约束: 分母固定为型号设备总数（缺失设备按 0 计入）
// 前置: 输入序列按设备 ID 升序排列，保证年次编号确定
// ==========================================

use crate::domain::period::PeriodKey;
use crate::domain::types::BreakdownType;
use crate::engine::cumulative::CumulativePoint;
use crate::engine::ratio::safe_ratio;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::instrument;

/// 对齐后的序列点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignedPoint {
    pub data_operation: String, // 相对期间标签: "2" / "2-Q3" / "2-05"
    pub cost_to_productivity_ratio: f64,
}

#[derive(Debug, Default, Clone)]
struct AlignedSlot {
    relative_year: Option<u32>,
    sub_period: Option<u32>,
    ratio_sum: f64,
}

impl AlignedSlot {
    fn label(&self, breakdown: BreakdownType) -> String {
        let year = self.relative_year.unwrap_or(0);
        match (breakdown, self.sub_period) {
            (BreakdownType::Quarter, Some(q)) => format!("{}-Q{}", year, q),
            (BreakdownType::Month, Some(m)) => format!("{}-{:02}", year, m),
            _ => format!("{}", year),
        }
    }
}

// ==========================================
// MarkAligner - 型号对齐器
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkAligner;

impl MarkAligner {
    pub fn new() -> Self {
        Self
    }

    /// 对齐并平均
    ///
    /// # 参数
    /// - `series`: 各设备累计序列（设备 ID 升序）
    /// - `breakdown`: 粒度，决定相对期间标签格式
    /// - `cohort_size`: 型号设备总数（平均分母）
    ///
    /// # 返回
    /// - 按 (相对年次, 子期间) 升序的对齐序列；无输入或分母为 0 时为空
    #[instrument(level = "debug", skip(self, series), fields(machines = series.len()))]
    pub fn align(
        &self,
        series: &[Vec<CumulativePoint>],
        breakdown: BreakdownType,
        cohort_size: usize,
    ) -> Vec<AlignedPoint> {
        let max_len = series.iter().map(Vec::len).max().unwrap_or(0);
        if max_len == 0 || cohort_size == 0 {
            return Vec::new();
        }

        let mut slots: Vec<AlignedSlot> = vec![AlignedSlot::default(); max_len];
        let mut year_index: HashMap<i32, u32> = HashMap::new();

        for machine_series in series {
            for (i, point) in machine_series.iter().enumerate() {
                let slot = &mut slots[i];
                slot.ratio_sum += point.cost_to_productivity_ratio;
                if slot.relative_year.is_some() {
                    continue;
                }

                // 首台在该位置有数据的设备决定标签
                match PeriodKey::parse_label(&point.combined_date) {
                    Some(key) => {
                        let next = year_index.len() as u32 + 1;
                        let relative = *year_index.entry(key.year).or_insert(next);
                        slot.relative_year = Some(relative);
                        slot.sub_period = match breakdown {
                            BreakdownType::Year => None,
                            _ if key.breakdown() == breakdown => key.sub_period(),
                            _ => Some(1),
                        };
                    }
                    None => {
                        slot.relative_year = Some(i as u32 + 1);
                        slot.sub_period = None;
                    }
                }
            }
        }

        let cohort = cohort_size as f64;
        slots.sort_by_key(|s| (s.relative_year, s.sub_period));
        slots
            .iter()
            .map(|slot| AlignedPoint {
                data_operation: slot.label(breakdown),
                cost_to_productivity_ratio: safe_ratio(slot.ratio_sum, cohort),
            })
            .collect()
    }
}
