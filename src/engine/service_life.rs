// ==========================================
// 矿山设备车队决策支持系统 - 服役年限聚合
// ==========================================
// 职责: 按服役年限 (记录年份 - 投运年份) 统计平均实际工作时间
// 流程: (年限, 年份) → 合计/条数 → 按年限汇总 → 平均值 + 安全系数
// ==========================================

use crate::domain::facts::{num, CtfRecord};
use crate::domain::machine::Machine;
use crate::engine::ratio::safe_ratio;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::instrument;

/// 安全系数默认值
pub const DEFAULT_SERVICE_LIFE_MARGIN: f64 = 1.15;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLifePoint {
    pub service_life: i32,
    pub average_work_time: f64,
    pub average_work_time_with_margin: f64,
}

#[derive(Debug, Default, Clone, Copy)]
struct SumCount {
    sum: f64,
    count: u32,
}

impl SumCount {
    fn merge(&mut self, other: &SumCount) {
        self.sum += other.sum;
        self.count += other.count;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ServiceLifeAggregator {
    margin: f64,
}

impl Default for ServiceLifeAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_LIFE_MARGIN)
    }
}

impl ServiceLifeAggregator {
    pub fn new(margin: f64) -> Self {
        Self { margin }
    }

    /// # 参数
    /// - `machines`: 用于取投运年份；无投运日期的设备记录被跳过
    /// - `records`: CTF 记录（取 worktime_f）
    #[instrument(level = "debug", skip(self, machines, records), fields(records = records.len()))]
    pub fn aggregate(&self, machines: &[Machine], records: &[CtfRecord]) -> Vec<ServiceLifePoint> {
        let commissioning: HashMap<i64, i32> = machines
            .iter()
            .filter_map(|m| m.commissioning_year().map(|y| (m.id, y)))
            .collect();

        let mut by_life_year: BTreeMap<(i32, i32), SumCount> = BTreeMap::new();
        for record in records {
            let (Some(date), Some(&entry_year)) =
                (record.date_period, commissioning.get(&record.machine_id))
            else {
                continue;
            };
            let year = date.year();
            let slot = by_life_year.entry((year - entry_year, year)).or_default();
            slot.sum += num(record.worktime_f);
            slot.count += 1;
        }

        let mut by_life: BTreeMap<i32, SumCount> = BTreeMap::new();
        for ((life, _), totals) in &by_life_year {
            by_life.entry(*life).or_default().merge(totals);
        }

        by_life
            .into_iter()
            .map(|(service_life, totals)| {
                let average = safe_ratio(totals.sum, f64::from(totals.count));
                ServiceLifePoint {
                    service_life,
                    average_work_time: average,
                    average_work_time_with_margin: average * self.margin,
                }
            })
            .collect()
    }
}
