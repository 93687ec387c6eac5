// ==========================================
// 矿山设备车队决策支持系统 - 累计单位成本序列
// ==========================================
// 职责: 单台设备按期间累计成本/产量，计算累计单位成本，
//       在投运期间注入购置成本，并裁剪首尾零值期间
// 约束: 仅实际数据 (is_model = false)；比值经 safe_ratio
// ==========================================

use crate::domain::facts::{num, CostRecord, WorkTimeProductivityRecord};
use crate::domain::machine::Machine;
use crate::domain::period::{DateRange, PeriodKey};
use crate::domain::types::BreakdownType;
use crate::engine::gap_filler::{GapFiller, PeriodSeries};
use crate::engine::ratio::safe_ratio;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// 累计序列点（累计成本不对外输出）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CumulativePoint {
    pub combined_date: String,
    pub productivity: f64,
    pub cost_to_productivity_ratio: f64,
}

#[derive(Debug, Default, Clone, Copy)]
struct PeriodTotals {
    cost: f64,
    productivity: f64,
}

#[derive(Debug, Clone, Copy)]
struct RunningEntry {
    period: PeriodKey,
    productivity: f64,
    accumulated_cost: f64,
    accumulated_productivity: f64,
    ratio: f64,
}

/// 去掉首尾满足 `is_zero` 的元素，保留中间的零值
///
/// 全部为零或为空时返回空
pub fn trim_zero_edges<T, F>(items: Vec<T>, is_zero: F) -> Vec<T>
where
    F: Fn(&T) -> bool,
{
    let first = match items.iter().position(|item| !is_zero(item)) {
        Some(idx) => idx,
        None => return Vec::new(),
    };
    let last = items
        .iter()
        .rposition(|item| !is_zero(item))
        .unwrap_or(first);
    items
        .into_iter()
        .skip(first)
        .take(last - first + 1)
        .collect()
}

// ==========================================
// CumulativeSeriesBuilder - 累计序列构建器
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct CumulativeSeriesBuilder {
    filler: GapFiller,
}

impl CumulativeSeriesBuilder {
    pub fn new() -> Self {
        Self {
            filler: GapFiller::new(),
        }
    }

    /// 补齐后的逐期累计成本 / 产量（期间升序，累计值单调不减）
    fn running_totals(
        &self,
        machine_id: i64,
        costs: &[CostRecord],
        productivity: &[WorkTimeProductivityRecord],
        range: &DateRange,
        breakdown: BreakdownType,
    ) -> Vec<RunningEntry> {
        let mut series: PeriodSeries<PeriodTotals> = PeriodSeries::new();
        for cost in costs
            .iter()
            .filter(|c| c.machine_id == machine_id && !c.is_model)
        {
            series
                .entry(PeriodKey::from_date(cost.date_period, breakdown))
                .or_default()
                .cost += num(cost.value);
        }
        for record in productivity
            .iter()
            .filter(|r| r.machine_id == machine_id && !r.is_model)
        {
            series
                .entry(PeriodKey::from_date(record.date_period, breakdown))
                .or_default()
                .productivity += num(record.productivity);
        }
        self.filler.fill(&mut series, range, breakdown);

        let mut accumulated_cost = 0.0;
        let mut accumulated_productivity = 0.0;
        series
            .into_iter()
            .map(|(period, totals)| {
                accumulated_cost += totals.cost;
                accumulated_productivity += totals.productivity;
                RunningEntry {
                    period,
                    productivity: totals.productivity,
                    accumulated_cost,
                    accumulated_productivity,
                    ratio: safe_ratio(accumulated_cost, accumulated_productivity),
                }
            })
            .collect()
    }

    /// 构建单台设备的累计单位成本序列
    ///
    /// # 参数
    /// - `machine`: 设备（价格、投运日期）
    /// - `costs` / `productivity`: 事实记录，可包含其他设备与目标数据，内部过滤
    /// - `range` / `breakdown`: 补齐范围与粒度
    ///
    /// # 返回
    /// - 期间升序、首尾零值已裁剪的序列
    #[instrument(level = "debug", skip(self, machine, costs, productivity), fields(machine_id = machine.id))]
    pub fn build(
        &self,
        machine: &Machine,
        costs: &[CostRecord],
        productivity: &[WorkTimeProductivityRecord],
        range: &DateRange,
        breakdown: BreakdownType,
    ) -> Vec<CumulativePoint> {
        let mut entries = self.running_totals(machine.id, costs, productivity, range, breakdown);
        if let Some(last) = entries.last() {
            tracing::debug!(
                periods = entries.len(),
                accumulated_cost = last.accumulated_cost,
                accumulated_productivity = last.accumulated_productivity,
                "累计完成"
            );
        }

        // 投运期间注入购置成本
        if let Some(year) = machine.commissioning_year() {
            let total_productivity = entries
                .iter()
                .rev()
                .find(|e| e.ratio > 0.0)
                .map(|e| e.accumulated_productivity)
                .unwrap_or(0.0);
            let specific = safe_ratio(machine.price_or_zero(), total_productivity);
            let anchor = PeriodKey::first_of_year(year, breakdown);

            match entries.binary_search_by(|e| e.period.cmp(&anchor)) {
                Ok(idx) => entries[idx].ratio += specific,
                Err(idx) => entries.insert(
                    idx,
                    RunningEntry {
                        period: anchor,
                        productivity: 0.0,
                        accumulated_cost: 0.0,
                        accumulated_productivity: 0.0,
                        ratio: specific,
                    },
                ),
            }
        }

        trim_zero_edges(entries, |e| e.ratio == 0.0)
            .into_iter()
            .map(|e| CumulativePoint {
                combined_date: e.period.label(),
                productivity: e.productivity,
                cost_to_productivity_ratio: e.ratio,
            })
            .collect()
    }
}
