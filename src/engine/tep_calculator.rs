// ==========================================
// 矿山设备车队决策支持系统 - 技术经济指标计算引擎
// ==========================================
// 职责: 采剥量、车队产量、单位成本动态、实际/目标成本对比
// 输入: 已解析的设备列表 + 事实记录
// 红线: Engine 不拼 SQL；所有比值经 safe_ratio
// ==========================================

use crate::domain::facts::{num, CostRecord, WorkTimeProductivityRecord};
use crate::domain::machine::Machine;
use crate::domain::period::{DateRange, PeriodKey};
use crate::domain::types::{BreakdownType, WorkZone, ZoneLabels};
use crate::engine::fact_aggregator::FactAggregator;
use crate::engine::gap_filler::{GapFiller, PeriodSeries};
use crate::engine::ratio::safe_ratio;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::instrument;

/// 成本对比: 实际
pub const COMPARISON_FACT_LABEL: &str = "Факт";
/// 成本对比: 目标
pub const COMPARISON_MODEL_LABEL: &str = "Цель";
/// 单位成本汇总序列名称
pub const TOTAL_SERIES_NAME: &str = "Total";

// ==========================================
// 输出结构
// ==========================================

/// 采剥量期间点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumePoint {
    #[serde(flatten)]
    pub period: PeriodKey,
    pub extraction: f64,
    pub overburden: f64,
    pub combined_date: String,
    pub coefficient: f64, // 剥采比 = overburden / extraction
}

/// 产量期间点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductivityPoint {
    #[serde(flatten)]
    pub period: PeriodKey,
    pub combined_date: String,
    pub productivity: f64,
}

/// 产量分组（按设备或按分类）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductivityGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mark_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_class_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_class_name: Option<String>,
    pub data: Vec<ProductivityPoint>,
}

/// 单位成本期间点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitCostPoint {
    #[serde(flatten)]
    pub period: PeriodKey,
    pub combined_date: String,
    pub total_cost: f64,
    pub total_productivity: f64,
    pub cost_to_productivity_ratio: f64,
}

/// 单位成本序列（按成本类别；kind_id 为 None 表示汇总）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitCostSeries {
    pub kind_id: Option<i64>,
    pub kind_name: String,
    pub data: Vec<UnitCostPoint>,
}

/// 成本类别合计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KindCostTotal {
    pub kind_id: i64,
    pub kind_name: String,
    pub total_cost: f64,
}

/// 实际/目标成本对比
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostComparison {
    #[serde(rename = "type")]
    pub comparison_type: String,
    pub costs: Vec<KindCostTotal>,
}

#[derive(Debug, Default, Clone, Copy)]
struct ZoneVolume {
    extraction: f64,
    overburden: f64,
}

#[derive(Debug, Default, Clone, Copy)]
struct KindPeriodCost {
    total_cost: f64,
}

// ==========================================
// TepCalculator - 技术经济指标计算引擎
// ==========================================
pub struct TepCalculator {
    zone_labels: ZoneLabels,
    aggregator: FactAggregator,
    filler: GapFiller,
}

impl TepCalculator {
    pub fn new(zone_labels: ZoneLabels) -> Self {
        Self {
            zone_labels,
            aggregator: FactAggregator::new(),
            filler: GapFiller::new(),
        }
    }

    /// 采剥量
    ///
    /// 仅统计实际产量；作业区取设备当前工作面，辅助作业设备不计入
    #[instrument(level = "debug", skip(self, machines, productivity), fields(machines = machines.len(), records = productivity.len()))]
    pub fn volumes(
        &self,
        machines: &[Machine],
        productivity: &[WorkTimeProductivityRecord],
        range: &DateRange,
        breakdown: BreakdownType,
    ) -> Vec<VolumePoint> {
        let zones: HashMap<i64, WorkZone> = machines
            .iter()
            .map(|m| (m.id, self.zone_labels.classify(m.current_zone.as_deref())))
            .collect();

        let mut series: PeriodSeries<ZoneVolume> = PeriodSeries::new();
        for record in productivity.iter().filter(|r| !r.is_model) {
            let zone = zones
                .get(&record.machine_id)
                .copied()
                .unwrap_or(WorkZone::Additional);
            if zone == WorkZone::Additional {
                continue;
            }
            let slot = series
                .entry(PeriodKey::from_date(record.date_period, breakdown))
                .or_default();
            match zone {
                WorkZone::Extraction => slot.extraction += num(record.productivity),
                WorkZone::Stripping => slot.overburden += num(record.productivity),
                WorkZone::Additional => {}
            }
        }
        self.filler.fill(&mut series, range, breakdown);

        series
            .into_iter()
            .map(|(period, v)| VolumePoint {
                period,
                extraction: v.extraction,
                overburden: v.overburden,
                combined_date: period.label(),
                coefficient: safe_ratio(v.overburden, v.extraction),
            })
            .collect()
    }

    /// 车队产量
    ///
    /// # 参数
    /// - `group_by_class`: true 按设备分类分组，false 按设备分组
    ///
    /// # 返回
    /// - 分组按 ID 升序，组内期间升序且补齐
    #[instrument(level = "debug", skip(self, machines, productivity), fields(machines = machines.len(), records = productivity.len()))]
    pub fn park_productivity(
        &self,
        machines: &[Machine],
        productivity: &[WorkTimeProductivityRecord],
        range: &DateRange,
        breakdown: BreakdownType,
        group_by_class: bool,
    ) -> Vec<ProductivityGroup> {
        let by_id: HashMap<i64, &Machine> = machines.iter().map(|m| (m.id, m)).collect();
        let group_of = |machine: &Machine| {
            if group_by_class {
                machine.machine_class_id
            } else {
                machine.id
            }
        };

        let mut grouped = self.aggregator.fold(
            productivity,
            breakdown,
            |r: &WorkTimeProductivityRecord| {
                if r.is_model {
                    return None;
                }
                by_id
                    .get(&r.machine_id)
                    .map(|m| (group_of(*m), r.date_period))
            },
            |acc: &mut f64, r| *acc += num(r.productivity),
        );
        // 无记录的设备/分类也输出补零序列
        for machine in machines {
            grouped.group_mut(group_of(machine));
        }
        grouped.fill_gaps(range, breakdown);

        let mut groups = grouped.into_groups();
        groups.sort_by_key(|(id, _)| *id);

        groups
            .into_iter()
            .filter_map(|(id, series)| {
                let data = series
                    .into_iter()
                    .map(|(period, productivity)| ProductivityPoint {
                        period,
                        combined_date: period.label(),
                        productivity,
                    })
                    .collect();
                if group_by_class {
                    let sample = machines.iter().find(|m| m.machine_class_id == id)?;
                    Some(ProductivityGroup {
                        machine_id: None,
                        mark_name: None,
                        machine_class_id: Some(id),
                        machine_class_name: Some(sample.machine_class_name.clone()),
                        data,
                    })
                } else {
                    let machine = by_id.get(&id)?;
                    Some(ProductivityGroup {
                        machine_id: Some(id),
                        mark_name: Some(machine.label()),
                        machine_class_id: None,
                        machine_class_name: None,
                        data,
                    })
                }
            })
            .collect()
    }

    /// 单位成本动态
    ///
    /// 每个成本类别一条序列（首次出现顺序），期间产量取整个设备集合的实际产量；
    /// 末尾追加 "Total" 汇总序列（成本求和、比值求和）
    #[instrument(level = "debug", skip(self, costs, productivity), fields(costs = costs.len(), records = productivity.len()))]
    pub fn unit_costs(
        &self,
        costs: &[CostRecord],
        productivity: &[WorkTimeProductivityRecord],
        range: &DateRange,
        breakdown: BreakdownType,
    ) -> Vec<UnitCostSeries> {
        let period_productivity = self.aggregator.sum_by_period(productivity, breakdown, |r| {
            (!r.is_model).then(|| (r.date_period, num(r.productivity)))
        });
        let productivity_of =
            |period: &PeriodKey| period_productivity.get(period).copied().unwrap_or(0.0);

        let mut kind_names: HashMap<i64, String> = HashMap::new();
        let mut grouped = self.aggregator.fold(
            costs,
            breakdown,
            |c: &CostRecord| (!c.is_model).then(|| (c.kind.id, c.date_period)),
            |acc: &mut KindPeriodCost, c| acc.total_cost += num(c.value),
        );
        for cost in costs.iter().filter(|c| !c.is_model) {
            kind_names
                .entry(cost.kind.id)
                .or_insert_with(|| cost.kind.name.clone());
        }
        grouped.fill_gaps(range, breakdown);

        // 无成本种类时 Total 数据为空
        let mut total: PeriodSeries<(f64, f64)> = PeriodSeries::new();
        if !grouped.is_empty() {
            self.filler.fill(&mut total, range, breakdown);
        }

        let mut result = Vec::with_capacity(grouped.len() + 1);
        for (kind_id, series) in grouped.into_groups() {
            let data: Vec<UnitCostPoint> = series
                .into_iter()
                .map(|(period, cost)| {
                    let total_productivity = productivity_of(&period);
                    let ratio = safe_ratio(cost.total_cost, total_productivity);
                    let sum = total.entry(period).or_default();
                    sum.0 += cost.total_cost;
                    sum.1 += ratio;
                    UnitCostPoint {
                        period,
                        combined_date: period.label(),
                        total_cost: cost.total_cost,
                        total_productivity,
                        cost_to_productivity_ratio: ratio,
                    }
                })
                .collect();
            result.push(UnitCostSeries {
                kind_id: Some(kind_id),
                kind_name: kind_names.get(&kind_id).cloned().unwrap_or_default(),
                data,
            });
        }

        result.push(UnitCostSeries {
            kind_id: None,
            kind_name: TOTAL_SERIES_NAME.to_string(),
            data: total
                .into_iter()
                .map(|(period, (cost, ratio))| UnitCostPoint {
                    period,
                    combined_date: period.label(),
                    total_cost: cost,
                    total_productivity: productivity_of(&period),
                    cost_to_productivity_ratio: ratio,
                })
                .collect(),
        });
        result
    }

    /// 实际/目标成本对比（两项固定输出，先实际后目标）
    #[instrument(level = "debug", skip(self, costs), fields(costs = costs.len()))]
    pub fn cost_comparison(&self, costs: &[CostRecord]) -> Vec<CostComparison> {
        let totals = |is_model: bool| -> Vec<KindCostTotal> {
            let mut index: HashMap<i64, usize> = HashMap::new();
            let mut out: Vec<KindCostTotal> = Vec::new();
            for cost in costs.iter().filter(|c| c.is_model == is_model) {
                let idx = *index.entry(cost.kind.id).or_insert_with(|| {
                    out.push(KindCostTotal {
                        kind_id: cost.kind.id,
                        kind_name: cost.kind.name.clone(),
                        total_cost: 0.0,
                    });
                    out.len() - 1
                });
                out[idx].total_cost += num(cost.value);
            }
            out
        };

        vec![
            CostComparison {
                comparison_type: COMPARISON_FACT_LABEL.to_string(),
                costs: totals(false),
            },
            CostComparison {
                comparison_type: COMPARISON_MODEL_LABEL.to_string(),
                costs: totals(true),
            },
        ]
    }
}
