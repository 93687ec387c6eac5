// ==========================================
// 矿山设备车队决策支持系统 - 车队结构统计
// ==========================================
// 职责: 按投运年份计数、作业区分布、主/辅设备累计数量与平均机龄
// 输入: 已解析的设备列表 + 设备分类树（无事实数据）
// 约束: 主/辅归属 = 设备分类位于配置分类的子树内
// ==========================================

use crate::domain::machine::{Machine, MachineClassTree};
use crate::domain::period::DateRange;
use crate::domain::types::{WorkZone, ZoneLabels};
use crate::engine::gap_filler::GapFiller;
use crate::engine::ratio::safe_ratio;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::instrument;

pub const EXTRACTION_WORK_LABEL: &str = "Добычные работы";
pub const STRIPPING_WORK_LABEL: &str = "Вскрышные работы";
pub const ADDITIONAL_WORK_LABEL: &str = "Дополнительные работы";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearCount {
    pub year: i32,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkDistribution {
    pub work_type: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CumulativeMachineCount {
    pub year: i32,
    pub main: u32,
    pub auxiliary: u32,
    pub sum: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AverageMachineAge {
    pub year: i32,
    pub main: f64,
    pub auxiliary: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineCountAndAge {
    pub main_count: u32,
    pub auxiliary_count: u32,
    pub main_avg_age: f64,
    pub auxiliary_avg_age: f64,
}

/// 设备大类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FleetCategory {
    Main,
    Auxiliary,
}

#[derive(Debug, Default, Clone, Copy)]
struct AgeTotals {
    total_age: f64,
    count: u32,
}

impl AgeTotals {
    fn push(&mut self, age: f64) {
        self.total_age += age;
        self.count += 1;
    }

    fn average(&self) -> f64 {
        safe_ratio(self.total_age, f64::from(self.count))
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct CategoryAges {
    main: AgeTotals,
    auxiliary: AgeTotals,
}

impl CategoryAges {
    fn slot(&mut self, category: FleetCategory) -> &mut AgeTotals {
        match category {
            FleetCategory::Main => &mut self.main,
            FleetCategory::Auxiliary => &mut self.auxiliary,
        }
    }
}

// ==========================================
// FleetStructureCalculator - 车队结构统计
// ==========================================
#[derive(Debug, Clone)]
pub struct FleetStructureCalculator {
    main_class_id: i64,
    auxiliary_class_id: i64,
    zone_labels: ZoneLabels,
    filler: GapFiller,
}

impl FleetStructureCalculator {
    pub fn new(main_class_id: i64, auxiliary_class_id: i64, zone_labels: ZoneLabels) -> Self {
        Self {
            main_class_id,
            auxiliary_class_id,
            zone_labels,
            filler: GapFiller::new(),
        }
    }

    /// 设备所属大类，两者都不是返回 None
    pub fn category(&self, tree: &MachineClassTree, machine: &Machine) -> Option<FleetCategory> {
        if tree.is_within(machine.machine_class_id, self.main_class_id) {
            Some(FleetCategory::Main)
        } else if tree.is_within(machine.machine_class_id, self.auxiliary_class_id) {
            Some(FleetCategory::Auxiliary)
        } else {
            None
        }
    }

    /// 范围内每年投运数量
    #[instrument(level = "debug", skip(self, machines), fields(machines = machines.len()))]
    pub fn count_by_year(&self, machines: &[Machine], range: &DateRange) -> Vec<YearCount> {
        let mut counts: BTreeMap<i32, u32> = BTreeMap::new();
        self.filler.fill_years(&mut counts, range);
        for year in machines.iter().filter_map(Machine::commissioning_year) {
            if let Some(count) = counts.get_mut(&year) {
                *count += 1;
            }
        }
        counts
            .into_iter()
            .map(|(year, count)| YearCount { year, count })
            .collect()
    }

    /// 按当前工作面作业区计数（三项固定顺序）
    #[instrument(level = "debug", skip(self, machines), fields(machines = machines.len()))]
    pub fn work_distribution(&self, machines: &[Machine]) -> Vec<WorkDistribution> {
        let (mut extraction, mut stripping, mut additional) = (0u32, 0u32, 0u32);
        for machine in machines {
            match self.zone_labels.classify(machine.current_zone.as_deref()) {
                WorkZone::Extraction => extraction += 1,
                WorkZone::Stripping => stripping += 1,
                WorkZone::Additional => additional += 1,
            }
        }
        vec![
            WorkDistribution {
                work_type: EXTRACTION_WORK_LABEL.to_string(),
                count: extraction,
            },
            WorkDistribution {
                work_type: STRIPPING_WORK_LABEL.to_string(),
                count: stripping,
            },
            WorkDistribution {
                work_type: ADDITIONAL_WORK_LABEL.to_string(),
                count: additional,
            },
        ]
    }

    /// 主/辅设备累计数量（仅统计范围内投运的设备）
    #[instrument(level = "debug", skip(self, tree, machines), fields(machines = machines.len()))]
    pub fn cumulative_count(
        &self,
        tree: &MachineClassTree,
        machines: &[Machine],
        range: &DateRange,
    ) -> Vec<CumulativeMachineCount> {
        let mut per_year: BTreeMap<i32, (u32, u32)> = BTreeMap::new();
        self.filler.fill_years(&mut per_year, range);
        for machine in machines {
            let (Some(year), Some(category)) =
                (machine.commissioning_year(), self.category(tree, machine))
            else {
                continue;
            };
            if let Some(slot) = per_year.get_mut(&year) {
                match category {
                    FleetCategory::Main => slot.0 += 1,
                    FleetCategory::Auxiliary => slot.1 += 1,
                }
            }
        }

        let (mut main, mut auxiliary) = (0u32, 0u32);
        per_year
            .into_iter()
            .map(|(year, (m, a))| {
                main += m;
                auxiliary += a;
                CumulativeMachineCount {
                    year,
                    main,
                    auxiliary,
                    sum: main + auxiliary,
                }
            })
            .collect()
    }

    /// 每年主/辅设备平均机龄（含投运当年的月份折算）
    #[instrument(level = "debug", skip(self, tree, machines), fields(machines = machines.len()))]
    pub fn average_age(
        &self,
        tree: &MachineClassTree,
        machines: &[Machine],
        range: &DateRange,
    ) -> Vec<AverageMachineAge> {
        let ages = self.ages_by_year(tree, machines, range, |machine, year| {
            machine.date_entry.map(|entry| {
                f64::from(12 - entry.month0()) / 12.0 + f64::from(year - entry.year())
            })
        });
        ages.into_iter()
            .map(|(year, totals)| AverageMachineAge {
                year,
                main: totals.main.average(),
                auxiliary: totals.auxiliary.average(),
            })
            .collect()
    }

    /// 范围最后一年的主/辅设备数量与平均整年机龄
    #[instrument(level = "debug", skip(self, tree, machines), fields(machines = machines.len()))]
    pub fn count_and_average_age(
        &self,
        tree: &MachineClassTree,
        machines: &[Machine],
        range: &DateRange,
    ) -> MachineCountAndAge {
        let last_year = DateRange::new(range.end, range.end);
        let ages = self.ages_by_year(tree, machines, &last_year, |machine, year| {
            machine
                .commissioning_year()
                .map(|entry_year| f64::from(year - entry_year))
        });
        let totals = ages.into_values().next().unwrap_or_default();
        MachineCountAndAge {
            main_count: totals.main.count,
            auxiliary_count: totals.auxiliary.count,
            main_avg_age: totals.main.average(),
            auxiliary_avg_age: totals.auxiliary.average(),
        }
    }

    /// 范围内每年在役设备的机龄汇总
    ///
    /// 在役: 投运年份 <= 当年，且未在当年之前报废
    fn ages_by_year<F>(
        &self,
        tree: &MachineClassTree,
        machines: &[Machine],
        range: &DateRange,
        age_of: F,
    ) -> BTreeMap<i32, CategoryAges>
    where
        F: Fn(&Machine, i32) -> Option<f64>,
    {
        let mut by_year: BTreeMap<i32, CategoryAges> = BTreeMap::new();
        self.filler.fill_years(&mut by_year, range);

        for machine in machines {
            let (Some(entry_year), Some(category)) =
                (machine.commissioning_year(), self.category(tree, machine))
            else {
                continue;
            };
            for (year, totals) in by_year.iter_mut() {
                let in_service = entry_year <= *year
                    && machine.year_decommission.map_or(true, |y| y >= *year);
                if !in_service {
                    continue;
                }
                if let Some(age) = age_of(machine, *year) {
                    totals.slot(category).push(age);
                }
            }
        }
        by_year
    }
}
