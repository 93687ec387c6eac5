// ==========================================
// 矿山设备车队决策支持系统 - 拥有成本结构
// ==========================================
// 职责: 单台设备的单位拥有成本（按成本类别归类）
// 约束: 类别取 costs_kind.category 标签，未标记的成本类别不计入任何分项
// ==========================================

use crate::domain::facts::{num, CostRecord, WorkTimeProductivityRecord};
use crate::domain::machine::Machine;
use crate::domain::types::CostCategory;
use crate::engine::ratio::safe_ratio;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::instrument;

pub const SPECIFIC_COST_LABEL: &str =
    "Удельная стоимость (стоимость приобретения/к общему объему отгруженного за период) руб/м3";
pub const MAINTENANCE_REPAIR_LABEL: &str =
    "Удельные затраты на ТО, ТР, Запасные части и услуги по ТОР, руб/м3";
pub const OTHER_LABEL: &str = "Удельные затраты на Прочее, руб/м3";
pub const LABOR_TAXES_LABEL: &str = "Удельные затраты на ФОТ и налоги, руб/м3";
pub const FUEL_LABEL: &str = "Удельные затраты на эксплуатацию, руб/м3";
pub const TOTAL_OWNERSHIP_LABEL: &str = "ИТОГО удельные затраты на владение";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipItem {
    #[serde(rename = "type")]
    pub category: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineOwnership {
    pub machine_id: i64,
    pub mark_name: String,
    pub data: Vec<OwnershipItem>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OwnershipCalculator;

impl OwnershipCalculator {
    pub fn new() -> Self {
        Self
    }

    /// 每台设备一项，六个分项顺序固定
    #[instrument(level = "debug", skip_all, fields(machines = machines.len(), costs = costs.len()))]
    pub fn structure(
        &self,
        machines: &[Machine],
        costs: &[CostRecord],
        productivity: &[WorkTimeProductivityRecord],
    ) -> Vec<MachineOwnership> {
        let mut machine_productivity: HashMap<i64, f64> = HashMap::new();
        for record in productivity.iter().filter(|r| !r.is_model) {
            *machine_productivity.entry(record.machine_id).or_insert(0.0) +=
                num(record.productivity);
        }

        let mut category_costs: HashMap<(i64, CostCategory), f64> = HashMap::new();
        for cost in costs.iter().filter(|c| !c.is_model) {
            if let Some(category) = cost.kind.category {
                *category_costs
                    .entry((cost.machine_id, category))
                    .or_insert(0.0) += num(cost.value);
            }
        }

        machines
            .iter()
            .map(|machine| {
                let total_productivity = machine_productivity
                    .get(&machine.id)
                    .copied()
                    .unwrap_or(0.0);
                let unit = |category: CostCategory| {
                    let cost = category_costs
                        .get(&(machine.id, category))
                        .copied()
                        .unwrap_or(0.0);
                    safe_ratio(cost, total_productivity)
                };

                let specific = safe_ratio(machine.price_or_zero(), total_productivity);
                let maintenance = unit(CostCategory::MaintenanceRepair);
                let other = unit(CostCategory::Other);
                let labor = unit(CostCategory::LaborTaxes);
                let fuel = unit(CostCategory::Fuel);
                let total = specific + maintenance + other + labor + fuel;

                let item = |label: &str, value: f64| OwnershipItem {
                    category: label.to_string(),
                    value,
                };
                MachineOwnership {
                    machine_id: machine.id,
                    mark_name: machine.label(),
                    data: vec![
                        item(SPECIFIC_COST_LABEL, specific),
                        item(MAINTENANCE_REPAIR_LABEL, maintenance),
                        item(OTHER_LABEL, other),
                        item(LABOR_TAXES_LABEL, labor),
                        item(FUEL_LABEL, fuel),
                        item(TOTAL_OWNERSHIP_LABEL, total),
                    ],
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::facts::CostKind;
    use chrono::NaiveDate;

    fn d() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 3, 1).unwrap()
    }

    fn machine(id: i64, price: Option<f64>) -> Machine {
        Machine {
            id,
            organization_id: 1,
            inventory_number: format!("{:03}", id),
            price,
            date_entry: None,
            year_decommission: None,
            machine_type_id: 1,
            machine_type_name: "T".to_string(),
            mark_id: 1,
            mark_name: "M".to_string(),
            machine_class_id: 4,
            machine_class_name: "C".to_string(),
            machine_class_parent_id: None,
            current_zone: None,
        }
    }

    fn cost(machine_id: i64, kind_id: i64, category: Option<CostCategory>, value: f64) -> CostRecord {
        CostRecord {
            id: 0,
            machine_id,
            kind: CostKind {
                id: kind_id,
                name: format!("kind-{}", kind_id),
                is_model: false,
                category,
            },
            date_period: d(),
            value: Some(value),
            is_model: false,
        }
    }

    fn prod(machine_id: i64, value: f64) -> WorkTimeProductivityRecord {
        WorkTimeProductivityRecord {
            id: 0,
            machine_id,
            strategy_id: None,
            date_period: d(),
            work_time: None,
            productivity: Some(value),
            is_model: false,
        }
    }

    #[test]
    fn test_categories_and_total() {
        let machines = vec![machine(1, Some(1000.0))];
        let costs = vec![
            cost(1, 1, Some(CostCategory::MaintenanceRepair), 100.0),
            cost(1, 2, Some(CostCategory::MaintenanceRepair), 50.0),
            cost(1, 3, Some(CostCategory::Fuel), 30.0),
            cost(1, 4, None, 999.0),
        ];
        let result = OwnershipCalculator::new().structure(&machines, &costs, &[prod(1, 10.0)]);

        assert_eq!(result.len(), 1);
        let data = &result[0].data;
        assert_eq!(data.len(), 6);
        assert_eq!(data[0].category, SPECIFIC_COST_LABEL);
        assert_eq!(data[0].value, 100.0);
        assert_eq!(data[1].value, 15.0);
        assert_eq!(data[2].value, 0.0);
        assert_eq!(data[4].value, 3.0);
        assert_eq!(data[5].category, TOTAL_OWNERSHIP_LABEL);
        assert_eq!(data[5].value, 118.0);
        assert_eq!(result[0].mark_name, "M-T-001");
    }

    #[test]
    fn test_no_productivity_gives_zero_everywhere() {
        let machines = vec![machine(2, Some(1000.0))];
        let costs = vec![cost(2, 1, Some(CostCategory::Other), 10.0)];
        let result = OwnershipCalculator::new().structure(&machines, &costs, &[]);
        assert!(result[0].data.iter().all(|item| item.value == 0.0));

        let json = serde_json::to_value(&result[0]).unwrap();
        assert_eq!(json["data"][2]["type"], OTHER_LABEL);
    }
}
