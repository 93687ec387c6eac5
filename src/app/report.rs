// ==========================================
// 矿山设备车队决策支持系统 - 报表分发
// ==========================================
// 职责: 报表名称 → 对应 API 调用 → JSON
// ==========================================

use serde::Serialize;

use crate::api::{AnalyticsRequest, ApiError, ApiResult};
use crate::app::state::AppState;

/// 可用报表
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    // TEP
    Volumes,
    ParkProductivity,
    UnitCosts,
    CostComparison,
    OwnershipStructure,
    AccumulatedCosts,
    AccumulatedCostsVsIndustry,
    // CTF
    CtfStructure,
    CtfYearly,
    CtfWorktimeByServiceLife,
    // 车队结构
    MachineCountByYear,
    WorkDistribution,
    CumulativeMachineCount,
    AverageMachineAge,
    MachineCountAndAverageAge,
}

impl Report {
    pub const ALL: [Report; 15] = [
        Report::Volumes,
        Report::ParkProductivity,
        Report::UnitCosts,
        Report::CostComparison,
        Report::OwnershipStructure,
        Report::AccumulatedCosts,
        Report::AccumulatedCostsVsIndustry,
        Report::CtfStructure,
        Report::CtfYearly,
        Report::CtfWorktimeByServiceLife,
        Report::MachineCountByYear,
        Report::WorkDistribution,
        Report::CumulativeMachineCount,
        Report::AverageMachineAge,
        Report::MachineCountAndAverageAge,
    ];

    /// 命令行使用的报表名
    pub fn name(&self) -> &'static str {
        match self {
            Report::Volumes => "volumes",
            Report::ParkProductivity => "park-productivity",
            Report::UnitCosts => "unit-costs",
            Report::CostComparison => "cost-comparison",
            Report::OwnershipStructure => "ownership-structure",
            Report::AccumulatedCosts => "accumulated-costs",
            Report::AccumulatedCostsVsIndustry => "accumulated-costs-vs-industry",
            Report::CtfStructure => "ctf-structure",
            Report::CtfYearly => "ctf-yearly",
            Report::CtfWorktimeByServiceLife => "ctf-worktime-by-service-life",
            Report::MachineCountByYear => "machine-count-by-year",
            Report::WorkDistribution => "work-distribution",
            Report::CumulativeMachineCount => "cumulative-machine-count",
            Report::AverageMachineAge => "average-machine-age",
            Report::MachineCountAndAverageAge => "machine-count-and-average-age",
        }
    }

    /// 按名称查找（接受 - 或 _ 分隔）
    pub fn from_name(name: &str) -> Option<Report> {
        let normalized = name.trim().to_lowercase().replace('_', "-");
        Report::ALL.into_iter().find(|r| r.name() == normalized)
    }
}

fn to_json<T: Serialize>(value: T) -> ApiResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| ApiError::InternalError(format!("序列化失败: {}", e)))
}

impl AppState {
    /// 执行报表并返回 JSON
    pub async fn run_report(
        &self,
        report: Report,
        request: &AnalyticsRequest,
    ) -> ApiResult<serde_json::Value> {
        match report {
            Report::Volumes => to_json(self.tep_api.volumes(request).await?),
            Report::ParkProductivity => to_json(self.tep_api.park_productivity(request).await?),
            Report::UnitCosts => to_json(self.tep_api.unit_costs(request).await?),
            Report::CostComparison => to_json(self.tep_api.cost_comparison(request).await?),
            Report::OwnershipStructure => {
                to_json(self.tep_api.ownership_structure(request).await?)
            }
            Report::AccumulatedCosts => to_json(self.tep_api.accumulated_costs(request).await?),
            Report::AccumulatedCostsVsIndustry => {
                to_json(self.tep_api.accumulated_costs_vs_industry(request).await?)
            }
            Report::CtfStructure => to_json(self.ctf_api.ctf_structure(request).await?),
            Report::CtfYearly => to_json(self.ctf_api.ctf_yearly(request).await?),
            Report::CtfWorktimeByServiceLife => {
                to_json(self.ctf_api.ctf_worktime_by_service_life(request).await?)
            }
            Report::MachineCountByYear => {
                to_json(self.actives_api.machine_count_by_year(request).await?)
            }
            Report::WorkDistribution => to_json(self.actives_api.work_distribution(request).await?),
            Report::CumulativeMachineCount => {
                to_json(self.actives_api.cumulative_machine_count(request).await?)
            }
            Report::AverageMachineAge => {
                to_json(self.actives_api.average_machine_age(request).await?)
            }
            Report::MachineCountAndAverageAge => {
                to_json(self.actives_api.machine_count_and_average_age(request).await?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_names_round_trip() {
        for report in Report::ALL {
            assert_eq!(Report::from_name(report.name()), Some(report));
        }
        assert_eq!(Report::from_name("CTF_YEARLY"), Some(Report::CtfYearly));
        assert_eq!(Report::from_name("unknown"), None);
    }
}
