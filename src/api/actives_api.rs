// ==========================================
// 矿山设备车队决策支持系统 - 车队结构 API
// ==========================================
// 职责: 投运数量、作业区分布、主/辅设备累计数量与机龄
// 输入: 仅设备列表与分类树，不拉取事实数据
// ==========================================

use std::sync::Arc;

use tracing::Instrument;

use crate::api::dto::{AnalyticsQuery, AnalyticsRequest};
use crate::api::error::ApiResult;
use crate::api::support::{request_span, resolve_machines, upstream_failure};
use crate::config::{AnalyticsSettings, ConfigManager};
use crate::domain::machine::MachineClassTree;
use crate::engine::fleet_structure::{
    AverageMachineAge, CumulativeMachineCount, FleetStructureCalculator, MachineCountAndAge,
    WorkDistribution, YearCount,
};
use crate::repository::machine_repo::MachineFilter;

pub struct ActivesApi {
    machine_filter: Arc<dyn MachineFilter>,
    config: Arc<ConfigManager>,
}

impl ActivesApi {
    pub fn new(machine_filter: Arc<dyn MachineFilter>, config: Arc<ConfigManager>) -> Self {
        Self {
            machine_filter,
            config,
        }
    }

    async fn prepare(
        &self,
        request: &AnalyticsRequest,
    ) -> ApiResult<(FleetStructureCalculator, AnalyticsQuery)> {
        let settings: AnalyticsSettings = self
            .config
            .load_settings()
            .await
            .map_err(|e| upstream_failure("config", e))?;
        let query = request.to_query(settings.default_breakdown)?;
        let calculator = FleetStructureCalculator::new(
            settings.main_class_id,
            settings.auxiliary_class_id,
            settings.zone_labels,
        );
        Ok((calculator, query))
    }

    async fn class_tree(&self) -> ApiResult<MachineClassTree> {
        self.machine_filter
            .class_tree()
            .await
            .map_err(|e| upstream_failure("class_tree", e))
    }

    /// 范围内每年投运数量
    pub async fn machine_count_by_year(
        &self,
        request: &AnalyticsRequest,
    ) -> ApiResult<Vec<YearCount>> {
        let (calculator, query) = self.prepare(request).await?;
        let span = request_span("machine_count_by_year", &query);
        async {
            let machines = resolve_machines(self.machine_filter.as_ref(), &query).await?;
            Ok(calculator.count_by_year(&machines, &query.range))
        }
        .instrument(span)
        .await
    }

    /// 按作业区的设备分布
    pub async fn work_distribution(
        &self,
        request: &AnalyticsRequest,
    ) -> ApiResult<Vec<WorkDistribution>> {
        let (calculator, query) = self.prepare(request).await?;
        let span = request_span("work_distribution", &query);
        async {
            let machines = resolve_machines(self.machine_filter.as_ref(), &query).await?;
            Ok(calculator.work_distribution(&machines))
        }
        .instrument(span)
        .await
    }

    /// 主/辅设备累计数量
    pub async fn cumulative_machine_count(
        &self,
        request: &AnalyticsRequest,
    ) -> ApiResult<Vec<CumulativeMachineCount>> {
        let (calculator, query) = self.prepare(request).await?;
        let span = request_span("cumulative_machine_count", &query);
        async {
            let machines = resolve_machines(self.machine_filter.as_ref(), &query).await?;
            let tree = self.class_tree().await?;
            Ok(calculator.cumulative_count(&tree, &machines, &query.range))
        }
        .instrument(span)
        .await
    }

    /// 每年主/辅设备平均机龄
    pub async fn average_machine_age(
        &self,
        request: &AnalyticsRequest,
    ) -> ApiResult<Vec<AverageMachineAge>> {
        let (calculator, query) = self.prepare(request).await?;
        let span = request_span("average_machine_age", &query);
        async {
            let machines = resolve_machines(self.machine_filter.as_ref(), &query).await?;
            let tree = self.class_tree().await?;
            Ok(calculator.average_age(&tree, &machines, &query.range))
        }
        .instrument(span)
        .await
    }

    /// 范围最后一年的数量与平均机龄
    pub async fn machine_count_and_average_age(
        &self,
        request: &AnalyticsRequest,
    ) -> ApiResult<MachineCountAndAge> {
        let (calculator, query) = self.prepare(request).await?;
        let span = request_span("machine_count_and_average_age", &query);
        async {
            let machines = resolve_machines(self.machine_filter.as_ref(), &query).await?;
            let tree = self.class_tree().await?;
            Ok(calculator.count_and_average_age(&tree, &machines, &query.range))
        }
        .instrument(span)
        .await
    }
}
