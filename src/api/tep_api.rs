// ==========================================
// 矿山设备车队决策支持系统 - 技术经济指标 API
// ==========================================
// 职责: 解析请求 → 设备过滤（无数据拦截）→ 并发拉取事实 → 调用引擎
// 架构: API 层 → MachineFilter / FactRepository → Engine 层
// ==========================================

use std::collections::HashSet;
use std::sync::Arc;

use tracing::Instrument;

use crate::api::dto::{
    AnalyticsQuery, AnalyticsRequest, IndustryComparisonEntry, MachineCumulativeSeries,
    MarkSeries,
};
use crate::api::error::ApiResult;
use crate::api::support::{machine_ids, request_span, resolve_machines, upstream_failure};
use crate::config::{AnalyticsSettings, ConfigManager};
use crate::domain::facts::{CostRecord, WorkTimeProductivityRecord};
use crate::domain::machine::Machine;
use crate::engine::cumulative::CumulativeSeriesBuilder;
use crate::engine::mark_aligner::MarkAligner;
use crate::engine::ownership::{MachineOwnership, OwnershipCalculator};
use crate::engine::tep_calculator::{
    CostComparison, ProductivityGroup, TepCalculator, UnitCostSeries, VolumePoint,
};
use crate::repository::fact_repo::FactRepository;
use crate::repository::machine_repo::MachineFilter;

// ==========================================
// TepApi - 技术经济指标 API
// ==========================================
pub struct TepApi {
    machine_filter: Arc<dyn MachineFilter>,
    fact_repo: Arc<dyn FactRepository>,
    config: Arc<ConfigManager>,
}

impl TepApi {
    /// 创建新的TepApi实例
    pub fn new(
        machine_filter: Arc<dyn MachineFilter>,
        fact_repo: Arc<dyn FactRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            machine_filter,
            fact_repo,
            config,
        }
    }

    async fn prepare(
        &self,
        request: &AnalyticsRequest,
    ) -> ApiResult<(AnalyticsSettings, AnalyticsQuery)> {
        let settings = self
            .config
            .load_settings()
            .await
            .map_err(|e| upstream_failure("config", e))?;
        let query = request.to_query(settings.default_breakdown)?;
        Ok((settings, query))
    }

    /// 并发拉取成本与产量
    async fn fetch_costs_and_productivity(
        &self,
        machines: &[Machine],
        query: &AnalyticsQuery,
    ) -> ApiResult<(Vec<CostRecord>, Vec<WorkTimeProductivityRecord>)> {
        let ids = machine_ids(machines);
        let (costs, productivity) = futures::try_join!(
            self.fact_repo.find_costs(&ids, &query.range),
            self.fact_repo.find_productivity(&ids, &query.range),
        )
        .map_err(|e| upstream_failure("facts", e))?;
        tracing::debug!(
            costs = costs.len(),
            productivity = productivity.len(),
            "事实数据拉取完成"
        );
        Ok((costs, productivity))
    }

    async fn fetch_productivity(
        &self,
        machines: &[Machine],
        query: &AnalyticsQuery,
    ) -> ApiResult<Vec<WorkTimeProductivityRecord>> {
        self.fact_repo
            .find_productivity(&machine_ids(machines), &query.range)
            .await
            .map_err(|e| upstream_failure("productivity", e))
    }

    // ==========================================
    // 采剥量
    // ==========================================

    /// 采剥量及剥采比
    ///
    /// # 返回
    /// - Ok(Vec<VolumePoint>): 按期间升序、范围内补齐
    /// - Err(ApiError::NotFound): 过滤条件无匹配设备
    pub async fn volumes(&self, request: &AnalyticsRequest) -> ApiResult<Vec<VolumePoint>> {
        let (settings, query) = self.prepare(request).await?;
        let span = request_span("volumes", &query);
        async {
            let machines = resolve_machines(self.machine_filter.as_ref(), &query).await?;
            let productivity = self.fetch_productivity(&machines, &query).await?;
            Ok(TepCalculator::new(settings.zone_labels).volumes(
                &machines,
                &productivity,
                &query.range,
                query.breakdown,
            ))
        }
        .instrument(span)
        .await
    }

    // ==========================================
    // 车队产量
    // ==========================================

    /// 车队产量（按设备或按分类分组）
    pub async fn park_productivity(
        &self,
        request: &AnalyticsRequest,
    ) -> ApiResult<Vec<ProductivityGroup>> {
        let (settings, query) = self.prepare(request).await?;
        let span = request_span("park_productivity", &query);
        async {
            let machines = resolve_machines(self.machine_filter.as_ref(), &query).await?;
            let productivity = self.fetch_productivity(&machines, &query).await?;
            Ok(TepCalculator::new(settings.zone_labels).park_productivity(
                &machines,
                &productivity,
                &query.range,
                query.breakdown,
                query.selection.groups_by_class(),
            ))
        }
        .instrument(span)
        .await
    }

    // ==========================================
    // 单位成本
    // ==========================================

    /// 单位成本动态（含 Total 汇总序列）
    pub async fn unit_costs(&self, request: &AnalyticsRequest) -> ApiResult<Vec<UnitCostSeries>> {
        let (settings, query) = self.prepare(request).await?;
        let span = request_span("unit_costs", &query);
        async {
            let machines = resolve_machines(self.machine_filter.as_ref(), &query).await?;
            let (costs, productivity) =
                self.fetch_costs_and_productivity(&machines, &query).await?;
            Ok(TepCalculator::new(settings.zone_labels).unit_costs(
                &costs,
                &productivity,
                &query.range,
                query.breakdown,
            ))
        }
        .instrument(span)
        .await
    }

    /// 实际/目标成本对比
    pub async fn cost_comparison(
        &self,
        request: &AnalyticsRequest,
    ) -> ApiResult<Vec<CostComparison>> {
        let (settings, query) = self.prepare(request).await?;
        let span = request_span("cost_comparison", &query);
        async {
            let machines = resolve_machines(self.machine_filter.as_ref(), &query).await?;
            let costs = self
                .fact_repo
                .find_costs(&machine_ids(&machines), &query.range)
                .await
                .map_err(|e| upstream_failure("costs", e))?;
            Ok(TepCalculator::new(settings.zone_labels).cost_comparison(&costs))
        }
        .instrument(span)
        .await
    }

    /// 拥有成本结构
    pub async fn ownership_structure(
        &self,
        request: &AnalyticsRequest,
    ) -> ApiResult<Vec<MachineOwnership>> {
        let (_, query) = self.prepare(request).await?;
        let span = request_span("ownership_structure", &query);
        async {
            let machines = resolve_machines(self.machine_filter.as_ref(), &query).await?;
            let (costs, productivity) =
                self.fetch_costs_and_productivity(&machines, &query).await?;
            Ok(OwnershipCalculator::new().structure(&machines, &costs, &productivity))
        }
        .instrument(span)
        .await
    }

    // ==========================================
    // 累计单位成本
    // ==========================================

    /// 各设备累计单位成本动态
    pub async fn accumulated_costs(
        &self,
        request: &AnalyticsRequest,
    ) -> ApiResult<Vec<MachineCumulativeSeries>> {
        let (_, query) = self.prepare(request).await?;
        let span = request_span("accumulated_costs", &query);
        async {
            let machines = resolve_machines(self.machine_filter.as_ref(), &query).await?;
            let (costs, productivity) =
                self.fetch_costs_and_productivity(&machines, &query).await?;
            Ok(build_machine_series(&machines, &costs, &productivity, &query))
        }
        .instrument(span)
        .await
    }

    /// 累计单位成本与同品牌设备对比
    ///
    /// # 返回
    /// - 先各设备序列，再每个品牌一条对齐序列（品牌按首次出现顺序）
    pub async fn accumulated_costs_vs_industry(
        &self,
        request: &AnalyticsRequest,
    ) -> ApiResult<Vec<IndustryComparisonEntry>> {
        let (_, query) = self.prepare(request).await?;
        let span = request_span("accumulated_costs_vs_industry", &query);
        async {
            let machines = resolve_machines(self.machine_filter.as_ref(), &query).await?;
            let (costs, productivity) =
                self.fetch_costs_and_productivity(&machines, &query).await?;

            let mut result: Vec<IndustryComparisonEntry> =
                build_machine_series(&machines, &costs, &productivity, &query)
                    .into_iter()
                    .map(IndustryComparisonEntry::Machine)
                    .collect();

            let mut seen = HashSet::new();
            for machine in &machines {
                if !seen.insert(machine.mark_id) {
                    continue;
                }
                let series = self.mark_series(machine, &query).await?;
                result.push(IndustryComparisonEntry::Mark(series));
            }
            Ok(result)
        }
        .instrument(span)
        .await
    }

    /// 品牌队列: 组织内该品牌全部设备
    async fn mark_series(&self, sample: &Machine, query: &AnalyticsQuery) -> ApiResult<MarkSeries> {
        let mut cohort = self
            .machine_filter
            .find_by_mark(query.selection.organization_id, sample.mark_id)
            .await
            .map_err(|e| upstream_failure("mark_cohort", e))?;
        cohort.sort_by_key(|m| m.id);

        let data = if cohort.is_empty() {
            Vec::new()
        } else {
            let (costs, productivity) = self.fetch_costs_and_productivity(&cohort, query).await?;
            let builder = CumulativeSeriesBuilder::new();
            let series: Vec<_> = cohort
                .iter()
                .map(|m| builder.build(m, &costs, &productivity, &query.range, query.breakdown))
                .collect();
            MarkAligner::new().align(&series, query.breakdown, cohort.len())
        };
        tracing::debug!(mark_id = sample.mark_id, cohort = cohort.len(), "品牌对齐完成");

        Ok(MarkSeries {
            mark_id: sample.mark_id,
            mark_name: sample.mark_name.clone(),
            data,
        })
    }
}

fn build_machine_series(
    machines: &[Machine],
    costs: &[CostRecord],
    productivity: &[WorkTimeProductivityRecord],
    query: &AnalyticsQuery,
) -> Vec<MachineCumulativeSeries> {
    let builder = CumulativeSeriesBuilder::new();
    machines
        .iter()
        .map(|machine| MachineCumulativeSeries {
            machine_id: machine.id,
            mark_name: machine.label(),
            data: builder.build(machine, costs, productivity, &query.range, query.breakdown),
        })
        .collect()
}
