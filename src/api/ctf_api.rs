// ==========================================
// 矿山设备车队决策支持系统 - 技术完好率 API
// ==========================================
// 职责: 五要素结构、逐年结构、按服役年限的工作时间
// 架构: API 层 → MachineFilter / FactRepository → Engine 层
// ==========================================

use std::sync::Arc;

use tracing::Instrument;

use crate::api::dto::{AnalyticsQuery, AnalyticsRequest};
use crate::api::error::ApiResult;
use crate::api::support::{machine_ids, request_span, resolve_machines, upstream_failure};
use crate::config::{AnalyticsSettings, ConfigManager};
use crate::domain::facts::CtfRecord;
use crate::domain::machine::Machine;
use crate::engine::ctf_calculator::{CtfCalculator, CtfStructure, CtfYear};
use crate::engine::service_life::{ServiceLifeAggregator, ServiceLifePoint};
use crate::repository::fact_repo::FactRepository;
use crate::repository::machine_repo::MachineFilter;

pub struct CtfApi {
    machine_filter: Arc<dyn MachineFilter>,
    fact_repo: Arc<dyn FactRepository>,
    config: Arc<ConfigManager>,
}

impl CtfApi {
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

    async fn fetch_records(
        &self,
        machines: &[Machine],
        query: &AnalyticsQuery,
    ) -> ApiResult<Vec<CtfRecord>> {
        let records = self
            .fact_repo
            .find_ctf_records(&machine_ids(machines), &query.range)
            .await
            .map_err(|e| upstream_failure("ctf_records", e))?;
        tracing::debug!(records = records.len(), "CTF 记录拉取完成");
        Ok(records)
    }

    /// 整段五要素结构（按 dateEnd 年份年化）
    pub async fn ctf_structure(&self, request: &AnalyticsRequest) -> ApiResult<CtfStructure> {
        let (_, query) = self.prepare(request).await?;
        let span = request_span("ctf_structure", &query);
        async {
            let machines = resolve_machines(self.machine_filter.as_ref(), &query).await?;
            let records = self.fetch_records(&machines, &query).await?;
            Ok(CtfCalculator::new().structure(&records, &query.range))
        }
        .instrument(span)
        .await
    }

    /// 逐年五要素结构
    pub async fn ctf_yearly(&self, request: &AnalyticsRequest) -> ApiResult<Vec<CtfYear>> {
        let (_, query) = self.prepare(request).await?;
        let span = request_span("ctf_yearly", &query);
        async {
            let machines = resolve_machines(self.machine_filter.as_ref(), &query).await?;
            let records = self.fetch_records(&machines, &query).await?;
            Ok(CtfCalculator::new().yearly(&records, &query.range))
        }
        .instrument(span)
        .await
    }

    /// 按服役年限的平均实际工作时间
    pub async fn ctf_worktime_by_service_life(
        &self,
        request: &AnalyticsRequest,
    ) -> ApiResult<Vec<ServiceLifePoint>> {
        let (settings, query) = self.prepare(request).await?;
        let span = request_span("ctf_worktime_by_service_life", &query);
        async {
            let machines = resolve_machines(self.machine_filter.as_ref(), &query).await?;
            let records = self.fetch_records(&machines, &query).await?;
            Ok(ServiceLifeAggregator::new(settings.service_life_margin).aggregate(&machines, &records))
        }
        .instrument(span)
        .await
    }
}
