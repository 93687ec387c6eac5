// ==========================================
// 矿山设备车队决策支持系统 - API 公共流程
// ==========================================
// 职责: 请求 span、设备解析 + 无数据拦截、上游失败记录
// 约束: 设备为空时在任何事实查询之前返回 NotFound
// ==========================================

use crate::api::dto::AnalyticsQuery;
use crate::api::error::ApiError;
use crate::domain::machine::Machine;
use crate::repository::error::RepositoryError;
use crate::repository::machine_repo::MachineFilter;
use tracing::Span;
use uuid::Uuid;

/// 每次接口调用一个 span，带请求追踪 ID
pub(crate) fn request_span(report: &'static str, query: &AnalyticsQuery) -> Span {
    tracing::info_span!(
        "analytics_request",
        request_id = %Uuid::new_v4(),
        report = report,
        organization_id = query.selection.organization_id,
        breakdown = %query.breakdown,
        date_start = %query.range.start,
        date_end = %query.range.end,
    )
}

/// 记录上游查询失败并原样上抛
pub(crate) fn upstream_failure(source: &'static str, err: RepositoryError) -> ApiError {
    tracing::error!(source = source, error = %err, "上游数据查询失败");
    ApiError::from(err)
}

/// 解析设备列表（按 ID 升序），为空返回 NotFound
pub(crate) async fn resolve_machines(
    filter: &dyn MachineFilter,
    query: &AnalyticsQuery,
) -> Result<Vec<Machine>, ApiError> {
    let mut machines = filter
        .resolve(&query.selection)
        .await
        .map_err(|e| upstream_failure("machine_filter", e))?;

    if machines.is_empty() {
        tracing::info!("过滤条件未匹配到设备");
        return Err(ApiError::no_data_for_filter());
    }

    machines.sort_by_key(|m| m.id);
    tracing::debug!(machines = machines.len(), "设备解析完成");
    Ok(machines)
}

pub(crate) fn machine_ids(machines: &[Machine]) -> Vec<i64> {
    machines.iter().map(|m| m.id).collect()
}
