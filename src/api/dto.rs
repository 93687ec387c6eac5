// ==========================================
// 矿山设备车队决策支持系统 - API DTO 定义
// ==========================================
// 职责: 分析请求解析与响应结构
// 格式: JSON camelCase；日期接受 YYYY-MM-DD 或 RFC 3339（按整日截断）
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::machine::MachineSelection;
use crate::domain::period::DateRange;
use crate::domain::types::BreakdownType;
use crate::engine::cumulative::CumulativePoint;
use crate::engine::mark_aligner::AlignedPoint;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// 请求
// ==========================================

/// 分析请求（所有分析接口共用）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsRequest {
    /// 组织 ID（必填）
    pub organization_id: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_class_ids: Option<Vec<i64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_mark_ids: Option<Vec<i64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_type_ids: Option<Vec<i64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_ids: Option<Vec<i64>>,

    /// 起始日期（必填）
    pub date_start: String,

    /// 结束日期（必填）
    pub date_end: String,

    /// 粒度 "year" | "quarter" | "month"（可选，缺省取配置）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown_type: Option<String>,
}

/// 解析后的请求
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsQuery {
    pub selection: MachineSelection,
    pub range: DateRange,
    pub breakdown: BreakdownType,
}

impl AnalyticsRequest {
    /// 校验并转换为内部查询
    ///
    /// # 参数
    /// - `default_breakdown`: 请求未指定粒度时使用
    ///
    /// # 返回
    /// - Err(InvalidInput): 日期无法解析、起始晚于结束、粒度未知
    pub fn to_query(&self, default_breakdown: BreakdownType) -> ApiResult<AnalyticsQuery> {
        let start = parse_request_date("dateStart", &self.date_start)?;
        let end = parse_request_date("dateEnd", &self.date_end)?;
        let range = DateRange::new(start, end);
        if !range.is_valid() {
            return Err(ApiError::InvalidInput(format!(
                "dateStart({}) 晚于 dateEnd({})",
                start, end
            )));
        }

        let breakdown = match self.breakdown_type.as_deref() {
            None => default_breakdown,
            Some(raw) => BreakdownType::from_str(raw)
                .ok_or_else(|| ApiError::InvalidInput(format!("未知的 breakdownType: {}", raw)))?,
        };

        Ok(AnalyticsQuery {
            selection: MachineSelection {
                organization_id: self.organization_id,
                machine_class_ids: self.machine_class_ids.clone().unwrap_or_default(),
                machine_mark_ids: self.machine_mark_ids.clone().unwrap_or_default(),
                machine_type_ids: self.machine_type_ids.clone().unwrap_or_default(),
                machine_ids: self.machine_ids.clone().unwrap_or_default(),
            },
            range,
            breakdown,
        })
    }
}

/// 解析请求日期，时间部分截断
fn parse_request_date(field: &str, raw: &str) -> ApiResult<NaiveDate> {
    let value = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(dt.date());
    }
    Err(ApiError::InvalidInput(format!(
        "{} 日期格式错误: {}",
        field, raw
    )))
}

// ==========================================
// 响应
// ==========================================

/// 单台设备累计单位成本序列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineCumulativeSeries {
    pub machine_id: i64,
    pub mark_name: String,
    pub data: Vec<CumulativePoint>,
}

/// 品牌对齐序列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkSeries {
    pub mark_id: i64,
    pub mark_name: String,
    pub data: Vec<AlignedPoint>,
}

/// 行业对比响应项：先设备，后品牌
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndustryComparisonEntry {
    Machine(MachineCumulativeSeries),
    Mark(MarkSeries),
}
