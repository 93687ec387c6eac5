// ==========================================
// 矿山设备车队决策支持系统 - API 层
// ==========================================
// 职责: 分析接口门面（TEP / CTF / 车队结构），供 CLI 与集成方调用
// ==========================================

pub mod actives_api;
pub mod ctf_api;
pub mod dto;
pub mod error;
mod support;
pub mod tep_api;

// 重导出核心类型
pub use actives_api::ActivesApi;
pub use ctf_api::CtfApi;
pub use dto::{
    AnalyticsQuery, AnalyticsRequest, IndustryComparisonEntry, MachineCumulativeSeries, MarkSeries,
};
pub use error::{ApiError, ApiResult, NO_DATA_FOR_FILTER};
pub use tep_api::TepApi;
