// ==========================================
// 矿山设备车队决策支持系统 - 应用层
// ==========================================
// 职责: 组装仓储、配置与 API 实例；报表分发
// ==========================================

pub mod report;
pub mod state;

// 重导出
pub use report::Report;
pub use state::{get_default_db_path, AppState};
