// ==========================================
// 矿山设备车队决策支持系统 - 配置层
// ==========================================
// 职责: 分析参数管理（安全系数、作业区标签、默认粒度、主/辅设备分类）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;

// 重导出核心配置管理器
pub use config_manager::{config_keys, AnalyticsSettings, ConfigManager};
