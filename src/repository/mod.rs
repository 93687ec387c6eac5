// ==========================================
// 矿山设备车队决策支持系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 设备筛选与事实记录读取接口，屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod db_utils;
pub mod error;
pub mod fact_repo;
pub mod machine_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use fact_repo::{FactRepository, SqliteFactRepository};
pub use machine_repo::{MachineFilter, SqliteMachineRepository};
