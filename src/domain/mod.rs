// ==========================================
// 矿山设备车队决策支持系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、值类型、期间分桶
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod facts;
pub mod machine;
pub mod period;
pub mod types;

// 重导出核心类型
pub use facts::{CostKind, CostRecord, CtfComponents, CtfRecord, WorkTimeProductivityRecord};
pub use machine::{
    Machine, MachineClass, MachineClassTree, MachineFace, MachineSelection, SelectionCriterion,
};
pub use period::{hours_in_year, is_leap_year, DateRange, PeriodKey};
pub use types::{BreakdownType, CostCategory, WorkZone, ZoneLabels};
