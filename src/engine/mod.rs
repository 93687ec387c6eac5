// ==========================================
// 矿山设备车队决策支持系统 - 引擎层
// ==========================================
// 职责: 纯内存聚合（分桶、补齐、累计、对齐、年化），不拼 SQL
// 红线: Engine 不拼 SQL, 所有除法经 safe_ratio
// ==========================================

pub mod annualization;
pub mod ctf_calculator;
pub mod cumulative;
pub mod fact_aggregator;
pub mod fleet_structure;
pub mod gap_filler;
pub mod mark_aligner;
pub mod ownership;
pub mod ratio;
pub mod service_life;
pub mod tep_calculator;

// 重导出核心引擎
pub use annualization::AnnualizationNormalizer;
pub use ctf_calculator::{CtfCalculator, CtfStructure, CtfYear, LabeledComponents};
pub use cumulative::{trim_zero_edges, CumulativePoint, CumulativeSeriesBuilder};
pub use fact_aggregator::{FactAggregator, GroupedSeries};
pub use fleet_structure::{
    AverageMachineAge, CumulativeMachineCount, FleetCategory, FleetStructureCalculator,
    MachineCountAndAge, WorkDistribution, YearCount,
};
pub use gap_filler::{GapFiller, PeriodSeries};
pub use mark_aligner::{AlignedPoint, MarkAligner};
pub use ownership::{MachineOwnership, OwnershipCalculator, OwnershipItem};
pub use ratio::safe_ratio;
pub use service_life::{ServiceLifeAggregator, ServiceLifePoint};
pub use tep_calculator::{
    CostComparison, KindCostTotal, ProductivityGroup, ProductivityPoint, TepCalculator,
    UnitCostPoint, UnitCostSeries, VolumePoint,
};
