// ==========================================
// 矿山设备车队决策支持系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 决策支持系统（技术经济指标 ТЭП / 技术完好率 КТГ 聚合）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 聚合计算
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 分析接口
pub mod api;

// 应用层 - 组装与报表分发
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{BreakdownType, CostCategory, WorkZone, ZoneLabels};

// 领域实体
pub use domain::{
    CostKind, CostRecord, CtfComponents, CtfRecord, DateRange, Machine, MachineClass,
    MachineClassTree, MachineFace, MachineSelection, PeriodKey, WorkTimeProductivityRecord,
};

// 引擎
pub use engine::{
    AnnualizationNormalizer, CtfCalculator, CumulativeSeriesBuilder, FactAggregator,
    FleetStructureCalculator, GapFiller, MarkAligner, OwnershipCalculator, ServiceLifeAggregator,
    TepCalculator,
};

// API
pub use api::{ActivesApi, AnalyticsRequest, ApiError, ApiResult, CtfApi, TepApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "矿山设备车队决策支持系统";
