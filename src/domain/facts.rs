// ==========================================
// 矿山设备车队决策支持系统 - 事实记录
// ==========================================
// 职责: 成本、工时/产量、技术完好率 (КТГ) 原始记录
// 约束: 数值字段允许为空，聚合时按 0 计
// ==========================================

use crate::domain::types::CostCategory;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// CostKind - 成本类别定义
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostKind {
    pub id: i64,
    pub name: String,
    pub is_model: bool,
    pub category: Option<CostCategory>,
}

// ==========================================
// CostRecord - 成本记录
// ==========================================
// 唯一性: (machine_id, kind_id, date_period, is_model)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostRecord {
    pub id: i64,
    pub machine_id: i64,
    pub kind: CostKind,
    pub date_period: NaiveDate,
    pub value: Option<f64>,
    pub is_model: bool, // true = 目标/计划值, false = 实际值
}

// ==========================================
// WorkTimeProductivityRecord - 工时与产量记录
// ==========================================
// 唯一性: (machine_id, date_period, is_model)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkTimeProductivityRecord {
    pub id: i64,
    pub machine_id: i64,
    pub strategy_id: Option<i64>,
    pub date_period: NaiveDate,
    pub work_time: Option<f64>,
    pub productivity: Option<f64>,
    pub is_model: bool,
}

// ==========================================
// CtfRecord - 技术完好率原始记录
// ==========================================
// _f = 实际值, _c = 计算(目标)值
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CtfRecord {
    pub id: i64,
    pub machine_id: i64,
    pub date_period: Option<NaiveDate>,

    pub worktime_f: Option<f64>,
    pub worktime_c: Option<f64>,
    pub planned_oatd_f: Option<f64>,   // 计划停机
    pub planned_oatd_c: Option<f64>,
    pub unplanned_oatd_f: Option<f64>, // 非计划停机
    pub unplanned_oatd_c: Option<f64>,
    pub tm_f: Option<f64>,             // 技术保养
    pub tm_c: Option<f64>,
    pub tr_f: Option<f64>,             // 小修
    pub tr_c: Option<f64>,
    pub mr_f: Option<f64>,             // 中修
    pub mr_c: Option<f64>,
    pub unplanned_repair_f: Option<f64>,
    pub unplanned_repair_c: Option<f64>,
}

impl CtfRecord {
    /// 实际值五要素
    pub fn fact_components(&self) -> CtfComponents {
        CtfComponents {
            work_time: num(self.worktime_f),
            planned_outage: num(self.planned_oatd_f),
            unplanned_outage: num(self.unplanned_oatd_f),
            planned_repair: num(self.tm_f) + num(self.tr_f) + num(self.mr_f),
            unplanned_repair: num(self.unplanned_repair_f),
        }
    }

    /// 计算值五要素
    pub fn calculated_components(&self) -> CtfComponents {
        CtfComponents {
            work_time: num(self.worktime_c),
            planned_outage: num(self.planned_oatd_c),
            unplanned_outage: num(self.unplanned_oatd_c),
            planned_repair: num(self.tm_c) + num(self.tr_c) + num(self.mr_c),
            unplanned_repair: num(self.unplanned_repair_c),
        }
    }
}

// ==========================================
// CtfComponents - 技术完好率五要素（小时）
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CtfComponents {
    pub work_time: f64,
    pub planned_outage: f64,
    pub unplanned_outage: f64,
    pub planned_repair: f64, // TM + TR + MR
    pub unplanned_repair: f64,
}

impl CtfComponents {
    pub fn add(&mut self, other: &CtfComponents) {
        self.work_time += other.work_time;
        self.planned_outage += other.planned_outage;
        self.unplanned_outage += other.unplanned_outage;
        self.planned_repair += other.planned_repair;
        self.unplanned_repair += other.unplanned_repair;
    }

    /// 五要素合计
    pub fn total(&self) -> f64 {
        self.work_time
            + self.planned_outage
            + self.unplanned_outage
            + self.planned_repair
            + self.unplanned_repair
    }

    pub fn scaled(&self, factor: f64) -> CtfComponents {
        CtfComponents {
            work_time: self.work_time * factor,
            planned_outage: self.planned_outage * factor,
            unplanned_outage: self.unplanned_outage * factor,
            planned_repair: self.planned_repair * factor,
            unplanned_repair: self.unplanned_repair * factor,
        }
    }
}

/// 空值/非有限值按 0 计
pub fn num(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    }
}
