// ==========================================
// 矿山设备车队决策支持系统 - 领域类型定义
// ==========================================
// 职责: 分组粒度、作业区、成本类别等枚举
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 分组粒度 (Breakdown Type)
// ==========================================
// 序列化格式: 小写 (与请求参数一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakdownType {
    Year,    // 按年
    Quarter, // 按季度
    Month,   // 按月
}

impl fmt::Display for BreakdownType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl BreakdownType {
    /// 从字符串解析（大小写不敏感），未知值返回 None
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "year" => Some(BreakdownType::Year),
            "quarter" => Some(BreakdownType::Quarter),
            "month" => Some(BreakdownType::Month),
            _ => None,
        }
    }

    /// 转换为配置/请求中使用的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            BreakdownType::Year => "year",
            BreakdownType::Quarter => "quarter",
            BreakdownType::Month => "month",
        }
    }
}

// ==========================================
// 作业区 (Work Zone)
// ==========================================
// 来源: 设备当前所在工作面的 zone_working 字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkZone {
    Extraction, // 采矿 (Добыча)
    Stripping,  // 剥离 (Вскрыша)
    Additional, // 辅助作业 (未识别/缺失)
}

impl fmt::Display for WorkZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkZone::Extraction => write!(f, "EXTRACTION"),
            WorkZone::Stripping => write!(f, "STRIPPING"),
            WorkZone::Additional => write!(f, "ADDITIONAL"),
        }
    }
}

/// 作业区标签映射（标签文本来自配置）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneLabels {
    pub extraction: String,
    pub stripping: String,
}

impl Default for ZoneLabels {
    fn default() -> Self {
        Self {
            extraction: "Добыча".to_string(),
            stripping: "Вскрыша".to_string(),
        }
    }
}

impl ZoneLabels {
    /// 按工作面标签分类；未识别或缺失归入辅助作业
    pub fn classify(&self, zone_working: Option<&str>) -> WorkZone {
        match zone_working.map(str::trim) {
            Some(label) if label == self.extraction => WorkZone::Extraction,
            Some(label) if label == self.stripping => WorkZone::Stripping,
            _ => WorkZone::Additional,
        }
    }
}

// ==========================================
// 成本类别 (Cost Category)
// ==========================================
// 存储于 costs_kind.category，拥有成本结构按此归类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CostCategory {
    MaintenanceRepair, // 维护保养、修理、备件
    Other,             // 其他
    LaborTaxes,        // 工资与税费
    Fuel,              // 燃料（运行费用）
}

impl fmt::Display for CostCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl CostCategory {
    /// 从数据库字符串解析，未知/空值返回 None（不计入任何类别）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "MAINTENANCE_REPAIR" => Some(CostCategory::MaintenanceRepair),
            "OTHER" => Some(CostCategory::Other),
            "LABOR_TAXES" => Some(CostCategory::LaborTaxes),
            "FUEL" => Some(CostCategory::Fuel),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            CostCategory::MaintenanceRepair => "MAINTENANCE_REPAIR",
            CostCategory::Other => "OTHER",
            CostCategory::LaborTaxes => "LABOR_TAXES",
            CostCategory::Fuel => "FUEL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breakdown_type_parse() {
        assert_eq!(BreakdownType::from_str("Quarter"), Some(BreakdownType::Quarter));
        assert_eq!(BreakdownType::from_str(" month "), Some(BreakdownType::Month));
        assert_eq!(BreakdownType::from_str("week"), None);
    }

    #[test]
    fn test_breakdown_type_serde() {
        let json = serde_json::to_string(&BreakdownType::Year).unwrap();
        assert_eq!(json, "\"year\"");
        let parsed: BreakdownType = serde_json::from_str("\"quarter\"").unwrap();
        assert_eq!(parsed, BreakdownType::Quarter);
    }

    #[test]
    fn test_zone_classification() {
        let labels = ZoneLabels::default();
        assert_eq!(labels.classify(Some("Добыча")), WorkZone::Extraction);
        assert_eq!(labels.classify(Some("Вскрыша")), WorkZone::Stripping);
        assert_eq!(labels.classify(Some("Отвал")), WorkZone::Additional);
        assert_eq!(labels.classify(None), WorkZone::Additional);
    }

    #[test]
    fn test_cost_category_roundtrip_db_str() {
        for c in [
            CostCategory::MaintenanceRepair,
            CostCategory::Other,
            CostCategory::LaborTaxes,
            CostCategory::Fuel,
        ] {
            assert_eq!(CostCategory::from_str(c.to_db_str()), Some(c));
        }
        assert_eq!(CostCategory::from_str(""), None);
    }
}
