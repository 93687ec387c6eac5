// ==========================================
// 矿山设备车队决策支持系统 - 技术完好率计算引擎
// ==========================================
// 职责: 五要素结构（整段合计）与逐年结构
// 输入: CtfRecord（实际 _f / 计算 _c）
// 红线: 年化归一由 AnnualizationNormalizer 负责
// ==========================================

use crate::domain::facts::{CtfComponents, CtfRecord};
use crate::domain::period::DateRange;
use crate::engine::annualization::AnnualizationNormalizer;
use crate::engine::gap_filler::GapFiller;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::instrument;

/// 实际序列标签
pub const CTF_FACT_LABEL: &str = "Факт";
/// 计划序列标签
pub const CTF_PLAN_LABEL: &str = "План";

/// 整段结构
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CtfStructure {
    pub fact: CtfComponents,
    pub calculated: CtfComponents,
}

/// 带标签的五要素
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabeledComponents {
    pub label: String,
    #[serde(flatten)]
    pub components: CtfComponents,
}

/// 年度结构
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CtfYear {
    pub year: i32,
    pub fact: LabeledComponents,
    pub calculated: LabeledComponents,
}

#[derive(Debug, Default, Clone, Copy)]
struct CtfTotals {
    fact: CtfComponents,
    calculated: CtfComponents,
}

impl CtfTotals {
    fn add(&mut self, record: &CtfRecord) {
        self.fact.add(&record.fact_components());
        self.calculated.add(&record.calculated_components());
    }
}

// ==========================================
// CtfCalculator - 技术完好率计算引擎
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct CtfCalculator {
    normalizer: AnnualizationNormalizer,
    filler: GapFiller,
}

impl CtfCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 整段合计，按 dateEnd 所在年份年化
    #[instrument(level = "debug", skip(self, records), fields(records = records.len()))]
    pub fn structure(&self, records: &[CtfRecord], range: &DateRange) -> CtfStructure {
        let mut totals = CtfTotals::default();
        for record in records {
            totals.add(record);
        }
        let year = range.end.year();
        CtfStructure {
            fact: self.normalizer.normalize(&totals.fact, year),
            calculated: self.normalizer.normalize(&totals.calculated, year),
        }
    }

    /// 逐年合计，范围内每年都有输出，各年按自身小时数年化
    #[instrument(level = "debug", skip(self, records), fields(records = records.len()))]
    pub fn yearly(&self, records: &[CtfRecord], range: &DateRange) -> Vec<CtfYear> {
        let mut by_year: BTreeMap<i32, CtfTotals> = BTreeMap::new();
        for record in records {
            if let Some(date) = record.date_period {
                by_year.entry(date.year()).or_default().add(record);
            }
        }
        self.filler.fill_years(&mut by_year, range);

        by_year
            .into_iter()
            .map(|(year, totals)| CtfYear {
                year,
                fact: LabeledComponents {
                    label: CTF_FACT_LABEL.to_string(),
                    components: self.normalizer.normalize(&totals.fact, year),
                },
                calculated: LabeledComponents {
                    label: CTF_PLAN_LABEL.to_string(),
                    components: self.normalizer.normalize(&totals.calculated, year),
                },
            })
            .collect()
    }
}
