// ==========================================
// 矿山设备车队决策支持系统 - 期间分桶
// ==========================================
// 职责: 日期 → 期间键 (年 / 年+季度 / 年+月)，期间标签 (combinedDate)
// 约束: 季度、月份均从 1 开始；标签格式固定，可排序、可反解析
// ==========================================

use crate::domain::types::BreakdownType;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 平年小时数
pub const HOURS_IN_COMMON_YEAR: f64 = 8760.0;
/// 闰年小时数
pub const HOURS_IN_LEAP_YEAR: f64 = 8784.0;

// ==========================================
// PeriodKey - 期间键
// ==========================================
// 同一粒度下 quarter / month 至多一个有值，
// 派生的 Ord 即 (year, quarter, month) 升序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeriodKey {
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quarter: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
}

impl PeriodKey {
    /// 按粒度把日期映射为期间键
    pub fn from_date(date: NaiveDate, breakdown: BreakdownType) -> Self {
        let year = date.year();
        let month0 = date.month0();
        match breakdown {
            BreakdownType::Year => Self::year(year),
            BreakdownType::Quarter => Self {
                year,
                quarter: Some(month0 / 3 + 1),
                month: None,
            },
            BreakdownType::Month => Self {
                year,
                quarter: None,
                month: Some(month0 + 1),
            },
        }
    }

    /// 年度期间键
    pub fn year(year: i32) -> Self {
        Self {
            year,
            quarter: None,
            month: None,
        }
    }

    /// 某年的第一个子期间（年 / Q1 / 1 月），用于投产期间
    pub fn first_of_year(year: i32, breakdown: BreakdownType) -> Self {
        match breakdown {
            BreakdownType::Year => Self::year(year),
            BreakdownType::Quarter => Self {
                year,
                quarter: Some(1),
                month: None,
            },
            BreakdownType::Month => Self {
                year,
                quarter: None,
                month: Some(1),
            },
        }
    }

    /// 期间键对应的粒度
    pub fn breakdown(&self) -> BreakdownType {
        if self.month.is_some() {
            BreakdownType::Month
        } else if self.quarter.is_some() {
            BreakdownType::Quarter
        } else {
            BreakdownType::Year
        }
    }

    /// 子期间序号（季度或月份），年度粒度为 None
    pub fn sub_period(&self) -> Option<u32> {
        self.month.or(self.quarter)
    }

    /// 下一个期间
    pub fn succ(&self) -> Self {
        match (self.quarter, self.month) {
            (_, Some(12)) => Self {
                year: self.year + 1,
                quarter: None,
                month: Some(1),
            },
            (_, Some(m)) => Self {
                year: self.year,
                quarter: None,
                month: Some(m + 1),
            },
            (Some(4), None) => Self {
                year: self.year + 1,
                quarter: Some(1),
                month: None,
            },
            (Some(q), None) => Self {
                year: self.year,
                quarter: Some(q + 1),
                month: None,
            },
            (None, None) => Self::year(self.year + 1),
        }
    }

    /// 期间标签 (combinedDate)
    ///
    /// - 年: "2023"
    /// - 季度: "2023-Q2"
    /// - 月: "2023-05"
    pub fn label(&self) -> String {
        match (self.quarter, self.month) {
            (_, Some(m)) => format!("{}-{:02}", self.year, m),
            (Some(q), None) => format!("{}-Q{}", self.year, q),
            (None, None) => format!("{}", self.year),
        }
    }

    /// 反解析期间标签，格式不符返回 None
    pub fn parse_label(label: &str) -> Option<Self> {
        let label = label.trim();
        let (year_part, rest) = match label.split_once('-') {
            Some((y, r)) => (y, Some(r)),
            None => (label, None),
        };
        let year: i32 = year_part.parse().ok()?;

        match rest {
            None => Some(Self::year(year)),
            Some(r) if r.starts_with('Q') => {
                let q: u32 = r[1..].parse().ok()?;
                (1..=4).contains(&q).then(|| Self {
                    year,
                    quarter: Some(q),
                    month: None,
                })
            }
            Some(r) => {
                let m: u32 = r.parse().ok()?;
                (1..=12).contains(&m).then(|| Self {
                    year,
                    quarter: None,
                    month: Some(m),
                })
            }
        }
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ==========================================
// DateRange - 日期范围（闭区间，按整日）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// 起止是否有效 (start <= end)
    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// 范围覆盖的所有期间键（含首尾期间）
    ///
    /// 按期间键逐个推进，而不是按日期加月，
    /// 月末起始日不会跳过短月
    pub fn periods(&self, breakdown: BreakdownType) -> Vec<PeriodKey> {
        if !self.is_valid() {
            return Vec::new();
        }
        let last = PeriodKey::from_date(self.end, breakdown);
        let mut current = PeriodKey::from_date(self.start, breakdown);
        let mut periods = Vec::new();
        while current <= last {
            periods.push(current);
            current = current.succ();
        }
        periods
    }

    /// 范围覆盖的所有日历年
    pub fn years(&self) -> std::ops::RangeInclusive<i32> {
        self.start.year()..=self.end.year()
    }
}

/// 格里高利历闰年判定
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// 一年的总小时数 (8784 / 8760)
pub fn hours_in_year(year: i32) -> f64 {
    if is_leap_year(year) {
        HOURS_IN_LEAP_YEAR
    } else {
        HOURS_IN_COMMON_YEAR
    }
}
