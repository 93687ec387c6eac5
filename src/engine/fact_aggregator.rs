// ==========================================
// 矿山设备车队决策支持系统 - 事实聚合引擎
// ==========================================
// 职责: 事实记录 → (分组键, 期间) → 累加值
// 约束: 分组按首次出现顺序保留；(分组, 期间) 查找为 O(1) 哈希 + O(log n) 有序映射
// 红线: Engine 不拼 SQL
// ==========================================

use crate::domain::period::{DateRange, PeriodKey};
use crate::domain::types::BreakdownType;
use crate::engine::gap_filler::{GapFiller, PeriodSeries};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::hash::Hash;

// ==========================================
// GroupedSeries - 分组期间序列
// ==========================================
#[derive(Debug, Clone)]
pub struct GroupedSeries<G, V> {
    index: HashMap<G, usize>,
    groups: Vec<(G, PeriodSeries<V>)>,
}

impl<G, V> Default for GroupedSeries<G, V> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            groups: Vec::new(),
        }
    }
}

impl<G: Eq + Hash + Clone, V: Default> GroupedSeries<G, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取分组序列，不存在则按出现顺序追加
    pub fn group_mut(&mut self, group: G) -> &mut PeriodSeries<V> {
        let idx = match self.index.get(&group) {
            Some(&idx) => idx,
            None => {
                let idx = self.groups.len();
                self.index.insert(group.clone(), idx);
                self.groups.push((group, PeriodSeries::new()));
                idx
            }
        };
        &mut self.groups[idx].1
    }

    /// 取 (分组, 期间) 累加槽，不存在则以默认值创建
    pub fn entry(&mut self, group: G, period: PeriodKey) -> &mut V {
        self.group_mut(group).entry(period).or_default()
    }

    pub fn get(&self, group: &G, period: &PeriodKey) -> Option<&V> {
        self.index
            .get(group)
            .and_then(|&idx| self.groups[idx].1.get(period))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// 每个分组按范围补齐期间
    pub fn fill_gaps(&mut self, range: &DateRange, breakdown: BreakdownType) {
        let filler = GapFiller::new();
        for (_, series) in &mut self.groups {
            filler.fill(series, range, breakdown);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &(G, PeriodSeries<V>)> {
        self.groups.iter()
    }

    /// 按首次出现顺序输出全部分组
    pub fn into_groups(self) -> Vec<(G, PeriodSeries<V>)> {
        self.groups
    }
}

// ==========================================
// FactAggregator - 事实聚合引擎
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct FactAggregator;

impl FactAggregator {
    pub fn new() -> Self {
        Self
    }

    /// 通用折叠
    ///
    /// # 参数
    /// - `records`: 事实记录
    /// - `breakdown`: 期间粒度
    /// - `key`: 记录 → (分组键, 记录日期)；返回 None 的记录被跳过
    /// - `accumulate`: 把记录累加进槽位
    pub fn fold<R, G, V, K, A>(
        &self,
        records: &[R],
        breakdown: BreakdownType,
        key: K,
        accumulate: A,
    ) -> GroupedSeries<G, V>
    where
        G: Eq + Hash + Clone,
        V: Default,
        K: Fn(&R) -> Option<(G, NaiveDate)>,
        A: Fn(&mut V, &R),
    {
        let mut grouped = GroupedSeries::new();
        for record in records {
            if let Some((group, date)) = key(record) {
                let period = PeriodKey::from_date(date, breakdown);
                accumulate(grouped.entry(group, period), record);
            }
        }
        grouped
    }

    /// 不分组的按期间求和
    pub fn sum_by_period<R, K>(
        &self,
        records: &[R],
        breakdown: BreakdownType,
        value: K,
    ) -> PeriodSeries<f64>
    where
        K: Fn(&R) -> Option<(NaiveDate, f64)>,
    {
        let mut series = PeriodSeries::new();
        for record in records {
            if let Some((date, v)) = value(record) {
                *series
                    .entry(PeriodKey::from_date(date, breakdown))
                    .or_insert(0.0) += v;
            }
        }
        series
    }
}
