// ==========================================
// 矿山设备车队决策支持系统 - 设备领域模型
// ==========================================
// 职责: 设备实体、设备选择条件、设备分类树
// 红线: 只读模型，核心计算不修改任何实体
// ==========================================

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

// ==========================================
// Machine - 设备（已关联型号/品牌/分类/当前工作面）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    pub id: i64,
    pub organization_id: i64,
    pub inventory_number: String,

    // ===== 资产信息 =====
    pub price: Option<f64>,               // 购置价，历史数据可能为空
    pub date_entry: Option<NaiveDate>,    // 投产日期，历史数据可能为空
    pub year_decommission: Option<i32>,   // 报废年份

    // ===== 型号/品牌/分类 =====
    pub machine_type_id: i64,
    pub machine_type_name: String,
    pub mark_id: i64,
    pub mark_name: String,
    pub machine_class_id: i64,
    pub machine_class_name: String,
    pub machine_class_parent_id: Option<i64>,

    // ===== 当前工作面 =====
    pub current_zone: Option<String>, // 最近一次换面记录的 zone_working
}

impl Machine {
    /// 设备显示标签: "{品牌}-{型号}-{库存号}"
    pub fn label(&self) -> String {
        format!(
            "{}-{}-{}",
            self.mark_name, self.machine_type_name, self.inventory_number
        )
    }

    /// 投产年份
    pub fn commissioning_year(&self) -> Option<i32> {
        self.date_entry.map(|d| d.year())
    }

    /// 购置价（空值按 0 计）
    pub fn price_or_zero(&self) -> f64 {
        match self.price {
            Some(p) if p.is_finite() => p,
            _ => 0.0,
        }
    }
}

// ==========================================
// MachineFace - 设备与工作面关联
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineFace {
    pub machine_id: i64,
    pub face_id: i64,
    pub face_name: String,
    pub zone_working: Option<String>,
    pub date_change: NaiveDate,
    pub machine_performance: Option<f64>,
    pub fuel_consumption: Option<f64>,
    pub average_speed: Option<f64>,
}

// ==========================================
// MachineSelection - 设备选择条件
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineSelection {
    pub organization_id: i64,
    #[serde(default)]
    pub machine_class_ids: Vec<i64>,
    #[serde(default)]
    pub machine_mark_ids: Vec<i64>,
    #[serde(default)]
    pub machine_type_ids: Vec<i64>,
    #[serde(default)]
    pub machine_ids: Vec<i64>,
}

/// 生效的筛选条件（仅一个）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionCriterion {
    Machines(Vec<i64>),
    Types(Vec<i64>),
    Marks(Vec<i64>),
    Classes(Vec<i64>),
}

impl MachineSelection {
    /// 按优先级选出生效条件: 设备 > 型号 > 品牌 > 分类
    ///
    /// # 返回
    /// - Some: 最高优先级的非空条件
    /// - None: 未提供任何条件（调用方应视为无匹配设备）
    pub fn criterion(&self) -> Option<SelectionCriterion> {
        if !self.machine_ids.is_empty() {
            Some(SelectionCriterion::Machines(self.machine_ids.clone()))
        } else if !self.machine_type_ids.is_empty() {
            Some(SelectionCriterion::Types(self.machine_type_ids.clone()))
        } else if !self.machine_mark_ids.is_empty() {
            Some(SelectionCriterion::Marks(self.machine_mark_ids.clone()))
        } else if !self.machine_class_ids.is_empty() {
            Some(SelectionCriterion::Classes(self.machine_class_ids.clone()))
        } else {
            None
        }
    }

    /// 是否按分类分组（未指定设备且指定了分类）
    pub fn groups_by_class(&self) -> bool {
        self.machine_ids.is_empty() && !self.machine_class_ids.is_empty()
    }
}

// ==========================================
// MachineClass - 设备分类
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineClass {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone)]
struct ClassNode {
    class: MachineClass,
    parent: Option<usize>,
    children: Vec<usize>,
}

// ==========================================
// MachineClassTree - 分类树（节点数组 + 父/子索引）
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct MachineClassTree {
    nodes: Vec<ClassNode>,
    index: HashMap<i64, usize>,
}

impl MachineClassTree {
    /// 由分类列表构建；父节点缺失的分类视为根
    pub fn from_classes(classes: Vec<MachineClass>) -> Self {
        let mut nodes: Vec<ClassNode> = Vec::with_capacity(classes.len());
        let mut index = HashMap::with_capacity(classes.len());

        for class in classes {
            if index.contains_key(&class.id) {
                continue;
            }
            index.insert(class.id, nodes.len());
            nodes.push(ClassNode {
                class,
                parent: None,
                children: Vec::new(),
            });
        }

        for i in 0..nodes.len() {
            let parent = nodes[i]
                .class
                .parent_id
                .and_then(|pid| index.get(&pid).copied())
                .filter(|&p| p != i);
            if let Some(p) = parent {
                nodes[i].parent = Some(p);
                nodes[p].children.push(i);
            }
        }

        Self { nodes, index }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&MachineClass> {
        self.index.get(&id).map(|&i| &self.nodes[i].class)
    }

    /// 分类自身及全部后代的 ID；未知分类返回空
    pub fn descendants_of(&self, id: i64) -> Vec<i64> {
        let Some(&root) = self.index.get(&id) else {
            return Vec::new();
        };

        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![root];
        let mut result = Vec::new();
        while let Some(i) = stack.pop() {
            if visited[i] {
                continue;
            }
            visited[i] = true;
            result.push(self.nodes[i].class.id);
            stack.extend(self.nodes[i].children.iter().copied());
        }
        result
    }

    /// 展开一组分类为其自身及全部后代
    pub fn expand(&self, ids: &[i64]) -> BTreeSet<i64> {
        ids.iter()
            .flat_map(|&id| self.descendants_of(id))
            .collect()
    }

    /// class_id 是否位于 ancestor_id 的子树内（含自身）
    pub fn is_within(&self, class_id: i64, ancestor_id: i64) -> bool {
        let Some(&start) = self.index.get(&class_id) else {
            return false;
        };
        let mut current = Some(start);
        // 步数上限防止脏数据成环
        for _ in 0..=self.nodes.len() {
            match current {
                Some(i) if self.nodes[i].class.id == ancestor_id => return true,
                Some(i) => current = self.nodes[i].parent,
                None => return false,
            }
        }
        false
    }
}
