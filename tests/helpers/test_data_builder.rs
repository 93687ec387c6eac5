// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use rusqlite::{params, Connection};
use std::error::Error;

// ==========================================
// Machine 构建器
// ==========================================

pub struct MachineBuilder {
    id: i64,
    organization_id: i64,
    machine_type_id: i64,
    inventory_number: String,
    price: Option<f64>,
    date_entry: Option<String>,
    year_decommission: Option<i32>,
}

impl MachineBuilder {
    pub fn new(id: i64, machine_type_id: i64) -> Self {
        Self {
            id,
            organization_id: 1,
            machine_type_id,
            inventory_number: format!("INV-{}", id),
            price: None,
            date_entry: None,
            year_decommission: None,
        }
    }

    pub fn organization(mut self, organization_id: i64) -> Self {
        self.organization_id = organization_id;
        self
    }

    pub fn price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn date_entry(mut self, date: &str) -> Self {
        self.date_entry = Some(date.to_string());
        self
    }

    pub fn decommissioned(mut self, year: i32) -> Self {
        self.year_decommission = Some(year);
        self
    }

    pub fn insert(self, conn: &Connection) -> Result<i64, Box<dyn Error>> {
        conn.execute(
            "INSERT INTO machine (id, organization_id, machine_type_id, inventory_number, price, date_entry, year_decommission)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                self.id,
                self.organization_id,
                self.machine_type_id,
                self.inventory_number,
                self.price,
                self.date_entry,
                self.year_decommission
            ],
        )?;
        Ok(self.id)
    }
}
