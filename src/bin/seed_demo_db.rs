// ==========================================
// 矿山设备车队决策支持系统 - 演示库重置与灌数
// ==========================================
// 用法: seed_demo_db [db_path] [years]
// 行为: 备份并删除旧库 → 建表 → 写入分类/品牌/设备/工作面/事实数据
// ==========================================

use chrono::{Datelike, Local, NaiveDate};
use rusqlite::{params, Connection};
use std::error::Error;
use std::fs;
use std::path::Path;

use mining_fleet_tep::app::get_default_db_path;
use mining_fleet_tep::config::config_keys;
use mining_fleet_tep::db::{init_schema, open_sqlite_connection};

const ORGANIZATION_ID: i64 = 1;
const DEFAULT_YEARS: i32 = 3;

/// 演示设备: (id, 型号, 库存号, 购置价, 投产日期, 报废年份, 工作面)
const DEMO_MACHINES: [(i64, i64, &str, f64, &str, Option<i32>, i64); 6] = [
    (1, 20, "ЭКГ-001", 120_000_000.0, "2018-03-15", None, 1),
    (2, 20, "ЭКГ-002", 118_000_000.0, "2019-07-01", None, 2),
    (3, 21, "CAT-101", 95_000_000.0, "2020-01-20", None, 1),
    (4, 21, "CAT-102", 97_000_000.0, "2021-05-10", None, 2),
    (5, 22, "D9-201", 40_000_000.0, "2017-09-01", None, 3),
    (6, 22, "D9-202", 42_000_000.0, "2016-04-01", Some(2023), 3),
];

fn main() -> Result<(), Box<dyn Error>> {
    mining_fleet_tep::logging::init();

    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);
    let years = std::env::args()
        .nth(2)
        .and_then(|s| s.parse::<i32>().ok())
        .unwrap_or(DEFAULT_YEARS)
        .clamp(1, 10);

    backup_and_reset_db(&db_path)?;

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    seed_demo_fleet(&conn, years)?;
    print_quick_counts(&conn)?;

    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

fn seed_demo_fleet(conn: &Connection, years: i32) -> Result<(), Box<dyn Error>> {
    let last_year = Local::now().date_naive().year() - 1;
    let first_year = last_year - years + 1;

    let tx = conn.unchecked_transaction()?;

    // 全局配置
    tx.execute(
        "INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key) VALUES ('global','GLOBAL','GLOBAL')",
        [],
    )?;
    for (key, value) in [
        (config_keys::SERVICE_LIFE_MARGIN, "1.15"),
        (config_keys::EXTRACTION_ZONE_LABEL, "Добыча"),
        (config_keys::STRIPPING_ZONE_LABEL, "Вскрыша"),
        (config_keys::DEFAULT_BREAKDOWN, "month"),
        (config_keys::MAIN_CLASS_ID, "2"),
        (config_keys::AUXILIARY_CLASS_ID, "3"),
    ] {
        tx.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)",
            params![key, value],
        )?;
    }

    // 分类树 / 品牌 / 型号
    tx.execute_batch(
        r#"
        INSERT INTO machine_class (id, name, parent_id) VALUES
            (1, 'Все', NULL),
            (2, 'Основное', 1), (3, 'Вспомогательное', 1),
            (4, 'Экскаватор', 2), (5, 'Самосвал', 2), (7, 'Бульдозер', 3);
        INSERT INTO machine_mark (id, name) VALUES (10, 'ЭКГ'), (11, 'CAT'), (12, 'Komatsu');
        INSERT INTO machine_type (id, name, mark_id, machine_class_id) VALUES
            (20, 'ЭКГ-10', 10, 4), (21, '793F', 11, 5), (22, 'D375A', 12, 7);
        INSERT INTO face (id, organization_id, name, zone_working) VALUES
            (1, 1, 'Забой 1', 'Добыча'), (2, 1, 'Забой 2', 'Вскрыша'), (3, 1, 'Отвал', 'Отвалообразование');
        INSERT INTO costs_kind (id, name, is_model, category) VALUES
            (1, 'ТО и ремонт', 0, 'MAINTENANCE_REPAIR'),
            (2, 'Прочие', 0, 'OTHER'),
            (3, 'ФОТ и налоги', 0, 'LABOR_TAXES'),
            (4, 'ГСМ', 0, 'FUEL');
        "#,
    )?;

    for (id, type_id, inventory, price, date_entry, decommission, face_id) in DEMO_MACHINES {
        tx.execute(
            "INSERT INTO machine (id, organization_id, machine_type_id, inventory_number, price, date_entry, year_decommission)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![id, ORGANIZATION_ID, type_id, inventory, price, date_entry, decommission],
        )?;
        tx.execute(
            "INSERT INTO machine2face (machine_id, face_id, date_change, machine_performance) VALUES (?1, ?2, ?3, ?4)",
            params![id, face_id, date_entry, 1000.0 + id as f64 * 50.0],
        )?;
    }

    // 月度事实: 成本（实际 + 目标）、工时产量、КТГ
    let mut cost_rows = 0;
    for year in first_year..=last_year {
        for month in 1..=12u32 {
            let Some(period) = NaiveDate::from_ymd_opt(year, month, 1) else {
                continue;
            };
            let period_str = period.format("%Y-%m-%d").to_string();
            for (id, _, _, _, _, decommission, _) in DEMO_MACHINES {
                if decommission.is_some_and(|y| year > y) {
                    continue;
                }
                let wave = 1.0 + ((month as f64) / 12.0 * std::f64::consts::TAU).sin() * 0.1;
                let base = 100_000.0 * id as f64 * wave;

                for (kind_id, share) in [(1_i64, 0.4), (2, 0.1), (3, 0.3), (4, 0.2)] {
                    tx.execute(
                        "INSERT INTO cost (machine_id, kind_id, date_period, value, is_model) VALUES (?1, ?2, ?3, ?4, 0)",
                        params![id, kind_id, period_str, base * share],
                    )?;
                    tx.execute(
                        "INSERT INTO cost (machine_id, kind_id, date_period, value, is_model) VALUES (?1, ?2, ?3, ?4, 1)",
                        params![id, kind_id, period_str, base * share * 0.9],
                    )?;
                    cost_rows += 2;
                }

                let work_time = 500.0 + 20.0 * id as f64;
                tx.execute(
                    "INSERT INTO work_time_productivity (machine_id, date_period, work_time, productivity, is_model) VALUES (?1, ?2, ?3, ?4, 0)",
                    params![id, period_str, work_time, work_time * 35.0 * wave],
                )?;
                tx.execute(
                    "INSERT INTO work_time_productivity (machine_id, date_period, work_time, productivity, is_model) VALUES (?1, ?2, ?3, ?4, 1)",
                    params![id, period_str, work_time, work_time * 38.0],
                )?;

                tx.execute(
                    r#"INSERT INTO ctf_record (
                        machine_id, date_period,
                        worktime_f, worktime_c, planned_oatd_f, planned_oatd_c,
                        unplanned_oatd_f, unplanned_oatd_c, tm_f, tm_c, tr_f, tr_c,
                        mr_f, mr_c, unplanned_repair_f, unplanned_repair_c
                    ) VALUES (?1, ?2, ?3, ?4, 60, 50, 30, 20, 12, 10, 24, 20, 8, 6, 16, 10)"#,
                    params![id, period_str, work_time, work_time + 20.0],
                )?;
            }
        }
    }

    tx.commit()?;
    eprintln!(
        "Seeded organization {} with {} machines, years {}..={}, {} cost rows",
        ORGANIZATION_ID,
        DEMO_MACHINES.len(),
        first_year,
        last_year,
        cost_rows
    );
    Ok(())
}

fn print_quick_counts(conn: &Connection) -> Result<(), Box<dyn Error>> {
    let tables = [
        "config_kv",
        "machine_class",
        "machine_mark",
        "machine_type",
        "machine",
        "face",
        "machine2face",
        "costs_kind",
        "cost",
        "work_time_productivity",
        "ctf_record",
    ];

    eprintln!("Row counts:");
    for t in tables {
        let sql = format!("SELECT COUNT(*) FROM {}", t);
        let c: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        eprintln!("  {:<28} {}", t, c);
    }
    Ok(())
}
