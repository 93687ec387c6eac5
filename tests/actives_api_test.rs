// ==========================================
// ActivesApi 集成测试
// ==========================================
// 测试范围:
// 1. 每年投运数量、作业区分布
// 2. 主/辅设备累计数量
// 3. 平均机龄（月份折算 / 整年）
// ==========================================

mod helpers;

use helpers::api_test_helper::*;
use mining_fleet_tep::api::AnalyticsRequest;
use mining_fleet_tep::config::config_keys;

/// 全部设备（根分类）
fn fleet_request(start: &str, end: &str) -> AnalyticsRequest {
    let mut req = request(start, end, "year");
    req.machine_class_ids = Some(vec![1]);
    req
}

#[tokio::test]
async fn test_machine_count_by_year() {
    let env = ApiTestEnv::with_standard_fleet().expect("无法创建测试环境");
    let result = env
        .state
        .actives_api
        .machine_count_by_year(&fleet_request("2020-01-01", "2023-12-31"))
        .await
        .expect("查询失败");

    let counts: Vec<(i32, u32)> = result.iter().map(|c| (c.year, c.count)).collect();
    assert_eq!(counts, vec![(2020, 1), (2021, 1), (2022, 1), (2023, 0)]);
}

#[tokio::test]
async fn test_work_distribution() {
    let env = ApiTestEnv::with_standard_fleet().expect("无法创建测试环境");
    let result = env
        .state
        .actives_api
        .work_distribution(&fleet_request("2023-01-01", "2023-12-31"))
        .await
        .unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(
        json,
        serde_json::json!([
            {"workType": "Добычные работы", "count": 1},
            {"workType": "Вскрышные работы", "count": 1},
            {"workType": "Дополнительные работы", "count": 1}
        ])
    );
}

#[tokio::test]
async fn test_cumulative_machine_count() {
    let env = ApiTestEnv::with_standard_fleet().expect("无法创建测试环境");
    let result = env
        .state
        .actives_api
        .cumulative_machine_count(&fleet_request("2020-01-01", "2023-12-31"))
        .await
        .unwrap();

    let rows: Vec<(i32, u32, u32, u32)> = result
        .iter()
        .map(|r| (r.year, r.main, r.auxiliary, r.sum))
        .collect();
    assert_eq!(
        rows,
        vec![(2020, 0, 1, 1), (2021, 1, 1, 2), (2022, 2, 1, 3), (2023, 2, 1, 3)]
    );
}

#[tokio::test]
async fn test_average_machine_age_counts_entry_month() {
    let env = ApiTestEnv::with_standard_fleet().expect("无法创建测试环境");
    let result = env
        .state
        .actives_api
        .average_machine_age(&fleet_request("2022-01-01", "2022-12-31"))
        .await
        .unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].year, 2022);
    // 设备 1: 2021-03 → 10/12 + 1；设备 2: 2022-01 → 12/12 + 0
    assert_close(result[0].main, (10.0 / 12.0 + 1.0 + 1.0) / 2.0);
    // 设备 3: 2020-07 → 6/12 + 2
    assert_close(result[0].auxiliary, 2.5);
}

#[tokio::test]
async fn test_count_and_average_age_uses_last_year() {
    let env = ApiTestEnv::with_standard_fleet().expect("无法创建测试环境");
    // 已于 2021 报废的主要设备不计入 2023
    MachineBuilder::new(4, 21)
        .date_entry("2019-01-01")
        .decommissioned(2021)
        .insert(&env.conn)
        .unwrap();

    let result = env
        .state
        .actives_api
        .machine_count_and_average_age(&fleet_request("2020-01-01", "2023-12-31"))
        .await
        .unwrap();

    assert_eq!(result.main_count, 2);
    assert_eq!(result.auxiliary_count, 1);
    assert_close(result.main_avg_age, 1.5);
    assert_close(result.auxiliary_avg_age, 3.0);
}

#[tokio::test]
async fn test_main_class_from_config() {
    let env = ApiTestEnv::with_standard_fleet().expect("无法创建测试环境");
    // 仅挖掘机算主要设备
    insert_config(&env.conn, config_keys::MAIN_CLASS_ID, "4").unwrap();
    MachineBuilder::new(4, 21)
        .date_entry("2022-06-01")
        .insert(&env.conn)
        .unwrap();

    let result = env
        .state
        .actives_api
        .cumulative_machine_count(&fleet_request("2022-01-01", "2022-12-31"))
        .await
        .unwrap();

    assert_eq!(result.len(), 1);
    // 2022 投运: 设备 2（挖掘机）计入主要，设备 4（自卸车）两者都不是
    assert_eq!(result[0].main, 1);
    assert_eq!(result[0].auxiliary, 0);
}
