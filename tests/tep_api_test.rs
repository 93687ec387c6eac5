// ==========================================
// TepApi 集成测试
// ==========================================
// 测试范围:
// 1. 采剥量: 作业区归类、补齐、剥采比
// 2. 车队产量: 按设备 / 按分类分组
// 3. 单位成本动态与实际/目标对比
// 4. 拥有成本结构、累计单位成本、行业对比
// 5. 无匹配设备拦截
// ==========================================

mod helpers;

use helpers::api_test_helper::*;
use mining_fleet_tep::api::{ApiError, IndustryComparisonEntry, NO_DATA_FOR_FILTER};
use mining_fleet_tep::engine::ownership::{SPECIFIC_COST_LABEL, TOTAL_OWNERSHIP_LABEL};

// ==========================================
// 采剥量
// ==========================================

#[tokio::test]
async fn test_volumes_yearly_scenario() {
    let env = ApiTestEnv::with_standard_fleet().expect("无法创建测试环境");
    insert_productivity(&env.conn, 1, "2023-06-01", 100.0, false).unwrap();
    insert_productivity(&env.conn, 2, "2023-06-01", 50.0, false).unwrap();
    // 目标值与辅助作业设备不计入
    insert_productivity(&env.conn, 1, "2023-06-01", 999.0, true).unwrap();
    insert_productivity(&env.conn, 3, "2023-06-01", 777.0, false).unwrap();

    let mut req = request("2023-01-01", "2023-12-31", "year");
    req.machine_ids = Some(vec![1, 2, 3]);
    let result = env.state.tep_api.volumes(&req).await.expect("查询失败");

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].period.year, 2023);
    assert_eq!(result[0].combined_date, "2023");
    assert_close(result[0].extraction, 100.0);
    assert_close(result[0].overburden, 50.0);
    assert_close(result[0].coefficient, 0.5);
}

#[tokio::test]
async fn test_volumes_monthly_gap_filled() {
    let env = ApiTestEnv::with_standard_fleet().expect("无法创建测试环境");
    insert_productivity(&env.conn, 2, "2023-02-01", 40.0, false).unwrap();

    let mut req = request("2023-01-01", "2023-12-31", "month");
    req.machine_ids = Some(vec![1, 2]);
    let result = env.state.tep_api.volumes(&req).await.unwrap();

    assert_eq!(result.len(), 12);
    let labels: Vec<&str> = result.iter().map(|p| p.combined_date.as_str()).collect();
    assert_eq!(labels[0], "2023-01");
    assert_eq!(labels[11], "2023-12");

    // 无采矿量时剥采比为 0 而非 NaN
    assert_close(result[1].overburden, 40.0);
    assert_close(result[1].coefficient, 0.0);
    assert!(result.iter().all(|p| p.coefficient.is_finite()));
}

// ==========================================
// 车队产量
// ==========================================

#[tokio::test]
async fn test_park_productivity_by_machine_and_by_class() {
    let env = ApiTestEnv::with_standard_fleet().expect("无法创建测试环境");
    insert_productivity(&env.conn, 1, "2023-01-15", 10.0, false).unwrap();
    insert_productivity(&env.conn, 2, "2023-04-01", 20.0, false).unwrap();

    let mut req = request("2023-01-01", "2023-06-30", "quarter");
    req.machine_ids = Some(vec![2, 1]);
    let by_machine = env.state.tep_api.park_productivity(&req).await.unwrap();
    assert_eq!(by_machine.len(), 2);
    assert_eq!(by_machine[0].machine_id, Some(1));
    assert_eq!(by_machine[0].mark_name.as_deref(), Some("ЭКГ-ЭКГ-10-INV-1"));
    assert_eq!(by_machine[0].data.len(), 2);
    assert_close(by_machine[0].data[0].productivity, 10.0);
    assert_close(by_machine[0].data[1].productivity, 0.0);
    assert_close(by_machine[1].data[1].productivity, 20.0);

    let mut req = request("2023-01-01", "2023-06-30", "quarter");
    req.machine_class_ids = Some(vec![2]);
    let by_class = env.state.tep_api.park_productivity(&req).await.unwrap();
    assert_eq!(by_class.len(), 1);
    assert_eq!(by_class[0].machine_class_id, Some(4));
    assert_eq!(by_class[0].machine_class_name.as_deref(), Some("Экскаватор"));
    assert_eq!(by_class[0].data[0].combined_date, "2023-Q1");
    assert_close(by_class[0].data[0].productivity, 10.0);
    assert_close(by_class[0].data[1].productivity, 20.0);
}

// ==========================================
// 单位成本
// ==========================================

#[tokio::test]
async fn test_unit_costs_with_total_series() {
    let env = ApiTestEnv::with_standard_fleet().expect("无法创建测试环境");
    insert_cost(&env.conn, 1, 1, "2023-01-01", 100.0, false).unwrap();
    insert_cost(&env.conn, 1, 4, "2023-01-01", 50.0, false).unwrap();
    insert_cost(&env.conn, 1, 1, "2023-01-01", 70.0, true).unwrap();
    insert_productivity(&env.conn, 1, "2023-01-01", 10.0, false).unwrap();

    let mut req = request("2023-01-01", "2023-02-28", "month");
    req.machine_ids = Some(vec![1]);
    let result = env.state.tep_api.unit_costs(&req).await.unwrap();

    assert_eq!(result.len(), 3);
    assert_eq!(result[0].kind_id, Some(1));
    assert_eq!(result[0].kind_name, "ТО");
    assert_eq!(result[0].data.len(), 2);
    assert_close(result[0].data[0].total_cost, 100.0);
    assert_close(result[0].data[0].cost_to_productivity_ratio, 10.0);
    // 无产量期间比值为 0
    assert_close(result[0].data[1].cost_to_productivity_ratio, 0.0);

    let total = &result[2];
    assert_eq!(total.kind_id, None);
    assert_eq!(total.kind_name, "Total");
    assert_close(total.data[0].total_cost, 150.0);
    assert_close(total.data[0].cost_to_productivity_ratio, 15.0);
    assert_close(total.data[0].total_productivity, 10.0);
}

#[tokio::test]
async fn test_cost_comparison_scenario() {
    let env = ApiTestEnv::with_standard_fleet().expect("无法创建测试环境");
    insert_cost(&env.conn, 1, 1, "2023-03-01", 100.0, false).unwrap();
    insert_cost(&env.conn, 1, 1, "2023-03-01", 80.0, true).unwrap();

    let mut req = request("2023-01-01", "2023-12-31", "month");
    req.machine_ids = Some(vec![1]);
    let result = env.state.tep_api.cost_comparison(&req).await.unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(
        json,
        serde_json::json!([
            {"type": "Факт", "costs": [{"kindId": 1, "kindName": "ТО", "totalCost": 100.0}]},
            {"type": "Цель", "costs": [{"kindId": 1, "kindName": "ТО", "totalCost": 80.0}]}
        ])
    );
}

// ==========================================
// 拥有成本结构
// ==========================================

#[tokio::test]
async fn test_ownership_structure() {
    let env = ApiTestEnv::with_standard_fleet().expect("无法创建测试环境");
    insert_cost(&env.conn, 1, 1, "2023-01-01", 300.0, false).unwrap();
    insert_cost(&env.conn, 1, 4, "2023-02-01", 100.0, false).unwrap();
    insert_productivity(&env.conn, 1, "2023-01-01", 60.0, false).unwrap();
    insert_productivity(&env.conn, 1, "2023-02-01", 40.0, false).unwrap();

    let mut req = request("2023-01-01", "2023-12-31", "year");
    req.machine_ids = Some(vec![1]);
    let result = env.state.tep_api.ownership_structure(&req).await.unwrap();

    assert_eq!(result.len(), 1);
    let data = &result[0].data;
    assert_eq!(data.len(), 6);
    assert_eq!(data[0].category, SPECIFIC_COST_LABEL);
    assert_close(data[0].value, 10.0); // 1000 / 100
    assert_close(data[1].value, 3.0); // ТО 300 / 100
    assert_close(data[4].value, 1.0); // ГСМ 100 / 100
    assert_eq!(data[5].category, TOTAL_OWNERSHIP_LABEL);
    assert_close(data[5].value, 14.0);
}

// ==========================================
// 累计单位成本
// ==========================================

#[tokio::test]
async fn test_accumulated_costs_injects_purchase_price() {
    let env = ApiTestEnv::with_standard_fleet().expect("无法创建测试环境");
    insert_cost(&env.conn, 1, 1, "2022-01-01", 100.0, false).unwrap();
    insert_cost(&env.conn, 1, 1, "2023-01-01", 100.0, false).unwrap();
    insert_productivity(&env.conn, 1, "2022-01-01", 50.0, false).unwrap();
    insert_productivity(&env.conn, 1, "2023-01-01", 50.0, false).unwrap();

    let mut req = request("2020-01-01", "2023-12-31", "year");
    req.machine_ids = Some(vec![1]);
    let result = env.state.tep_api.accumulated_costs(&req).await.unwrap();

    assert_eq!(result.len(), 1);
    let series = &result[0];
    assert_eq!(series.machine_id, 1);
    let labels: Vec<&str> = series.data.iter().map(|p| p.combined_date.as_str()).collect();
    // 2021 投运期间: 1000 / 100；2020 首部零值被裁剪
    assert_eq!(labels, vec!["2021", "2022", "2023"]);
    assert_close(series.data[0].cost_to_productivity_ratio, 10.0);
    assert_close(series.data[1].cost_to_productivity_ratio, 2.0);
    assert_close(series.data[2].cost_to_productivity_ratio, 2.0);
    assert_close(series.data[2].productivity, 50.0);
}

#[tokio::test]
async fn test_accumulated_costs_vs_industry_appends_mark_series() {
    let env = ApiTestEnv::with_standard_fleet().expect("无法创建测试环境");
    for machine_id in [1, 2] {
        insert_cost(&env.conn, machine_id, 1, "2023-01-01", 100.0, false).unwrap();
        insert_productivity(&env.conn, machine_id, "2023-01-01", 100.0, false).unwrap();
    }

    let mut req = request("2023-01-01", "2023-12-31", "year");
    req.machine_ids = Some(vec![1]);
    let result = env
        .state
        .tep_api
        .accumulated_costs_vs_industry(&req)
        .await
        .unwrap();

    assert_eq!(result.len(), 2);
    match &result[0] {
        IndustryComparisonEntry::Machine(series) => {
            assert_eq!(series.machine_id, 1);
            // 投运期间早于范围时插入在序列最前
            let labels: Vec<&str> = series.data.iter().map(|p| p.combined_date.as_str()).collect();
            assert_eq!(labels, vec!["2021", "2023"]);
        }
        other => panic!("expected machine series, got {:?}", other),
    }
    match &result[1] {
        IndustryComparisonEntry::Mark(mark) => {
            assert_eq!(mark.mark_id, 10);
            assert_eq!(mark.mark_name, "ЭКГ");
            // 组织 1 的 ЭКГ 队列为设备 1、2（组织 2 的设备 9 不计入）
            // 设备 1: [2021: 1000/100, 2023: 1]；设备 2: [2022: 2000/100, 2023: 1]
            let labels: Vec<&str> = mark.data.iter().map(|p| p.data_operation.as_str()).collect();
            assert_eq!(labels, vec!["1", "2"]);
            assert_close(mark.data[0].cost_to_productivity_ratio, (10.0 + 20.0) / 2.0);
            assert_close(mark.data[1].cost_to_productivity_ratio, (1.0 + 1.0) / 2.0);
        }
        other => panic!("expected mark series, got {:?}", other),
    }
}

// ==========================================
// 无匹配设备
// ==========================================

#[tokio::test]
async fn test_empty_filter_is_not_found() {
    let env = ApiTestEnv::with_standard_fleet().expect("无法创建测试环境");

    let req = request("2023-01-01", "2023-12-31", "year");
    let err = env.state.tep_api.volumes(&req).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), NO_DATA_FOR_FILTER);

    // 其他组织的设备
    let mut req = request("2023-01-01", "2023-12-31", "year");
    req.machine_ids = Some(vec![9]);
    assert!(matches!(
        env.state.tep_api.unit_costs(&req).await,
        Err(ApiError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_empty_filter_stops_before_fact_fetch() {
    let env = ApiTestEnv::with_standard_fleet().expect("无法创建测试环境");
    let (tep_api, ctf_api, facts) = env.apis_with_counting_facts().unwrap();

    let req = request("2023-01-01", "2023-12-31", "year");
    let err = tep_api.volumes(&req).await.unwrap_err();
    assert_eq!(err.to_string(), NO_DATA_FOR_FILTER);

    let mut other_org = request("2023-01-01", "2023-12-31", "year");
    other_org.machine_ids = Some(vec![9]);
    let err = tep_api.unit_costs(&other_org).await.unwrap_err();
    assert_eq!(err.to_string(), NO_DATA_FOR_FILTER);
    assert!(ctf_api.ctf_structure(&other_org).await.unwrap_err().is_not_found());

    assert_eq!(facts.calls(), 0);

    // 有设备时才查询事实
    let mut matched = request("2023-01-01", "2023-12-31", "year");
    matched.machine_ids = Some(vec![1]);
    tep_api.unit_costs(&matched).await.unwrap();
    assert!(facts.calls() > 0);
}

#[tokio::test]
async fn test_invalid_breakdown_is_rejected() {
    let env = ApiTestEnv::with_standard_fleet().expect("无法创建测试环境");
    let mut req = request("2023-01-01", "2023-12-31", "week");
    req.machine_ids = Some(vec![1]);
    assert!(matches!(
        env.state.tep_api.volumes(&req).await,
        Err(ApiError::InvalidInput(_))
    ));
}
