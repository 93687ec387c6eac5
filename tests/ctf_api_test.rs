// ==========================================
// CtfApi 集成测试
// ==========================================
// 测试范围:
// 1. 五要素整段结构（按结束年份年化）
// 2. 逐年结构（缺失年份补零）
// 3. 按服役年限的平均工作时间
// ==========================================

mod helpers;

use helpers::api_test_helper::*;
use mining_fleet_tep::config::config_keys;

#[tokio::test]
async fn test_ctf_structure_annualized() {
    let env = ApiTestEnv::with_standard_fleet().expect("无法创建测试环境");
    insert_ctf(&env.conn, 1, "2023-01-01", 300.0, 100.0, 400.0).unwrap();

    let mut req = request("2023-01-01", "2023-12-31", "year");
    req.machine_ids = Some(vec![1]);
    let result = env.state.ctf_api.ctf_structure(&req).await.expect("查询失败");

    assert_close(result.fact.total(), 8760.0);
    assert_close(result.fact.work_time, 6570.0);
    assert_close(result.fact.planned_repair, 2190.0);
    assert_close(result.calculated.work_time, 8760.0);
}

#[tokio::test]
async fn test_ctf_yearly_fills_missing_years() {
    let env = ApiTestEnv::with_standard_fleet().expect("无法创建测试环境");
    insert_ctf(&env.conn, 1, "2022-05-01", 10.0, 0.0, 0.0).unwrap();
    insert_ctf(&env.conn, 1, "2024-05-01", 10.0, 10.0, 0.0).unwrap();

    let mut req = request("2022-01-01", "2024-12-31", "year");
    req.machine_ids = Some(vec![1]);
    let result = env.state.ctf_api.ctf_yearly(&req).await.unwrap();

    let years: Vec<i32> = result.iter().map(|y| y.year).collect();
    assert_eq!(years, vec![2022, 2023, 2024]);
    assert_eq!(result[0].fact.label, "Факт");
    assert_eq!(result[0].calculated.label, "План");
    assert_close(result[0].fact.components.work_time, 8760.0);
    assert_close(result[1].fact.components.total(), 0.0);
    // 2024 闰年
    assert_close(result[2].fact.components.work_time, 4392.0);
    assert_close(result[2].calculated.components.total(), 0.0);
}

#[tokio::test]
async fn test_worktime_by_service_life_scenario() {
    let env = ApiTestEnv::with_standard_fleet().expect("无法创建测试环境");
    // 设备 3 于 2020 投运
    insert_ctf(&env.conn, 3, "2021-05-01", 100.0, 0.0, 0.0).unwrap();
    insert_ctf(&env.conn, 3, "2022-05-01", 200.0, 0.0, 0.0).unwrap();

    let mut req = request("2020-01-01", "2023-12-31", "year");
    req.machine_ids = Some(vec![3]);
    let result = env
        .state
        .ctf_api
        .ctf_worktime_by_service_life(&req)
        .await
        .unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(result[0].service_life, 1);
    assert_close(result[0].average_work_time, 100.0);
    assert_close(result[0].average_work_time_with_margin, 115.0);
    assert_eq!(result[1].service_life, 2);
    assert_close(result[1].average_work_time, 200.0);
    assert_close(result[1].average_work_time_with_margin, 230.0);
}

#[tokio::test]
async fn test_service_life_margin_from_config() {
    let env = ApiTestEnv::with_standard_fleet().expect("无法创建测试环境");
    insert_config(&env.conn, config_keys::SERVICE_LIFE_MARGIN, "2.0").unwrap();
    insert_ctf(&env.conn, 3, "2021-05-01", 100.0, 0.0, 0.0).unwrap();

    let mut req = request("2021-01-01", "2021-12-31", "year");
    req.machine_ids = Some(vec![3]);
    let result = env
        .state
        .ctf_api
        .ctf_worktime_by_service_life(&req)
        .await
        .unwrap();

    assert_eq!(result.len(), 1);
    assert_close(result[0].average_work_time_with_margin, 200.0);
}

#[tokio::test]
async fn test_ctf_not_found_for_unknown_machine() {
    let env = ApiTestEnv::with_standard_fleet().expect("无法创建测试环境");
    let mut req = request("2023-01-01", "2023-12-31", "year");
    req.machine_ids = Some(vec![404]);
    let err = env.state.ctf_api.ctf_structure(&req).await.unwrap_err();
    assert!(err.is_not_found());
}
