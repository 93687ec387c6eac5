// ==========================================
// 矿山设备车队决策支持系统 - 数据库工具模块
// ==========================================
// 职责: IN 子句构建、日期列解析等公共函数
// ==========================================

use chrono::NaiveDate;

/// 日期列存储格式
pub const DB_DATE_FORMAT: &str = "%Y-%m-%d";

/// 构建 IN 子句的 SQL 片段
///
/// # 参数
/// - `column_name`: IN 子句应用的列名
/// - `count`: 占位符个数
///
/// # 返回
/// - 例如: "m.id IN (?, ?, ?)"；个数为 0 时返回永假条件 "1 = 0"
///
/// # 示例
/// ```
/// use mining_fleet_tep::repository::db_utils::build_in_clause;
///
/// assert_eq!(build_in_clause("m.id", 2), "m.id IN (?, ?)");
/// assert_eq!(build_in_clause("m.id", 0), "1 = 0");
/// ```
pub fn build_in_clause(column_name: &str, count: usize) -> String {
    if count == 0 {
        return "1 = 0".to_string();
    }

    let placeholders = vec!["?"; count].join(", ");
    format!("{} IN ({})", column_name, placeholders)
}

/// 解析日期列
///
/// 兼容 "YYYY-MM-DD" 与带时间部分的文本（按整日截断），无法解析返回 None
pub fn parse_db_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let day_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day_part, DB_DATE_FORMAT).ok()
}

/// 日期转存储文本
pub fn format_db_date(date: NaiveDate) -> String {
    date.format(DB_DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_db_date() {
        let expected = NaiveDate::from_ymd_opt(2023, 6, 15);
        assert_eq!(parse_db_date("2023-06-15"), expected);
        assert_eq!(parse_db_date("2023-06-15T08:30:00Z"), expected);
        assert_eq!(parse_db_date("2023-06-15 08:30:00"), expected);
        assert_eq!(parse_db_date("15.06.2023"), None);
        assert_eq!(parse_db_date(""), None);
    }

    #[test]
    fn test_format_db_date() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(format_db_date(date), "2024-02-29");
    }
}
