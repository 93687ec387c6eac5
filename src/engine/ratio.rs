// ==========================================
// 矿山设备车队决策支持系统 - 安全除法
// ==========================================
// 约束: 分母为 0 / 非有限值时返回 0，结果永不为 NaN / Infinity
// ==========================================

/// 安全比值 numerator / denominator
///
/// # 返回
/// - 分母为 0 或任一操作数非有限: 0.0
/// - 否则: 商
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() || !numerator.is_finite() {
        return 0.0;
    }
    let value = numerator / denominator;
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_denominator_is_zero() {
        assert_eq!(safe_ratio(10.0, 0.0), 0.0);
        assert_eq!(safe_ratio(0.0, 0.0), 0.0);
        assert_eq!(safe_ratio(10.0, -0.0), 0.0);
    }

    #[test]
    fn test_non_finite_inputs() {
        assert_eq!(safe_ratio(f64::NAN, 2.0), 0.0);
        assert_eq!(safe_ratio(1.0, f64::INFINITY), 0.0);
    }

    #[test]
    fn test_plain_division() {
        assert_eq!(safe_ratio(50.0, 100.0), 0.5);
    }
}
