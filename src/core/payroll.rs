use crate::model::user::SalaryType;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayrollFigures {
    pub salary_paid: f64,
    pub net_pay: f64,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Payable amount for a period. Monthly salaries are prorated by present
/// days over working days; daily rates multiply out directly. A month with
/// zero working days pays nothing rather than dividing by zero.
pub fn compute(
    salary_type: SalaryType,
    salary_amount: f64,
    present_days: f64,
    total_working_days: u32,
    allowances_total: f64,
    deductions_total: f64,
) -> PayrollFigures {
    let salary_paid = match salary_type {
        SalaryType::Monthly => {
            if total_working_days == 0 {
                0.0
            } else {
                present_days / total_working_days as f64 * salary_amount
            }
        }
        SalaryType::Daily => present_days * salary_amount,
    };

    let salary_paid = round2(salary_paid);
    let net_pay = round2(salary_paid + allowances_total - deductions_total);

    PayrollFigures { salary_paid, net_pay }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monthly_salary_is_prorated() {
        let f = compute(SalaryType::Monthly, 3000.0, 20.0, 25, 0.0, 0.0);
        assert_eq!(f.salary_paid, 2400.00);
        assert_eq!(f.net_pay, 2400.00);
    }

    #[test]
    fn daily_rate_multiplies_out() {
        let f = compute(SalaryType::Daily, 150.0, 18.5, 25, 0.0, 0.0);
        assert_eq!(f.salary_paid, 2775.00);
    }

    #[test]
    fn half_days_prorate_fractionally() {
        let f = compute(SalaryType::Monthly, 3100.0, 20.5, 31, 0.0, 0.0);
        assert_eq!(f.salary_paid, 2050.00);
    }

    #[test]
    fn rounding_is_two_decimals() {
        let f = compute(SalaryType::Monthly, 1000.0, 1.0, 3, 0.0, 0.0);
        assert_eq!(f.salary_paid, 333.33);
    }

    #[test]
    fn allowances_and_deductions_shift_net_pay() {
        let f = compute(SalaryType::Monthly, 3000.0, 20.0, 25, 150.0, 75.5);
        assert_eq!(f.salary_paid, 2400.00);
        assert_eq!(f.net_pay, 2474.50);
    }

    #[test]
    fn zero_working_days_pays_nothing() {
        let f = compute(SalaryType::Monthly, 3000.0, 0.0, 0, 0.0, 0.0);
        assert_eq!(f.salary_paid, 0.0);
    }
}
