//! Money arithmetic for actions: meal prices, shift wages, and the rent
//! affordability bound.
//!
//! All amounts are [`Decimal`] and every operation is checked. Results are
//! rounded to cents with banker's rounding so repeated ticks never
//! accumulate sub-cent residue.

use rust_decimal::Decimal;

/// Decimal places kept for money amounts.
const MONEY_SCALE: u32 = 2;

/// The price of one meal.
///
/// An explicit positive `explicit` cost wins. `None` or zero falls back to
/// `base_food_cost * food_price_index`. Returns `None` when the product
/// overflows, which callers treat as unaffordable.
pub fn meal_cost(
    explicit: Option<Decimal>,
    base_food_cost: Decimal,
    food_price_index: Decimal,
) -> Option<Decimal> {
    match explicit {
        Some(cost) if cost > Decimal::ZERO => Some(cost),
        _ => base_food_cost
            .checked_mul(food_price_index)
            .map(|cost| cost.round_dp(MONEY_SCALE)),
    }
}

/// Wage earned for `hours` of work at a monthly income.
///
/// `monthly_income / hours_per_month * hours`, rounded to cents. Returns
/// `None` when `hours_per_month` is zero or the product overflows.
pub fn shift_wage(monthly_income: Decimal, hours_per_month: Decimal, hours: u32) -> Option<Decimal> {
    monthly_income
        .checked_div(hours_per_month)?
        .checked_mul(Decimal::from(hours))
        .map(|wage| wage.round_dp(MONEY_SCALE))
}

/// The highest rent a citizen with `monthly_income` can take on.
pub fn max_affordable_rent(monthly_income: Decimal, ratio: Decimal) -> Option<Decimal> {
    monthly_income.checked_mul(ratio)
}

/// Whether `rent` is at or below the affordability bound.
pub fn is_rent_affordable(rent: Decimal, monthly_income: Decimal, ratio: Decimal) -> bool {
    max_affordable_rent(monthly_income, ratio).is_some_and(|max| rent <= max)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn meal_cost_uses_market_price_when_unset() {
        assert_eq!(meal_cost(None, dec!(10), dec!(1.0)), Some(dec!(10)));
        assert_eq!(meal_cost(Some(Decimal::ZERO), dec!(10), dec!(1.5)), Some(dec!(15)));
    }

    #[test]
    fn explicit_meal_cost_wins() {
        assert_eq!(meal_cost(Some(dec!(3.25)), dec!(10), dec!(2)), Some(dec!(3.25)));
    }

    #[test]
    fn shift_wage_is_hourly_share_of_income() {
        assert_eq!(shift_wage(dec!(1600), dec!(160), 1), Some(dec!(10)));
        assert_eq!(shift_wage(dec!(2000), dec!(160), 8), Some(dec!(100)));
        assert_eq!(shift_wage(dec!(1000), dec!(160), 1), Some(dec!(6.25)));
    }

    #[test]
    fn shift_wage_rounds_to_cents() {
        assert_eq!(shift_wage(dec!(1000), dec!(3), 1), Some(dec!(333.33)));
    }

    #[test]
    fn shift_wage_with_zero_hours_per_month_is_none() {
        assert_eq!(shift_wage(dec!(1000), Decimal::ZERO, 1), None);
    }

    #[test]
    fn affordability_bound_is_inclusive() {
        assert!(is_rent_affordable(dec!(800), dec!(2000), dec!(0.4)));
        assert!(!is_rent_affordable(dec!(800.01), dec!(2000), dec!(0.4)));
        assert!(!is_rent_affordable(dec!(1), Decimal::ZERO, dec!(0.4)));
    }
}
