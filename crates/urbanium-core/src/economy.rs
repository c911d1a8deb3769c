//! Household finances and goods price drift.
//!
//! Once per simulated day, at the first tick of the day and before any
//! citizen acts:
//!
//! 1. **Price drift** -- the food price index grows by
//!    `annual_inflation / 365`, rounded to six places.
//! 2. **Bills** -- every household member owes a daily share of their
//!    monthly rent share plus the per-member utilities charge. A member who
//!    cannot cover it pays what they hold; the shortfall is logged as a
//!    [`BillShortfall`](WorldEventKind::BillShortfall) event and cash never
//!    goes negative.
//!
//! Homeless citizens owe nothing. All amounts are computed before the first
//! write, so an overflow leaves the city unchanged.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use urbanium_types::{CitizenId, WorldEvent, WorldEventKind};
use urbanium_world::City;

/// Days in the year used to turn the annual inflation rate into a daily one.
const DAYS_PER_YEAR: u32 = 365;

/// Decimal places kept on the food price index.
const PRICE_INDEX_DP: u32 = 6;

/// Errors raised while settling the daily economy.
#[derive(Debug, thiserror::Error)]
pub enum EconomyError {
    /// A checked money calculation overflowed.
    #[error("arithmetic overflow computing {what}")]
    ArithmeticOverflow {
        /// The quantity being computed.
        what: &'static str,
    },
}

const fn overflow(what: &'static str) -> EconomyError {
    EconomyError::ArithmeticOverflow { what }
}

/// Household bill and price drift parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Days a monthly bill is spread over (default: 30).
    pub days_per_month: u32,

    /// Monthly utilities charge per household member (default: 50).
    pub utilities_per_member: Decimal,

    /// Annual growth of the food price index, as a fraction (default: 0).
    pub annual_inflation: Decimal,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            days_per_month: 30,
            utilities_per_member: Decimal::from(50_u32),
            annual_inflation: Decimal::ZERO,
        }
    }
}

impl EconomyConfig {
    /// Whether the month has days, utilities are non-negative, and inflation
    /// lies within `[-1, 1]`.
    pub fn is_valid(&self) -> bool {
        self.days_per_month > 0
            && !self.utilities_per_member.is_sign_negative()
            && (Decimal::NEGATIVE_ONE..=Decimal::ONE).contains(&self.annual_inflation)
    }

    /// What one member owes for a day, given their monthly rent share.
    ///
    /// Returns `None` on overflow or when `days_per_month` is zero.
    pub fn daily_bill(&self, rent_share: Decimal) -> Option<Decimal> {
        rent_share
            .checked_add(self.utilities_per_member)?
            .checked_div(Decimal::from(self.days_per_month))
            .map(|bill| bill.round_dp(2))
    }
}

/// Outcome of one day's settlement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySettlement {
    /// Total owed across all household members.
    pub billed: Decimal,
    /// Total actually paid.
    pub collected: Decimal,
    /// Members who could not pay in full.
    pub shortfalls: u32,
    /// Food price index after drift.
    pub food_price_index: Decimal,
    /// Shortfall events, in household then member order.
    pub events: Vec<WorldEvent>,
}

/// Drift prices, then charge every household member their daily bill.
///
/// # Errors
///
/// Returns [`EconomyError::ArithmeticOverflow`] if any amount overflows;
/// nothing is changed in that case.
pub fn settle_day(
    city: &mut City,
    config: &EconomyConfig,
    tick: u64,
) -> Result<DailySettlement, EconomyError> {
    let food_price_index = drifted_price_index(city.goods.food_price_index, config)?;

    let mut billed = Decimal::ZERO;
    let mut collected = Decimal::ZERO;
    let mut payments: Vec<(CitizenId, Decimal, Decimal)> = Vec::new();
    let mut events = Vec::new();

    for household in city.households.values() {
        for member in &household.members {
            let Some(citizen) = city.citizens.get(member) else {
                continue;
            };
            let due = config
                .daily_bill(citizen.resources.monthly_expenses)
                .ok_or_else(|| overflow("daily bill"))?;
            let paid = due.min(citizen.resources.cash).max(Decimal::ZERO);
            let cash = citizen
                .resources
                .cash
                .checked_sub(paid)
                .ok_or_else(|| overflow("bill debit"))?;
            billed = billed.checked_add(due).ok_or_else(|| overflow("billed total"))?;
            collected = collected
                .checked_add(paid)
                .ok_or_else(|| overflow("collected total"))?;

            if paid < due {
                let short = due.checked_sub(paid).ok_or_else(|| overflow("shortfall"))?;
                events.push(WorldEvent {
                    tick,
                    kind: WorldEventKind::BillShortfall,
                    description: format!(
                        "{} was {short} short on household {} bills",
                        citizen.name, household.id
                    ),
                });
            }
            payments.push((*member, paid, cash));
        }
    }

    city.goods.food_price_index = food_price_index;
    for (member, paid, cash) in payments {
        if let Some(citizen) = city.citizens.get_mut(&member) {
            citizen.resources.cash = cash;
            debug!(tick, citizen_id = %member, %paid, %cash, "Household bill paid");
        }
    }

    let shortfalls = u32::try_from(events.len()).unwrap_or(u32::MAX);
    Ok(DailySettlement {
        billed,
        collected,
        shortfalls,
        food_price_index,
        events,
    })
}

fn drifted_price_index(index: Decimal, config: &EconomyConfig) -> Result<Decimal, EconomyError> {
    if config.annual_inflation.is_zero() {
        return Ok(index);
    }
    let daily = config
        .annual_inflation
        .checked_div(Decimal::from(DAYS_PER_YEAR))
        .and_then(|rate| Decimal::ONE.checked_add(rate))
        .ok_or_else(|| overflow("daily inflation"))?;
    index
        .checked_mul(daily)
        .map(|drifted| drifted.round_dp(PRICE_INDEX_DP).max(Decimal::ZERO))
        .ok_or_else(|| overflow("food price index"))
}
