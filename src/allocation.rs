use crate::domain::Jar;
use rust_decimal::{Decimal, RoundingStrategy};

/// Slack allowed when checking a jar's cumulative total against its budget.
pub fn budget_tolerance() -> Decimal {
    Decimal::new(1, 3)
}

pub fn round_money(d: Decimal) -> Decimal {
    d.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Budget of a single jar for the given income.
pub fn jar_budget(income: Decimal, jar: Jar) -> Decimal {
    round_money(income * jar.percentage())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JarAllocation {
    pub jar: Jar,
    pub percentage: Decimal,
    pub budget: Decimal,
}

/// Splits `income` across the six jars, in their fixed order.
/// Income is validated (> 0) by the caller.
pub fn allocate(income: Decimal) -> Vec<JarAllocation> {
    Jar::ALL
        .into_iter()
        .map(|jar| JarAllocation {
            jar,
            percentage: jar.percentage(),
            budget: jar_budget(income, jar),
        })
        .collect()
}
