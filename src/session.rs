use crate::allocation::{allocate, budget_tolerance, jar_budget, round_money};
use crate::domain::{
    ExpenseEntry, INCOME_SUBCATEGORY, Jar, LedgerJar, LedgerRow, Month, parse_amount,
    validate_year,
};
use crate::error::BudgetError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parses the monthly income field; it must be strictly positive.
pub fn parse_income(raw: &str) -> Result<Decimal, BudgetError> {
    let income = parse_amount(Some(raw))?;
    if income <= Decimal::ZERO {
        return Err(BudgetError::NonPositiveIncome);
    }
    Ok(income)
}

/// Checks a proposed expense against a jar's remaining capacity.
///
/// `assigned` is the jar's current total and `budget` its allotment. On success
/// the returned entry carries the canonical subcategory spelling.
pub fn validate_expense(
    jar: Jar,
    assigned: Decimal,
    budget: Decimal,
    subcategory: Option<&str>,
    raw_amount: Option<&str>,
) -> Result<ExpenseEntry, BudgetError> {
    let subcategory = subcategory.map(str::trim).unwrap_or("");
    if subcategory.is_empty() {
        return Err(BudgetError::SubcategoryNotSelected {
            jar: jar.name().to_string(),
        });
    }
    let Some(canonical) = jar.find_subcategory(subcategory) else {
        return Err(BudgetError::UnknownSubcategory {
            jar: jar.name().to_string(),
            subcategory: subcategory.to_string(),
        });
    };

    let amount = parse_amount(raw_amount)?;
    if amount <= Decimal::ZERO {
        return Err(BudgetError::NonPositiveAmount);
    }
    // Sums past Decimal::MAX are over any budget.
    let total = assigned.checked_add(amount);
    let limit = budget.checked_add(budget_tolerance()).unwrap_or(budget);
    if total.is_none_or(|t| t > limit) {
        let excess = total
            .and_then(|t| t.checked_sub(budget))
            .unwrap_or(amount);
        return Err(BudgetError::OverBudget {
            jar: jar.name().to_string(),
            excess: round_money(excess),
        });
    }

    Ok(ExpenseEntry {
        subcategory: canonical.to_string(),
        amount,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JarState {
    Available(Decimal),
    Full,
    Exceeded(Decimal),
}

impl JarState {
    fn from_remaining(remaining: Decimal) -> Self {
        if remaining < Decimal::ZERO {
            JarState::Exceeded(-remaining)
        } else if remaining.is_zero() {
            JarState::Full
        } else {
            JarState::Available(remaining)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JarStatus {
    pub jar: Jar,
    pub percentage: Decimal,
    pub budget: Decimal,
    pub assigned: Decimal,
    pub remaining: Decimal,
    pub state: JarState,
}

/// The month being filled in: income, period and per-jar expenses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub income: Decimal,
    pub year: i32,
    pub month: Month,
    #[serde(default)]
    pub jars: BTreeMap<Jar, Vec<ExpenseEntry>>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(income: Decimal, year: i32, month: Month) -> Result<Self, BudgetError> {
        if income <= Decimal::ZERO {
            return Err(BudgetError::NonPositiveIncome);
        }
        let year = validate_year(year)?;
        let mut session = Self {
            income,
            year,
            month,
            jars: BTreeMap::new(),
            updated_at: Utc::now(),
        };
        session.ensure_jars();
        Ok(session)
    }

    /// Re-checks the invariants `new` enforces, for sessions read from disk.
    pub fn validate(&self) -> Result<(), BudgetError> {
        if self.income <= Decimal::ZERO {
            return Err(BudgetError::NonPositiveIncome);
        }
        validate_year(self.year)?;
        let mut total = Decimal::ZERO;
        for (jar, entries) in &self.jars {
            for entry in entries {
                if entry.amount <= Decimal::ZERO {
                    return Err(BudgetError::NonPositiveAmount);
                }
                total = total
                    .checked_add(entry.amount)
                    .ok_or_else(|| BudgetError::OverBudget {
                        jar: jar.name().to_string(),
                        excess: entry.amount,
                    })?;
            }
        }
        Ok(())
    }

    /// Older or hand-edited session files may lack some jars.
    pub fn ensure_jars(&mut self) {
        for jar in Jar::ALL {
            self.jars.entry(jar).or_default();
        }
    }

    pub fn set_income(&mut self, income: Decimal) -> Result<(), BudgetError> {
        if income <= Decimal::ZERO {
            return Err(BudgetError::NonPositiveIncome);
        }
        self.income = income;
        self.touch();
        Ok(())
    }

    pub fn set_period(&mut self, year: i32, month: Month) -> Result<(), BudgetError> {
        self.year = validate_year(year)?;
        self.month = month;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn entries(&self, jar: Jar) -> &[ExpenseEntry] {
        self.jars.get(&jar).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn budget(&self, jar: Jar) -> Decimal {
        jar_budget(self.income, jar)
    }

    pub fn assigned(&self, jar: Jar) -> Decimal {
        self.entries(jar).iter().map(|e| e.amount).sum()
    }

    pub fn remaining(&self, jar: Jar) -> Decimal {
        round_money(self.budget(jar) - self.assigned(jar))
    }

    pub fn total_assigned(&self) -> Decimal {
        Jar::ALL.into_iter().map(|j| self.assigned(j)).sum()
    }

    /// Income not yet placed in any subcategory. Negative when over-assigned.
    pub fn unassigned(&self) -> Decimal {
        round_money(self.income - self.total_assigned())
    }

    /// Validates and appends an expense to `jar`.
    pub fn add_expense(
        &mut self,
        jar: Jar,
        subcategory: Option<&str>,
        raw_amount: Option<&str>,
    ) -> Result<ExpenseEntry, BudgetError> {
        let entry = validate_expense(
            jar,
            self.assigned(jar),
            self.budget(jar),
            subcategory,
            raw_amount,
        )?;
        self.jars.entry(jar).or_default().push(entry.clone());
        self.touch();
        Ok(entry)
    }

    pub fn status(&self) -> Vec<JarStatus> {
        allocate(self.income)
            .into_iter()
            .map(|alloc| {
                let assigned = self.assigned(alloc.jar);
                let remaining = round_money(alloc.budget - assigned);
                JarStatus {
                    jar: alloc.jar,
                    percentage: alloc.percentage,
                    budget: alloc.budget,
                    assigned,
                    remaining,
                    state: JarState::from_remaining(remaining),
                }
            })
            .collect()
    }

    /// Overall assignment state of the whole income.
    pub fn overall_state(&self) -> JarState {
        JarState::from_remaining(self.unassigned())
    }

    /// Rows to persist: the income pseudo-row first, then every jar's
    /// expenses in jar order and insertion order.
    pub fn ledger_rows(&self) -> Vec<LedgerRow> {
        let mut rows = vec![LedgerRow {
            year: self.year,
            month: self.month,
            jar: LedgerJar::Income,
            subcategory: INCOME_SUBCATEGORY.to_string(),
            amount: self.income,
        }];
        for jar in Jar::ALL {
            for entry in self.entries(jar) {
                rows.push(LedgerRow {
                    year: self.year,
                    month: self.month,
                    jar: LedgerJar::Jar(jar),
                    subcategory: entry.subcategory.clone(),
                    amount: entry.amount,
                });
            }
        }
        rows
    }
}
