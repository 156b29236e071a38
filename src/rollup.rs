use crate::domain::{Jar, LedgerJar, LedgerRow, Month};
use anyhow::{Context, Result, anyhow};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-jar sums for one period, with absent jars at zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JarTotals {
    pub income: Decimal,
    pub jars: [Decimal; 6],
}

impl JarTotals {
    fn add(&mut self, row: &LedgerRow) -> Result<()> {
        let slot = match row.jar {
            LedgerJar::Income => &mut self.income,
            LedgerJar::Jar(jar) => &mut self.jars[jar as usize],
        };
        *slot = slot
            .checked_add(row.amount)
            .ok_or_else(|| anyhow!("'{}' total overflowed", row.jar.name()))?;
        Ok(())
    }

    pub fn jar(&self, jar: Jar) -> Decimal {
        self.jars[jar as usize]
    }

    /// Sum of the six expense jars; the income pseudo-row is excluded.
    pub fn total_spent(&self) -> Result<Decimal> {
        self.jars
            .iter()
            .try_fold(Decimal::ZERO, |acc, d| acc.checked_add(*d))
            .ok_or_else(|| anyhow!("total spent overflowed"))
    }

    pub fn balance(&self) -> Result<Decimal> {
        self.income
            .checked_sub(self.total_spent()?)
            .ok_or_else(|| anyhow!("balance overflowed"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyRollup {
    #[serde(rename = "Año")]
    pub year: i32,
    #[serde(rename = "Mes")]
    pub month: Month,
    #[serde(rename = "Ingreso Mensual")]
    pub income: Decimal,
    #[serde(rename = "Total Gastado del Mes")]
    pub total_spent: Decimal,
    #[serde(rename = "Saldo Mensual")]
    pub balance: Decimal,
    #[serde(skip)]
    pub totals: JarTotals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnualRollup {
    #[serde(rename = "Año")]
    pub year: i32,
    #[serde(rename = "Ingreso Total Anual")]
    pub income: Decimal,
    #[serde(rename = "Total Gastado del Año")]
    pub total_spent: Decimal,
    #[serde(rename = "Saldo Anual")]
    pub balance: Decimal,
    #[serde(skip)]
    pub totals: JarTotals,
}

/// One row per (year, month) present in `rows`, sorted by year then month number.
pub fn monthly(rows: &[LedgerRow]) -> Result<Vec<MonthlyRollup>> {
    let mut groups: BTreeMap<(i32, Month), JarTotals> = BTreeMap::new();
    for row in rows {
        groups
            .entry((row.year, row.month))
            .or_default()
            .add(row)
            .with_context(|| format!("Amounts for {} {} are too large", row.month, row.year))?;
    }
    groups
        .into_iter()
        .map(|((year, month), totals)| {
            let context = || format!("Amounts for {month} {year} are too large");
            Ok::<_, anyhow::Error>(MonthlyRollup {
                year,
                month,
                income: totals.income,
                total_spent: totals.total_spent().with_context(context)?,
                balance: totals.balance().with_context(context)?,
                totals,
            })
        })
        .collect()
}

/// One row per year present in `rows`, sorted by year.
pub fn annual(rows: &[LedgerRow]) -> Result<Vec<AnnualRollup>> {
    let mut groups: BTreeMap<i32, JarTotals> = BTreeMap::new();
    for row in rows {
        groups
            .entry(row.year)
            .or_default()
            .add(row)
            .with_context(|| format!("Amounts for {} are too large", row.year))?;
    }
    groups
        .into_iter()
        .map(|(year, totals)| {
            let context = || format!("Amounts for {year} are too large");
            Ok::<_, anyhow::Error>(AnnualRollup {
                year,
                income: totals.income,
                total_spent: totals.total_spent().with_context(context)?,
                balance: totals.balance().with_context(context)?,
                totals,
            })
        })
        .collect()
}
