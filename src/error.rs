use rust_decimal::Decimal;
use thiserror::Error;

/// Input validation failures. None of these mutate state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BudgetError {
    #[error("Unknown jar: '{0}' (run `jarrones jars` to list them)")]
    UnknownJar(String),

    #[error("Unknown month: '{0}' (use Enero..Diciembre or 1..12)")]
    UnknownMonth(String),

    #[error("Year {0} is out of range (2000..=2100)")]
    YearOutOfRange(i32),

    #[error("Please select a valid subcategory for '{jar}'")]
    SubcategoryNotSelected { jar: String },

    #[error("'{subcategory}' is not a subcategory of '{jar}'")]
    UnknownSubcategory { jar: String, subcategory: String },

    #[error("Please enter an amount")]
    MissingAmount,

    #[error("Not a valid number: '{0}'")]
    InvalidAmount(String),

    #[error("The amount must be positive")]
    NonPositiveAmount,

    #[error("Income must be greater than zero")]
    NonPositiveIncome,

    #[error("Over budget: this expense would exceed '{jar}' by {excess:.2}. Reduce the amount.")]
    OverBudget { jar: String, excess: Decimal },
}
