pub mod comparison;
pub mod error;
pub mod evaluator;
pub mod guidance;
pub mod scenario_set;
pub mod schedule;
pub mod types;

#[cfg(feature = "sensitivity")]
pub mod sensitivity;

pub use comparison::{compare, compare_many, return_on_extra_capital, ComparisonDelta};
pub use error::LoanScenarioError;
pub use evaluator::{evaluate, LoanConfiguration, LoanResult};
pub use schedule::{generate_schedule, AmortizationEntry, Schedule};
pub use types::*;

/// Standard result type for all loan-scenario operations
pub type LoanScenarioResult<T> = Result<T, LoanScenarioError>;
