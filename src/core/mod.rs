mod engine;
mod error;
mod types;

pub use engine::{
    MAX_YEARS, calculate, contributions_future_value, present_value, project_balances,
    solve_lump_sum, total_recurring_contributions, validate_input,
};
pub use error::{CalcError, Result, UNSOLVABLE_MESSAGE};
pub use types::{CalculationInput, CalculationResult, ProjectionYear, Variant};
