use super::error::{CalcError, Result};
use super::types::{CalculationInput, CalculationResult, ProjectionYear};

pub const MAX_YEARS: u32 = 1_000;

const DEGENERATE_RATE_EPSILON: f64 = 1e-9;

pub fn validate_input(input: &CalculationInput) -> Result<()> {
    if !input.future_value_target.is_finite() {
        return Err(CalcError::invalid("futureValue", "must be a finite number"));
    }
    if !input.annual_contribution.is_finite() {
        return Err(CalcError::invalid(
            "annualContribution",
            "must be a finite number",
        ));
    }
    for (field, rate) in [
        ("annualReturnRate", input.annual_return_rate),
        ("contributionGrowthRate", input.contribution_growth_rate),
    ] {
        if !rate.is_finite() || rate <= -1.0 {
            return Err(CalcError::invalid(field, "must be a decimal rate > -1"));
        }
    }
    if input.years > MAX_YEARS {
        return Err(CalcError::invalid(
            "years",
            format!("must be between 0 and {MAX_YEARS}"),
        ));
    }
    Ok(())
}

fn growth_factor(rate: f64, years: u32) -> f64 {
    (1.0 + rate).powi(years as i32)
}

pub fn contributions_future_value(
    annual_contribution: f64,
    annual_return_rate: f64,
    contribution_growth_rate: f64,
    years: u32,
) -> f64 {
    let r = annual_return_rate;
    let pi = contribution_growth_rate;
    if (r - pi).abs() < DEGENERATE_RATE_EPSILON {
        // Limit of the closed form as pi -> r: every payment grows by (1+r)^T.
        return annual_contribution * years as f64 * growth_factor(r, years);
    }

    annual_contribution * (growth_factor(r, years + 1) - growth_factor(pi, years) * (1.0 + r))
        / (r - pi)
}

pub fn present_value(future_value: f64, annual_return_rate: f64, years: u32) -> Result<f64> {
    let discount = growth_factor(annual_return_rate, years);
    let value = future_value / discount;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::Unsolvable)
    }
}

pub fn solve_lump_sum(input: &CalculationInput) -> Result<f64> {
    validate_input(input)?;

    let discount = growth_factor(input.annual_return_rate, input.years);
    if !discount.is_finite() || discount <= 0.0 {
        return Err(CalcError::Unsolvable);
    }

    let contributions_fv = contributions_future_value(
        input.annual_contribution,
        input.annual_return_rate,
        input.contribution_growth_rate,
        input.years,
    );
    let lump_sum = (input.future_value_target - contributions_fv) / discount;
    if lump_sum.is_finite() {
        Ok(lump_sum)
    } else {
        Err(CalcError::Unsolvable)
    }
}

pub fn total_recurring_contributions(
    annual_contribution: f64,
    contribution_growth_rate: f64,
    years: u32,
) -> f64 {
    (0..years)
        .map(|t| annual_contribution * growth_factor(contribution_growth_rate, t))
        .sum()
}

/// Runs every calculation the page shows.
///
/// Validation failures and a non-finite present value are errors; a lump sum
/// without a finite solution is reported as `lump_sum: None`.
pub fn calculate(input: &CalculationInput) -> Result<CalculationResult> {
    validate_input(input)?;

    let present_value = present_value(
        input.future_value_target,
        input.annual_return_rate,
        input.years,
    )?;
    let total_recurring_contributions = total_recurring_contributions(
        input.annual_contribution,
        input.contribution_growth_rate,
        input.years,
    );

    let lump_sum = match solve_lump_sum(input) {
        Ok(value) => Some(value),
        Err(CalcError::Unsolvable) => None,
        Err(e) => return Err(e),
    };
    let contributions_future_value = lump_sum.map(|_| {
        contributions_future_value(
            input.annual_contribution,
            input.annual_return_rate,
            input.contribution_growth_rate,
            input.years,
        )
    });

    Ok(CalculationResult {
        present_value,
        lump_sum,
        contributions_future_value,
        total_recurring_contributions,
        total_invested: lump_sum.map(|value| value + total_recurring_contributions),
        contributions_exceed_target: lump_sum.is_some_and(|value| value < 0.0),
    })
}

pub fn project_balances(input: &CalculationInput, lump_sum: f64) -> Vec<ProjectionYear> {
    let growth = 1.0 + input.annual_return_rate;
    let mut rows = Vec::with_capacity(input.years as usize);
    let mut lump_sum_balance = lump_sum;
    let mut contributions_balance = 0.0;
    let mut cumulative_contributions = 0.0;

    for t in 0..input.years {
        let contribution =
            input.annual_contribution * growth_factor(input.contribution_growth_rate, t);
        cumulative_contributions += contribution;
        contributions_balance = (contributions_balance + contribution) * growth;
        lump_sum_balance *= growth;

        rows.push(ProjectionYear {
            year: t + 1,
            contribution,
            cumulative_contributions,
            lump_sum_balance,
            contributions_balance,
            total_balance: lump_sum_balance + contributions_balance,
        });
    }

    rows
}
