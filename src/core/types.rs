use serde::Serialize;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    #[default]
    Detailed,
    Basic,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationInput {
    pub future_value_target: f64,
    pub annual_return_rate: f64,
    pub contribution_growth_rate: f64,
    pub years: u32,
    pub annual_contribution: f64,
}

impl CalculationInput {
    pub fn defaults(variant: Variant) -> Self {
        let contribution_growth_rate = match variant {
            Variant::Detailed => 0.0,
            Variant::Basic => 0.02,
        };
        Self {
            future_value_target: 200_000.0,
            annual_return_rate: 0.07,
            contribution_growth_rate,
            years: 5,
            annual_contribution: 24_000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalculationResult {
    pub present_value: f64,
    pub lump_sum: Option<f64>,
    pub contributions_future_value: Option<f64>,
    pub total_recurring_contributions: f64,
    pub total_invested: Option<f64>,
    pub contributions_exceed_target: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionYear {
    pub year: u32,
    pub contribution: f64,
    pub cumulative_contributions: f64,
    pub lump_sum_balance: f64,
    pub contributions_balance: f64,
    pub total_balance: f64,
}
