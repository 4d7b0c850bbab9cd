use serde::Serialize;

use super::error::InputValidationError;

pub const DOWN_PAYMENT_PCT_RANGE: (f64, f64) = (0.05, 0.50);
pub const MORTGAGE_YEARS_RANGE: (u32, u32) = (10, 50);
pub const INTEREST_RATE_RANGE: (f64, f64) = (0.0, 0.10);
pub const AMORTIZATION_RATE_RANGE: (f64, f64) = (0.01, 0.05);
pub const APPRECIATION_RATE_RANGE: (f64, f64) = (-0.05, 0.15);
pub const INVESTMENT_RETURN_RANGE: (f64, f64) = (-0.05, 0.15);
pub const COST_GROWTH_RATE_RANGE: (f64, f64) = (-0.05, 0.15);
pub const MAX_HORIZON_YEARS: u32 = 100;

/// One buy-vs-rent scenario. Rates are annual fractions (0.03 = 3%),
/// currency amounts are SEK.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputParameters {
    pub apartment_price: f64,
    pub down_payment_pct: f64,
    pub mortgage_years: u32,
    pub interest_rate: f64,
    pub monthly_avgift: f64,
    pub annual_amortization_rate: f64,
    pub property_appreciation_rate: f64,
    pub monthly_rent: f64,
    pub investment_return_rate: f64,
    pub avgift_growth_rate: f64,
    pub rent_growth_rate: f64,
    /// Years to project; `None` stops at the end of the mortgage term.
    pub horizon_years: Option<u32>,
}

impl InputParameters {
    pub fn down_payment(&self) -> f64 {
        self.apartment_price * self.down_payment_pct
    }

    pub fn loan_amount(&self) -> f64 {
        (self.apartment_price - self.down_payment()).max(0.0)
    }

    pub fn horizon(&self) -> u32 {
        self.horizon_years.unwrap_or(self.mortgage_years)
    }

    pub fn validate(&self) -> Result<(), InputValidationError> {
        let price = finite("apartment_price", self.apartment_price)?;
        if price <= 0.0 {
            return Err(InputValidationError::NotPositive {
                field: "apartment_price",
                value: price,
            });
        }

        within(
            "down_payment_pct",
            self.down_payment_pct,
            DOWN_PAYMENT_PCT_RANGE,
        )?;

        let (min_years, max_years) = MORTGAGE_YEARS_RANGE;
        if !(min_years..=max_years).contains(&self.mortgage_years) {
            return Err(InputValidationError::YearsOutOfRange {
                field: "mortgage_years",
                value: self.mortgage_years,
                min: min_years,
                max: max_years,
            });
        }

        within("interest_rate", self.interest_rate, INTEREST_RATE_RANGE)?;
        non_negative("monthly_avgift", self.monthly_avgift)?;
        within(
            "annual_amortization_rate",
            self.annual_amortization_rate,
            AMORTIZATION_RATE_RANGE,
        )?;
        within(
            "property_appreciation_rate",
            self.property_appreciation_rate,
            APPRECIATION_RATE_RANGE,
        )?;
        non_negative("monthly_rent", self.monthly_rent)?;
        within(
            "investment_return_rate",
            self.investment_return_rate,
            INVESTMENT_RETURN_RANGE,
        )?;
        within(
            "avgift_growth_rate",
            self.avgift_growth_rate,
            COST_GROWTH_RATE_RANGE,
        )?;
        within("rent_growth_rate", self.rent_growth_rate, COST_GROWTH_RATE_RANGE)?;

        if let Some(horizon) = self.horizon_years {
            if !(self.mortgage_years..=MAX_HORIZON_YEARS).contains(&horizon) {
                return Err(InputValidationError::YearsOutOfRange {
                    field: "horizon_years",
                    value: horizon,
                    min: self.mortgage_years,
                    max: MAX_HORIZON_YEARS,
                });
            }
        }

        Ok(())
    }
}

fn finite(field: &'static str, value: f64) -> Result<f64, InputValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(InputValidationError::NotFinite { field })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), InputValidationError> {
    if finite(field, value)? < 0.0 {
        return Err(InputValidationError::Negative { field, value });
    }
    Ok(())
}

fn within(
    field: &'static str,
    value: f64,
    (min, max): (f64, f64),
) -> Result<(), InputValidationError> {
    if !(min..=max).contains(&finite(field, value)?) {
        return Err(InputValidationError::RateOutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipYear {
    pub year: u32,
    pub outstanding_principal: f64,
    pub interest_paid: f64,
    pub amortization_paid: f64,
    pub avgift_paid: f64,
    pub total_outlay: f64,
    pub property_value: f64,
    pub net_worth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalYear {
    pub year: u32,
    pub rent_paid: f64,
    /// Ownership outlay minus rent for the year; negative when renting costs more.
    pub contribution: f64,
    pub invested_capital: f64,
    pub net_worth: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    Ownership,
    Rental,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakEven {
    pub year: u32,
    /// Scenario with the higher net worth from `year` on.
    pub leader: Scenario,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanDetails {
    pub loan_amount: f64,
    pub down_payment: f64,
    pub amortization_rate: f64,
    pub monthly_amortization: f64,
    pub loan_to_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub loan: LoanDetails,
    pub total_interest_paid: f64,
    pub total_amortization_paid: f64,
    pub total_avgift_paid: f64,
    pub total_ownership_outlay: f64,
    pub total_rent_paid: f64,
    pub cost_difference: f64,
    pub final_ownership_net_worth: f64,
    pub final_rental_net_worth: f64,
    pub final_net_worth_delta: f64,
    pub break_even: Option<BreakEven>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub ownership: Vec<OwnershipYear>,
    pub rental: Vec<RentalYear>,
    pub summary: Summary,
}
