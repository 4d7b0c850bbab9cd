use log::debug;

use super::error::InputValidationError;
use super::types::{
    BreakEven, InputParameters, LoanDetails, OwnershipYear, Projection, RentalYear, Scenario,
    Summary,
};

pub fn project(params: &InputParameters) -> Result<Projection, InputValidationError> {
    params.validate()?;
    let projection = simulate(params);
    debug!(
        "projected {} years: ownership {:.0} SEK, rental {:.0} SEK, break-even {:?}",
        projection.ownership.len(),
        projection.summary.final_ownership_net_worth,
        projection.summary.final_rental_net_worth,
        projection.summary.break_even.map(|b| b.year),
    );
    Ok(projection)
}

fn simulate(params: &InputParameters) -> Projection {
    let ownership = ownership_trajectory(params);
    let rental = rental_trajectory(params, &ownership);
    let summary = summarize(params, &ownership, &rental);
    Projection {
        ownership,
        rental,
        summary,
    }
}

// Amortering is set against the purchase price, not the declining balance.
fn planned_amortization(params: &InputParameters) -> f64 {
    params.annual_amortization_rate * params.apartment_price
}

fn growth_factor(rate: f64, years: u32) -> f64 {
    (1.0 + rate).powi(years as i32)
}

fn ownership_trajectory(params: &InputParameters) -> Vec<OwnershipYear> {
    let horizon = params.horizon();
    let planned = planned_amortization(params);
    let annual_avgift = params.monthly_avgift * 12.0;
    let mut principal = params.loan_amount();
    let mut years = Vec::with_capacity(horizon as usize);

    for year in 1..=horizon {
        // The loan is settled in full by the end of the term.
        let amortization = if year >= params.mortgage_years {
            principal
        } else {
            planned.min(principal)
        };
        let interest = params.interest_rate * principal;
        principal -= amortization;

        let avgift = annual_avgift * growth_factor(params.avgift_growth_rate, year - 1);
        let property_value =
            params.apartment_price * growth_factor(params.property_appreciation_rate, year);

        years.push(OwnershipYear {
            year,
            outstanding_principal: principal,
            interest_paid: interest,
            amortization_paid: amortization,
            avgift_paid: avgift,
            total_outlay: interest + amortization + avgift,
            property_value,
            net_worth: property_value - principal,
        });
    }

    years
}

fn rental_trajectory(params: &InputParameters, ownership: &[OwnershipYear]) -> Vec<RentalYear> {
    let annual_rent = params.monthly_rent * 12.0;
    let mut invested = params.down_payment();
    let mut years = Vec::with_capacity(ownership.len());

    for owned in ownership {
        let rent = annual_rent * growth_factor(params.rent_growth_rate, owned.year - 1);
        let contribution = owned.total_outlay - rent;
        invested = invested * (1.0 + params.investment_return_rate) + contribution;

        years.push(RentalYear {
            year: owned.year,
            rent_paid: rent,
            contribution,
            invested_capital: invested,
            net_worth: invested,
        });
    }

    years
}

fn loan_details(params: &InputParameters) -> LoanDetails {
    let loan_amount = params.loan_amount();
    LoanDetails {
        loan_amount,
        down_payment: params.down_payment(),
        amortization_rate: params.annual_amortization_rate,
        monthly_amortization: planned_amortization(params) / 12.0,
        loan_to_value: if params.apartment_price > 0.0 {
            loan_amount / params.apartment_price
        } else {
            0.0
        },
    }
}

fn break_even(ownership: &[OwnershipYear], rental: &[RentalYear]) -> Option<BreakEven> {
    let mut previous_leader = None;
    for (owned, rented) in ownership.iter().zip(rental) {
        let delta = owned.net_worth - rented.net_worth;
        let leader = if delta > 0.0 {
            Scenario::Ownership
        } else if delta < 0.0 {
            Scenario::Rental
        } else {
            continue;
        };

        match previous_leader {
            Some(previous) if previous != leader => {
                return Some(BreakEven {
                    year: owned.year,
                    leader,
                });
            }
            _ => previous_leader = Some(leader),
        }
    }
    None
}

fn summarize(
    params: &InputParameters,
    ownership: &[OwnershipYear],
    rental: &[RentalYear],
) -> Summary {
    let total_interest_paid = ownership.iter().map(|y| y.interest_paid).sum::<f64>();
    let total_amortization_paid = ownership.iter().map(|y| y.amortization_paid).sum::<f64>();
    let total_avgift_paid = ownership.iter().map(|y| y.avgift_paid).sum::<f64>();
    let total_ownership_outlay = ownership.iter().map(|y| y.total_outlay).sum::<f64>();
    let total_rent_paid = rental.iter().map(|y| y.rent_paid).sum::<f64>();

    // Both scenarios start from the down payment at year 0.
    let final_ownership_net_worth = ownership
        .last()
        .map_or(params.down_payment(), |y| y.net_worth);
    let final_rental_net_worth = rental
        .last()
        .map_or(params.down_payment(), |y| y.net_worth);

    Summary {
        loan: loan_details(params),
        total_interest_paid,
        total_amortization_paid,
        total_avgift_paid,
        total_ownership_outlay,
        total_rent_paid,
        cost_difference: total_ownership_outlay - total_rent_paid,
        final_ownership_net_worth,
        final_rental_net_worth,
        final_net_worth_delta: final_ownership_net_worth - final_rental_net_worth,
        break_even: break_even(ownership, rental),
    }
}
