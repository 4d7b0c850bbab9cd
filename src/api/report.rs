use std::fmt::Write;

use crate::core::{Projection, Scenario};

/// Formats an amount as whole Swedish kronor with thousands separators, e.g. `1,234,567 SEK`.
pub fn format_currency(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{sign}{grouped} SEK")
}

pub fn render_table(projection: &Projection) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4} {:>16} {:>14} {:>14} {:>12} {:>16} {:>16} {:>12} {:>14} {:>16}",
        "Year",
        "Principal",
        "Interest",
        "Amortization",
        "Avgift",
        "Property value",
        "Owner worth",
        "Rent",
        "Contribution",
        "Renter worth",
    );

    for (owned, rented) in projection.ownership.iter().zip(&projection.rental) {
        let _ = writeln!(
            out,
            "{:>4} {:>16} {:>14} {:>14} {:>12} {:>16} {:>16} {:>12} {:>14} {:>16}",
            owned.year,
            format_currency(owned.outstanding_principal),
            format_currency(owned.interest_paid),
            format_currency(owned.amortization_paid),
            format_currency(owned.avgift_paid),
            format_currency(owned.property_value),
            format_currency(owned.net_worth),
            format_currency(rented.rent_paid),
            format_currency(rented.contribution),
            format_currency(rented.net_worth),
        );
    }

    out
}

pub fn render_summary(projection: &Projection) -> String {
    let summary = &projection.summary;
    let loan = &summary.loan;
    let break_even = match summary.break_even {
        Some(b) => {
            let leader = match b.leader {
                Scenario::Ownership => "buying pulls ahead",
                Scenario::Rental => "renting pulls ahead",
            };
            format!("year {} ({leader})", b.year)
        }
        None => "never".to_string(),
    };
    let wealth_leader = if summary.final_net_worth_delta >= 0.0 {
        "buying"
    } else {
        "renting"
    };

    let rows = [
        ("Loan amount", format_currency(loan.loan_amount)),
        ("Down payment", format_currency(loan.down_payment)),
        ("Loan-to-value", format!("{:.1}%", loan.loan_to_value * 100.0)),
        (
            "Amortization rate",
            format!("{:.1}% annually", loan.amortization_rate * 100.0),
        ),
        (
            "Monthly amortization",
            format_currency(loan.monthly_amortization),
        ),
        ("Total interest", format_currency(summary.total_interest_paid)),
        (
            "Total amortization",
            format_currency(summary.total_amortization_paid),
        ),
        ("Total avgift", format_currency(summary.total_avgift_paid)),
        (
            "Total buying costs",
            format_currency(summary.total_ownership_outlay),
        ),
        ("Total renting costs", format_currency(summary.total_rent_paid)),
        ("Cost difference", format_currency(summary.cost_difference)),
        (
            "Final buying net worth",
            format_currency(summary.final_ownership_net_worth),
        ),
        (
            "Final renting net worth",
            format_currency(summary.final_rental_net_worth),
        ),
        (
            "Net worth difference",
            format!(
                "{} ({wealth_leader} builds more wealth)",
                format_currency(summary.final_net_worth_delta)
            ),
        ),
        ("Break-even", break_even),
    ];

    let mut out = String::new();
    for (label, value) in rows {
        let _ = writeln!(out, "{label:<24} {value}");
    }
    out
}
