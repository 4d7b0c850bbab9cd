mod engine;
mod error;
mod types;

pub use engine::project;
pub use error::InputValidationError;
pub use types::{
    BreakEven, InputParameters, LoanDetails, OwnershipYear, Projection, RentalYear, Scenario,
    Summary,
};
