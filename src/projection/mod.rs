//! Hold-period projection: growth, loan paydown, sale and investor returns

mod cashflows;
mod engine;
mod irr;
mod state;

pub use cashflows::{HoldProjection, ProjectionYear, SaleSummary};
pub use engine::{ProjectionBasis, ProjectionConfig, ProjectionEngine};
pub use irr::{calculate_irr, npv};
pub use state::HoldState;
