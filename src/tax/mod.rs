//! Purchase taxes

pub mod land_transfer;

pub use land_transfer::{bracket_tax, calculate_land_transfer_tax, LttBreakdown, LttRequest};
