//! Business logic services.

#![allow(missing_docs)]

pub mod code;
pub mod poll;
pub mod redemption;

pub use code::CodeGenerator;
pub use poll::{PollService, PollStatus};
pub use redemption::RedemptionService;
