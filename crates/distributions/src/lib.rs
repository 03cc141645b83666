//! Distribution domain module.
//!
//! A distribution is one fulfillment attempt (pickup or delivery) against a
//! single aid request. Pure domain logic only.

pub mod distribution;
pub mod status;

pub use distribution::{Distribution, Fulfillment, FulfillmentMethod, NewDistribution};
pub use status::DistributionStatus;
