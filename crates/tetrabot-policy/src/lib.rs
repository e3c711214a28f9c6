//! Scoring networks that plug into the harness as [`DecisionPolicy`].
//!
//! Both variants score every candidate state independently and keep the first
//! one with the strictly greatest score:
//!
//! - [`ValueNetwork`] - dense feed-forward value estimator loaded from a JSON
//!   model file; the whole candidate set is scored as one batch
//! - [`EvolvedNetwork`] - feed-forward network decoded from a
//!   [`NetworkGenome`], one forward pass per candidate
//!
//! [`Policy`] wraps either and is chosen once when a run is configured.
//!
//! [`DecisionPolicy`]: tetrabot_harness::DecisionPolicy

pub use self::{activation::*, evolved::*, policy::*, value_network::*};

mod activation;
mod evolved;
mod policy;
mod value_network;
