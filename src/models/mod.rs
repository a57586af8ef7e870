//! Single-machine scheduling domain models.
//!
//! Provides the instance and solution types consumed and produced by the
//! formulations.
//!
//! | Type | Meaning |
//! |------|---------|
//! | Job | Processing time, due date, tardiness cost |
//! | Instance | Ordered jobs sharing one machine |
//! | Schedule | Start/end time per job |

mod job;
mod schedule;

pub use job::{Instance, Job};
pub use schedule::Schedule;
