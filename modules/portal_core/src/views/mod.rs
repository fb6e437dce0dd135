pub mod dashboard;

pub use dashboard::{ApplicationCard, Dashboard};
