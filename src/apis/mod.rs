pub mod clearspending;
pub mod open_sanctions;
pub mod translate;
