pub mod compare;
pub mod performance;
pub mod setup;
pub mod ui;
