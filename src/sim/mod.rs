/// Step counter and wall-clock scheduler.
pub mod clock;
pub mod engine;
/// Trip records and scripted commands.
pub mod event;
pub mod kpi;
pub mod load;
pub mod thermal;
pub mod types;
