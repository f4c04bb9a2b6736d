pub mod command;
/// Slot grid planning for place, resize, and move.
pub mod slots;
pub mod store;
pub mod types;
