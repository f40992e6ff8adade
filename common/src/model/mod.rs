pub mod batch;
pub mod delivery;
pub mod field;
pub mod participant;
