//! SeaORM entities.

pub mod staff;
