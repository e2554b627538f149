pub mod participant;
pub mod round;
