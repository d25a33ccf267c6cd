pub mod ontario;

pub use ontario::{calculate_ltt, LttInput, LttOutput};
