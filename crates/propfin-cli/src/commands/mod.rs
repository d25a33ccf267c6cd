pub mod irr;
pub mod ltt;
pub mod metrics;
pub mod schedule;
pub mod statement;
