pub mod backup;
pub mod chart;
