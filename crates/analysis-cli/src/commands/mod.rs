pub mod ranking;
pub mod series;
