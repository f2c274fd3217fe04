pub mod comparison;
pub mod series;

pub use series::{chart_series, ChartPoint};
