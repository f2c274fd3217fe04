pub mod company;
pub mod defaults;
pub mod edit;
pub mod migrate;
pub mod numeric;

pub use company::{ChartConfig, Company, Executive, GeoLocation, LocationKind, ProductionYear, SourceSection};

pub fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
