use std::path::PathBuf;

/// Natural Earth 110m country polygons, one feature per country with a
/// `name` property.
pub const DEFAULT_BOUNDARY_URL: &str =
    "https://raw.githubusercontent.com/holtzy/D3-graph-gallery/master/DATA/world.geojson";

pub const INITIAL_COMPANIES: &[&str] = &[
    "Exxaro Resources",
    "Sibanye Stillwater",
    "Gold Fields",
    "African Rainbow Minerals",
    "AngloGold Ashanti",
    "Pan African Resources",
    "Glencore",
    "Ivanhoe Mines",
    "De Beers",
    "Barrick Gold",
    "Eskom",
    "PRASA",
    "Transnet",
    "Telkom",
];

/// Runtime configuration, read once at startup. Values come from the
/// environment (a `.env` file is honoured) and fall back to defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub blob_dir: PathBuf,
    pub blob_base_url: Option<String>,
    pub boundary_source: String,
    pub boundary_name_key: String,
    pub seed_companies: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/companies"),
            blob_dir: PathBuf::from("data/blobs"),
            blob_base_url: None,
            boundary_source: DEFAULT_BOUNDARY_URL.to_string(),
            boundary_name_key: "name".to_string(),
            seed_companies: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            data_dir: non_empty("OUTREACH_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            blob_dir: non_empty("OUTREACH_BLOB_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.blob_dir),
            blob_base_url: non_empty("OUTREACH_BLOB_BASE_URL"),
            boundary_source: non_empty("OUTREACH_BOUNDARY_URL").unwrap_or(defaults.boundary_source),
            boundary_name_key: non_empty("OUTREACH_BOUNDARY_NAME_KEY")
                .unwrap_or(defaults.boundary_name_key),
            seed_companies: non_empty("OUTREACH_SEED_COMPANIES")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.seed_companies),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn falls_back_to_defaults() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config.boundary_source, DEFAULT_BOUNDARY_URL);
        assert_eq!(config.boundary_name_key, "name");
        assert!(!config.seed_companies);
        assert!(config.blob_base_url.is_none());
    }

    #[test]
    fn reads_overrides_and_ignores_blank_values() {
        let vars: HashMap<&str, &str> = [
            ("OUTREACH_DATA_DIR", "/tmp/outreach"),
            ("OUTREACH_BOUNDARY_NAME_KEY", "ADMIN"),
            ("OUTREACH_BLOB_BASE_URL", "  "),
            ("OUTREACH_SEED_COMPANIES", "True"),
        ]
        .into_iter()
        .collect();
        let config = AppConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.data_dir, PathBuf::from("/tmp/outreach"));
        assert_eq!(config.boundary_name_key, "ADMIN");
        assert!(config.blob_base_url.is_none());
        assert!(config.seed_companies);
    }
}
