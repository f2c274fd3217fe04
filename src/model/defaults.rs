use super::company::{ChartConfig, Company, ContactDetails, Executive, ProductionYear};
use super::generate_id;

pub const DEFAULT_EXECUTIVE_ROLES: [&str; 4] = [
    "Chief Executive Officer",
    "Chief Financial Officer",
    "Chief Operating Officer",
    "Chief Transformation Officer",
];

pub const DEFAULT_DESCRIPTION: &str = "Enter a brief company description...";
pub const EBITDA_KEY: &str = "ebitda";
pub const PRODUCTION_KEY: &str = "production";
pub const EBITDA_AXIS_LABEL: &str = "EBITDA (R Billion)";
pub const PRODUCTION_AXIS_LABEL: &str = "Production (Kt)";

/// The two charts every profile starts with.
pub fn default_charts(ebitda_label: Option<&str>, production_label: Option<&str>) -> Vec<ChartConfig> {
    vec![
        ChartConfig::new(EBITDA_KEY, "EBITDA", ebitda_label.unwrap_or(EBITDA_AXIS_LABEL)),
        ChartConfig::new(
            PRODUCTION_KEY,
            "Production",
            production_label.unwrap_or(PRODUCTION_AXIS_LABEL),
        ),
    ]
}

pub fn new_executive(role: &str) -> Executive {
    Executive {
        id: generate_id(),
        role_title: role.to_string(),
        name: String::new(),
        bio: String::new(),
        education: String::new(),
        image_url: None,
    }
}

impl Company {
    /// A fresh profile with placeholder executives, contact and figures.
    pub fn new_default(name: &str) -> Self {
        let production_data = [("2021", 10.0, 5.0), ("2022", 12.0, 6.0), ("2023", 11.0, 5.5), ("2024", 14.0, 7.0)]
            .into_iter()
            .map(|(year, ebitda, production)| {
                ProductionYear::new(year)
                    .with(EBITDA_KEY, ebitda)
                    .with(PRODUCTION_KEY, production)
            })
            .collect();

        Self {
            id: generate_id(),
            name: name.trim().to_string(),
            logo_url: None,
            description: DEFAULT_DESCRIPTION.to_string(),
            executives: DEFAULT_EXECUTIVE_ROLES.iter().map(|r| new_executive(r)).collect(),
            contact: ContactDetails {
                address: String::new(),
                emails: vec![String::new()],
                phones: vec![String::new()],
            },
            locations: Vec::new(),
            production_data,
            highlighted_countries: Vec::new(),
            charts: default_charts(None, None),
            intro_sources: Vec::new(),
            financial_sources: Vec::new(),
            location_sources: Vec::new(),
            axis_label_ebitda: None,
            axis_label_ebdat: None,
            axis_label_production: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_a_complete_profile() {
        let company = Company::new_default("  Gold Fields ");

        assert_eq!(company.name, "Gold Fields");
        assert!(!company.id.is_empty());
        assert_eq!(company.executives.len(), 4);
        assert_eq!(company.executives[3].role_title, "Chief Transformation Officer");
        assert_eq!(company.contact.emails, vec![String::new()]);
        assert!(company.locations.is_empty());

        let years: Vec<&str> = company.production_data.iter().map(|y| y.year.as_str()).collect();
        assert_eq!(years, ["2021", "2022", "2023", "2024"]);
        assert_eq!(company.production_data[2].metric(PRODUCTION_KEY), Some(5.5));

        let keys: Vec<&str> = company.charts.iter().map(|c| c.data_key.as_str()).collect();
        assert_eq!(keys, [EBITDA_KEY, PRODUCTION_KEY]);
        assert!(company.charts.iter().all(|c| c.validate().is_ok()));
    }

    #[test]
    fn ids_are_unique_per_company() {
        let a = Company::new_default("A");
        let b = Company::new_default("B");
        assert_ne!(a.id, b.id);
        assert_ne!(a.executives[0].id, a.executives[1].id);
    }
}
