use std::io::Read;

use geozero::error::Result as GeozeroResult;
use geozero::geojson::read_geojson;
use geozero::{ColumnValue, FeatureProcessor, GeomProcessor, PropertyProcessor};

use crate::error::{OutreachError, Result};

/// Ring of (longitude, latitude) pairs.
pub type Ring = Vec<(f64, f64)>;

/// One country outline as it comes out of the boundary dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryShape {
    pub name: String,
    /// Each polygon is a list of rings: the outline first, then holes.
    pub polygons: Vec<Vec<Ring>>,
}

/// Country polygons keyed by display name. The name is the join key for
/// highlighting, compared by exact string equality.
#[derive(Debug, Clone, Default)]
pub struct BoundaryDataset {
    countries: Vec<CountryShape>,
}

impl BoundaryDataset {
    /// Reads a GeoJSON feature collection. Features without polygonal
    /// geometry are skipped; `name_key` names the property holding the
    /// display name.
    pub fn from_geojson<R: Read>(reader: R, name_key: &str) -> Result<Self> {
        let mut collector = CountryCollector::new(name_key);
        read_geojson(reader, &mut collector)?;

        if collector.countries.is_empty() {
            return Err(OutreachError::DataUnavailable(
                "boundary data holds no polygon features".to_string(),
            ));
        }
        log::info!("decoded {} country outlines", collector.countries.len());
        Ok(Self {
            countries: collector.countries,
        })
    }

    pub fn countries(&self) -> &[CountryShape] {
        &self.countries
    }

    #[cfg(test)]
    pub fn get_country_by_name(&self, name: &str) -> Option<&CountryShape> {
        self.countries.iter().find(|c| c.name == name)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.countries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }
}

struct CountryCollector<'a> {
    name_key: &'a str,
    countries: Vec<CountryShape>,
    name: Option<String>,
    polygons: Vec<Vec<Ring>>,
    polygon: Option<Vec<Ring>>,
    ring: Ring,
}

impl<'a> CountryCollector<'a> {
    fn new(name_key: &'a str) -> Self {
        Self {
            name_key,
            countries: Vec::new(),
            name: None,
            polygons: Vec::new(),
            polygon: None,
            ring: Vec::new(),
        }
    }
}

impl GeomProcessor for CountryCollector<'_> {
    fn xy(&mut self, x: f64, y: f64, _idx: usize) -> GeozeroResult<()> {
        if self.polygon.is_some() {
            self.ring.push((x, y));
        }
        Ok(())
    }

    fn linestring_begin(&mut self, _tagged: bool, size: usize, _idx: usize) -> GeozeroResult<()> {
        self.ring = Vec::with_capacity(size);
        Ok(())
    }

    fn linestring_end(&mut self, _tagged: bool, _idx: usize) -> GeozeroResult<()> {
        let ring = std::mem::take(&mut self.ring);
        if let Some(polygon) = self.polygon.as_mut() {
            polygon.push(ring);
        }
        Ok(())
    }

    fn polygon_begin(&mut self, _tagged: bool, size: usize, _idx: usize) -> GeozeroResult<()> {
        self.polygon = Some(Vec::with_capacity(size));
        Ok(())
    }

    fn polygon_end(&mut self, _tagged: bool, _idx: usize) -> GeozeroResult<()> {
        if let Some(polygon) = self.polygon.take() {
            // An outline needs at least a triangle; holes alone draw nothing.
            if polygon.first().is_some_and(|outline| outline.len() >= 3) {
                self.polygons.push(polygon);
            }
        }
        Ok(())
    }
}

impl PropertyProcessor for CountryCollector<'_> {
    fn property(&mut self, _idx: usize, name: &str, value: &ColumnValue<'_>) -> GeozeroResult<bool> {
        if name == self.name_key {
            if let ColumnValue::String(display_name) = value {
                self.name = Some(display_name.to_string());
            }
        }
        Ok(false)
    }
}

impl FeatureProcessor for CountryCollector<'_> {
    fn feature_begin(&mut self, _idx: u64) -> GeozeroResult<()> {
        self.name = None;
        self.polygons.clear();
        Ok(())
    }

    fn feature_end(&mut self, idx: u64) -> GeozeroResult<()> {
        let polygons = std::mem::take(&mut self.polygons);
        if polygons.is_empty() {
            log::debug!("skipping feature {} without polygon geometry", idx);
            return Ok(());
        }
        let name = self.name.take().unwrap_or_else(|| {
            log::warn!("feature {} has no `{}` property", idx, self.name_key);
            String::new()
        });
        self.countries.push(CountryShape { name, polygons });
        Ok(())
    }
}
