//! Section property lookup keyed by profile name.
//!
//! The table is built once, wrapped in an [`Arc`](std::sync::Arc) and handed to
//! both the [`Structure`](crate::Structure) and the
//! [`MaterialBank`](crate::MaterialBank); it is never mutated afterwards.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{ModelError, SectionTableError};

/// Cross-section properties of a profile in millimetre units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectionProperties {
    /// Cross-sectional area in mm².
    pub area: f64,
    /// Second moment of area about the strong axis in mm⁴.
    pub iyy: f64,
    /// Second moment of area about the weak axis in mm⁴.
    pub izz: f64,
    /// Torsional (polar) constant in mm⁴.
    pub polar: f64,
}

impl SectionProperties {
    /// Create a section from its four properties.
    #[must_use]
    pub const fn new(area: f64, iyy: f64, izz: f64, polar: f64) -> Self {
        Self {
            area,
            iyy,
            izz,
            polar,
        }
    }

    /// The smaller bending inertia, which governs flexural buckling.
    #[must_use]
    pub fn min_inertia(&self) -> f64 {
        self.iyy.min(self.izz)
    }
}

// name, area [mm²], Iyy [mm⁴], Izz [mm⁴], It [mm⁴]
const BUILTIN: &[(&str, f64, f64, f64, f64)] = &[
    ("IPE80", 764.0, 80.14e4, 8.49e4, 0.70e4),
    ("IPE100", 1032.0, 171.0e4, 15.92e4, 1.20e4),
    ("IPE120", 1321.0, 317.8e4, 27.67e4, 1.74e4),
    ("IPE140", 1643.0, 541.2e4, 44.92e4, 2.45e4),
    ("IPE160", 2009.0, 869.3e4, 68.31e4, 3.60e4),
    ("IPE180", 2395.0, 1317.0e4, 100.9e4, 4.79e4),
    ("IPE200", 2848.0, 1943.0e4, 142.4e4, 6.98e4),
    ("IPE220", 3337.0, 2772.0e4, 204.9e4, 9.07e4),
    ("IPE240", 3912.0, 3892.0e4, 283.6e4, 12.88e4),
    ("IPE270", 4595.0, 5790.0e4, 419.9e4, 15.94e4),
    ("IPE300", 5381.0, 8356.0e4, 603.8e4, 20.12e4),
    ("HEA100", 2124.0, 349.2e4, 133.8e4, 5.24e4),
    ("HEA120", 2534.0, 606.2e4, 230.9e4, 5.99e4),
    ("HEA140", 3142.0, 1033.0e4, 389.3e4, 8.13e4),
    ("HEA160", 3877.0, 1673.0e4, 615.6e4, 12.19e4),
    ("HEA180", 4525.0, 2510.0e4, 924.6e4, 14.80e4),
    ("HEA200", 5383.0, 3692.0e4, 1336.0e4, 20.98e4),
];

/// Read-only table from profile name to [`SectionProperties`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SectionTable {
    profiles: BTreeMap<String, SectionProperties>,
}

impl SectionTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// European IPE and HEA profiles bundled with the crate.
    ///
    /// # Examples
    /// ```
    /// use trussreuse::SectionTable;
    ///
    /// let table = SectionTable::builtin();
    /// assert_eq!(table.get("IPE200").map(|s| s.area), Some(2848.0));
    /// ```
    #[must_use]
    pub fn builtin() -> Self {
        let mut table = Self::new();
        for &(name, area, iyy, izz, polar) in BUILTIN {
            table.insert(name, SectionProperties::new(area, iyy, izz, polar));
        }
        table
    }

    /// Parse rows of `name,area,Iyy,Izz,polarInertia`.
    ///
    /// Blank lines and lines starting with `#` are ignored, as is a leading header
    /// row whose area field is not numeric.
    ///
    /// # Errors
    ///
    /// Returns [`SectionTableError`] for rows with the wrong number of fields,
    /// unparsable numbers or non-positive properties.
    pub fn parse(text: &str) -> Result<Self, SectionTableError> {
        let mut table = Self::new();
        let mut seen_row = false;
        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let row = raw.trim();
            if row.is_empty() || row.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = row.split(',').map(str::trim).collect();
            if fields.len() != 5 {
                return Err(SectionTableError::FieldCount {
                    line,
                    found: fields.len(),
                });
            }
            if !seen_row && fields[1].parse::<f64>().is_err() {
                seen_row = true;
                continue;
            }
            seen_row = true;
            let mut values = [0.0; 4];
            for (slot, field) in values.iter_mut().zip(&fields[1..]) {
                *slot = field
                    .parse::<f64>()
                    .map_err(|_| SectionTableError::InvalidNumber {
                        line,
                        value: (*field).to_string(),
                    })?;
            }
            if values.iter().any(|value| *value <= 0.0 || !value.is_finite()) {
                return Err(SectionTableError::NonPositive {
                    line,
                    name: fields[0].to_string(),
                });
            }
            let [area, iyy, izz, polar] = values;
            table.insert(fields[0], SectionProperties::new(area, iyy, izz, polar));
        }
        Ok(table)
    }

    /// Read and parse a table from disk.
    ///
    /// # Errors
    ///
    /// Returns [`SectionTableError::Io`] when the file cannot be read and any
    /// error produced by [`SectionTable::parse`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SectionTableError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SectionTableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::parse(&text)?;
        log::debug!("loaded {} profiles from {}", table.len(), path.display());
        Ok(table)
    }

    /// Add or replace a profile.
    pub fn insert(&mut self, name: impl Into<String>, section: SectionProperties) {
        self.profiles.insert(name.into(), section);
    }

    /// Look up a profile.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SectionProperties> {
        self.profiles.get(name)
    }

    /// Look up a profile, treating a missing name as a configuration error.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownProfile`] when `name` is not in the table.
    pub fn lookup(&self, name: &str) -> Result<SectionProperties, ModelError> {
        self.get(name)
            .copied()
            .ok_or_else(|| ModelError::UnknownProfile(name.to_string()))
    }

    /// Number of profiles in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Whether the table holds no profiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Iterate profiles in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SectionProperties)> {
        self.profiles.iter().map(|(name, section)| (name.as_str(), section))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_and_skips_header_and_comments() {
        let text = "name,area,Iyy,Izz,J\n# salvaged sections\n\nSHS100,1495,2.23e6,2.23e6,3.6e6\n";
        let table = SectionTable::parse(text).expect("table parses");
        assert_eq!(table.len(), 1);
        let section = table.get("SHS100").expect("profile present");
        assert!((section.area - 1495.0).abs() < f64::EPSILON);
        assert!((section.min_inertia() - 2.23e6).abs() < 1.0);
    }

    #[test]
    fn rejects_short_rows() {
        let error = SectionTable::parse("IPE200,2848,1943e4").expect_err("short row rejected");
        assert!(matches!(
            error,
            SectionTableError::FieldCount { line: 1, found: 3 }
        ));
    }

    #[test]
    fn rejects_bad_numbers_after_first_row() {
        let text = "IPE200,2848,1943e4,142.4e4,6.98e4\nIPE220,abc,1,1,1";
        let error = SectionTable::parse(text).expect_err("bad number rejected");
        assert!(matches!(error, SectionTableError::InvalidNumber { line: 2, .. }));
    }

    #[test]
    fn rejects_non_positive_properties() {
        let error = SectionTable::parse("X,0,1,1,1").expect_err("zero area rejected");
        assert!(matches!(error, SectionTableError::NonPositive { line: 1, .. }));
    }

    #[test]
    fn missing_profile_is_a_model_error() {
        let table = SectionTable::builtin();
        assert_eq!(
            table.lookup("UPN100"),
            Err(ModelError::UnknownProfile("UPN100".to_string()))
        );
    }

    #[test]
    fn builtin_weak_axis_governs_buckling() {
        let table = SectionTable::builtin();
        let ipe = table.lookup("IPE200").expect("builtin profile");
        assert!((ipe.min_inertia() - 142.4e4).abs() < 1.0e-6);
    }
}
