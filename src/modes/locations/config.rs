use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::modes::locations::error::Result;
use crate::modes::locations::ident::{DEFAULT_MDA_CODE, IdCodec};

/// Settings describing the Modes export being processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Institution prefix of coded accession numbers.
    pub mda_code: String,
    /// Element name of one object record.
    pub record_tag: String,
    /// Child path from a record to its accession number.
    pub id_path: Vec<String>,
    /// Element name of a location record.
    pub location_tag: String,
    /// Attribute holding the location kind.
    pub kind_attribute: String,
    /// Reject malformed accession numbers instead of passing them through.
    pub strict_ids: bool,
    /// Require consecutive locations to abut exactly.
    pub strict_dates: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mda_code: DEFAULT_MDA_CODE.to_string(),
            record_tag: "Object".to_string(),
            id_path: vec!["ObjectIdentity".to_string(), "Number".to_string()],
            location_tag: "ObjectLocation".to_string(),
            kind_attribute: "elementtype".to_string(),
            strict_ids: true,
            strict_dates: true,
        }
    }
}

impl Config {
    /// Reads a JSON configuration file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn codec(&self) -> IdCodec {
        IdCodec::new(&self.mda_code)
    }
}
