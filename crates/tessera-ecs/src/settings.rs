use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::DEFAULT_MAX_ENTITIES;

/// Construction parameters for a [`World`](crate::world::World), stored on disk as RON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    /// Number of entity ids available. Ids are handed out from `1..=max_entities`.
    pub max_entities: u32,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("unable to access settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("unable to parse settings: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("unable to serialize settings: {0}")]
    Serialize(#[from] ron::Error),
    #[error("max_entities must be in 1..{}, got {0}", u32::MAX)]
    InvalidMaxEntities(u32),
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            max_entities: DEFAULT_MAX_ENTITIES,
        }
    }
}

impl WorldSettings {
    /// Reads and validates settings from a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let settings = ron::de::from_reader::<_, WorldSettings>(reader)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parses and validates settings from a RON string.
    pub fn from_ron_str(data: &str) -> Result<Self, SettingsError> {
        let settings = ron::from_str::<WorldSettings>(data)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        ron::ser::to_writer_pretty(writer, self, PrettyConfig::default())?;
        Ok(())
    }

    /// Checks the settings describe a world that can actually be built. The entity id table has
    /// `max_entities + 1` slots, so `u32::MAX` is rejected along with zero.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.max_entities == 0 || self.max_entities == u32::MAX {
            return Err(SettingsError::InvalidMaxEntities(self.max_entities));
        }
        Ok(())
    }
}
