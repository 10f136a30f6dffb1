use super::registry::SponsorRegistry;
use crate::format::FormatError;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::warn;

/// Persistence boundary for the registry document.
pub trait RegistryStore {
    fn read_registry(&self, path: &Path) -> Result<SponsorRegistry, FormatError>;
    fn write_registry(&self, path: &Path, registry: &SponsorRegistry) -> Result<(), FormatError>;
}

/// Stores the registry as pretty-printed JSON (two-space indent, sorted
/// group keys, UTF-8 left unescaped).
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRegistryStore;

impl JsonRegistryStore {
    pub fn from_reader<R: Read>(reader: R) -> Result<SponsorRegistry, FormatError> {
        let registry: SponsorRegistry = serde_json::from_reader(reader)?;
        for (name, keys) in registry.cross_group_duplicates() {
            warn!(name, keys = keys.join(", "), "sponsor filed under several keys");
        }
        Ok(registry)
    }

    pub fn to_writer<W: Write>(mut writer: W, registry: &SponsorRegistry) -> Result<(), FormatError> {
        serde_json::to_writer_pretty(&mut writer, registry)?;
        writer
            .write_all(b"\n")
            .and_then(|()| writer.flush())
            .map_err(serde_json::Error::io)?;
        Ok(())
    }
}

impl RegistryStore for JsonRegistryStore {
    fn read_registry(&self, path: &Path) -> Result<SponsorRegistry, FormatError> {
        let file = File::open(path).map_err(FormatError::io(path))?;
        Self::from_reader(BufReader::new(file))
    }

    fn write_registry(&self, path: &Path, registry: &SponsorRegistry) -> Result<(), FormatError> {
        let file = File::create(path).map_err(FormatError::io(path))?;
        Self::to_writer(BufWriter::new(file), registry)
    }
}
