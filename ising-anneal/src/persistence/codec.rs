use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use super::csv::CsvCodec;
use super::state::{SimulationState, STATE_VERSION};
use crate::error::{Result, SimError};

/// On-disk encodings of a [`SimulationState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// bincode inside a gzip stream.
    CompressedBinary,
    /// Plain bincode.
    Binary,
    Json,
    /// Named MessagePack inside a gzip stream.
    Archive,
    /// Sectioned comma-delimited tables.
    Csv,
}

impl Format {
    pub const ALL: [Format; 5] = [
        Self::CompressedBinary,
        Self::Binary,
        Self::Json,
        Self::Archive,
        Self::Csv,
    ];

    /// Canonical name, also used as the file extension.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CompressedBinary => "bin.gz",
            Self::Binary => "bin",
            Self::Json => "json",
            Self::Archive => "msgpack.gz",
            Self::Csv => "csv",
        }
    }

    /// Guess the format from a file name's extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        // Longest suffixes first so `.bin.gz` is not read as plain gzip.
        for format in [Self::CompressedBinary, Self::Archive] {
            if name.ends_with(&format!(".{}", format.as_str())) {
                return Ok(format);
            }
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::try_from(ext)
    }

    pub fn codec(&self) -> Box<dyn StateCodec> {
        match self {
            Self::CompressedBinary => Box::new(BincodeCodec { compressed: true }),
            Self::Binary => Box::new(BincodeCodec { compressed: false }),
            Self::Json => Box::new(JsonCodec),
            Self::Archive => Box::new(MsgPackCodec),
            Self::Csv => Box::new(CsvCodec),
        }
    }
}

impl TryFrom<&str> for Format {
    type Error = SimError;

    fn try_from(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bin.gz" | "h5" | "compressed_binary" => Ok(Self::CompressedBinary),
            "bin" | "pickle" | "binary" => Ok(Self::Binary),
            "json" => Ok(Self::Json),
            "msgpack.gz" | "npz" | "archive" => Ok(Self::Archive),
            "csv" => Ok(Self::Csv),
            _ => Err(SimError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Serializes a [`SimulationState`] to and from a byte stream.
pub trait StateCodec {
    fn format(&self) -> Format;

    fn encode(&self, state: &SimulationState, writer: &mut dyn Write) -> Result<()>;

    fn decode(&self, reader: &mut dyn Read) -> Result<SimulationState>;
}

pub struct BincodeCodec {
    pub compressed: bool,
}

impl StateCodec for BincodeCodec {
    fn format(&self) -> Format {
        if self.compressed {
            Format::CompressedBinary
        } else {
            Format::Binary
        }
    }

    fn encode(&self, state: &SimulationState, writer: &mut dyn Write) -> Result<()> {
        if self.compressed {
            let mut gz = GzEncoder::new(writer, Compression::default());
            bincode::serialize_into(&mut gz, state)?;
            gz.finish()?;
        } else {
            bincode::serialize_into(writer, state)?;
        }
        Ok(())
    }

    fn decode(&self, reader: &mut dyn Read) -> Result<SimulationState> {
        let state = if self.compressed {
            bincode::deserialize_from(GzDecoder::new(reader))?
        } else {
            bincode::deserialize_from(reader)?
        };
        Ok(state)
    }
}

pub struct JsonCodec;

impl StateCodec for JsonCodec {
    fn format(&self) -> Format {
        Format::Json
    }

    fn encode(&self, state: &SimulationState, writer: &mut dyn Write) -> Result<()> {
        serde_json::to_writer_pretty(writer, state)?;
        Ok(())
    }

    fn decode(&self, reader: &mut dyn Read) -> Result<SimulationState> {
        Ok(serde_json::from_reader(reader)?)
    }
}

pub struct MsgPackCodec;

impl StateCodec for MsgPackCodec {
    fn format(&self) -> Format {
        Format::Archive
    }

    fn encode(&self, state: &SimulationState, writer: &mut dyn Write) -> Result<()> {
        let mut gz = GzEncoder::new(writer, Compression::default());
        rmp_serde::encode::write_named(&mut gz, state)?;
        gz.finish()?;
        Ok(())
    }

    fn decode(&self, reader: &mut dyn Read) -> Result<SimulationState> {
        Ok(rmp_serde::from_read(GzDecoder::new(reader))?)
    }
}

pub(crate) fn check_version(state: &SimulationState) -> Result<()> {
    if state.version != STATE_VERSION {
        return Err(SimError::InvalidState(format!(
            "state version {} is not supported (expected {STATE_VERSION})",
            state.version
        )));
    }
    Ok(())
}

/// Encode `state` into `path`.
pub fn write_state(state: &SimulationState, path: &Path, format: Format) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    format.codec().encode(state, &mut writer)?;
    writer.flush()?;
    log::info!(
        "saved {}x{} state to {} ({})",
        state.parameters.grid_size,
        state.parameters.grid_size,
        path.display(),
        format.as_str()
    );
    Ok(())
}

/// Decode a state from `path`. The result is version-checked but not yet
/// validated against a lattice.
pub fn read_state(path: &Path, format: Format) -> Result<SimulationState> {
    let mut reader = BufReader::new(File::open(path)?);
    let state = format.codec().decode(&mut reader)?;
    check_version(&state)?;
    log::info!("loaded state from {} ({})", path.display(), format.as_str());
    Ok(state)
}
