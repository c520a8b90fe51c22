pub mod errors;
pub mod io;
pub mod pattern;
pub mod sample;
pub mod traits;
pub mod utils;
pub mod validation;

pub use errors::*;
pub use io::*;
pub use pattern::*;
pub use sample::*;
pub use traits::*;
pub use utils::{is_mod, MOD_MAGIC};
pub use validation::*;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::utils::{
    fixed_array, HEADER_SIZE, PATTERN_SIZE, RESTART_BYTE, SAMPLE_COUNT, SEQUENCE_LEN, TITLE_LEN,
};

/// A decoded 31-sample "M.K." module
///
/// The pattern count and each sample's length are not stored separately: the
/// file derives them from the sequence table and the sample headers, and this
/// model derives them from `sequence` and `Sample::data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub samples: [Sample; SAMPLE_COUNT],
    /// Number of sequence entries that are played, 1..=128
    pub song_length: u8,
    /// Pattern indices in play order; entries past `song_length` are padding
    #[serde(with = "fixed_array")]
    pub sequence: [u8; SEQUENCE_LEN],
    /// Patterns in file order; `sequence` refers to them by position
    pub patterns: Vec<Pattern>,
}

impl Default for Module {
    /// The smallest encodable module: one blank pattern played once
    fn default() -> Self {
        Self {
            name: String::new(),
            samples: Default::default(),
            song_length: 1,
            sequence: [0; SEQUENCE_LEN],
            patterns: vec![Pattern::new()],
        }
    }
}

impl Module {
    /// Decode a module from a byte stream with default validation
    pub fn decode<R: Read>(reader: R) -> ModResult<Self> {
        Self::decode_with_config(reader, &ValidationConfig::default())
    }

    /// Decode a module from a byte stream with custom validation configuration
    pub fn decode_with_config<R: Read>(reader: R, config: &ValidationConfig) -> ModResult<Self> {
        let mut reader = FieldReader::new(reader);
        Self::read_fields(&mut reader, config)
    }

    /// Validate, then encode to a byte stream
    pub fn encode<W: Write>(&self, writer: W) -> ModResult<()> {
        self.encode_with_config(writer, &ValidationConfig::default())
    }

    /// Validate with a custom configuration, then encode to a byte stream
    pub fn encode_with_config<W: Write>(&self, writer: W, config: &ValidationConfig) -> ModResult<()> {
        self.validate(config)?;
        let mut writer = FieldWriter::new(writer);
        self.write_fields(&mut writer)
    }

    /// Decode a module file with default validation
    pub fn from_path<P: AsRef<Path>>(path: P) -> ModResult<Self> {
        Self::from_path_with_config(path, &ValidationConfig::default())
    }

    /// Decode a module file with custom validation configuration
    pub fn from_path_with_config<P: AsRef<Path>>(path: P, config: &ValidationConfig) -> ModResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| file_error(path, e))?;
        Self::decode_with_config(BufReader::new(file), config)
    }

    /// Validate, then write the module to a file.
    /// The file is not created when validation fails.
    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> ModResult<()> {
        let path = path.as_ref();
        self.quick_validate()?;
        let file = File::create(path).map_err(|e| file_error(path, e))?;
        let mut writer = FieldWriter::new(BufWriter::new(file));
        self.write_fields(&mut writer)
    }

    /// Number of patterns the sequence table reaches: one past its largest entry
    pub fn pattern_count(&self) -> usize {
        derived_pattern_count(&self.sequence)
    }

    /// The sequence entries that are actually played
    pub fn played_sequence(&self) -> &[u8] {
        let len = usize::from(self.song_length).min(SEQUENCE_LEN);
        &self.sequence[..len]
    }

    /// Sample slots that carry a payload
    pub fn used_sample_count(&self) -> usize {
        self.samples.iter().filter(|s| !s.is_empty()).count()
    }

    /// Exact number of bytes `encode` writes for this module
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE
            + self.patterns.len() * PATTERN_SIZE
            + self.samples.iter().map(Sample::length_in_bytes).sum::<usize>()
    }

    /// Validate this module with default configuration
    pub fn quick_validate(&self) -> ModResult<()> {
        ModValidate::quick_validate(self)
    }

    fn read_fields<R: Read>(reader: &mut FieldReader<R>, config: &ValidationConfig) -> ModResult<Self> {
        let name = reader.read_fixed_text("title", TITLE_LEN)?;
        debug!(title = %name, "decoding module");

        let mut headers = Vec::with_capacity(SAMPLE_COUNT);
        for index in 0..SAMPLE_COUNT {
            headers.push(SampleHeader::read(reader, index)?);
        }

        let song_length = reader.read_u8("song_length")?;

        let restart_byte = reader.read_u8("restart_byte")?;
        SongValidator::validate_restart_byte(restart_byte, config)?;
        if restart_byte != RESTART_BYTE {
            warn!(
                value = restart_byte,
                "restart byte is not {}, it will be rewritten on encode", RESTART_BYTE
            );
        }

        let mut sequence = [0u8; SEQUENCE_LEN];
        reader.read_into("sequence", &mut sequence)?;

        let magic_offset = reader.position();
        let mut magic = [0u8; 4];
        reader.read_into("magic", &mut magic)?;
        if magic != MOD_MAGIC {
            return Err(ModError::FormatMismatch {
                expected: String::from_utf8_lossy(&MOD_MAGIC).to_string(),
                found: String::from_utf8_lossy(&magic).to_string(),
                offset: magic_offset,
            });
        }

        let pattern_count = derived_pattern_count(&sequence);
        let played = usize::from(song_length).min(SEQUENCE_LEN);
        if sequence[played..].iter().any(|&entry| entry != 0) {
            warn!(
                song_length,
                "sequence entries past the song length are not zero; they are kept as padding"
            );
        }

        let mut patterns = Vec::with_capacity(pattern_count);
        for index in 0..pattern_count {
            trace!(index, offset = reader.position(), "reading pattern");
            patterns.push(Pattern::read(reader, index)?);
        }

        let mut samples: [Sample; SAMPLE_COUNT] = Default::default();
        for (index, (slot, header)) in samples.iter_mut().zip(headers).enumerate() {
            if header.length_in_bytes > 0 {
                trace!(index, length = header.length_in_bytes, "reading sample data");
            }
            *slot = header.read_payload(reader, index)?;
        }

        let module = Module {
            name,
            samples,
            song_length,
            sequence,
            patterns,
        };
        module.validate(config)?;

        debug!(
            patterns = module.patterns.len(),
            samples = module.used_sample_count(),
            bytes = reader.position(),
            "decoded module"
        );
        Ok(module)
    }

    /// Write every field in file order. Callers validate first.
    fn write_fields<W: Write>(&self, writer: &mut FieldWriter<W>) -> ModResult<()> {
        debug!(title = %self.name, bytes = self.encoded_len(), "encoding module");

        writer.write_fixed_text("title", &self.name, TITLE_LEN)?;
        for (index, sample) in self.samples.iter().enumerate() {
            sample.write_header(writer, index)?;
        }

        writer.write_u8("song_length", self.song_length)?;
        writer.write_u8("restart_byte", RESTART_BYTE)?;
        writer.write_exact("sequence", &self.sequence)?;
        writer.write_exact("magic", &MOD_MAGIC)?;

        for (index, pattern) in self.patterns.iter().enumerate() {
            trace!(index, offset = writer.position(), "writing pattern");
            pattern.write(writer, index)?;
        }

        for (index, sample) in self.samples.iter().enumerate() {
            sample.write_payload(writer, index)?;
        }

        writer.flush()?;
        debug!(bytes = writer.position(), "encoded module");
        Ok(())
    }
}

impl ModParser for Module {
    fn from_bytes(data: &mut Bytes) -> ModResult<Self> {
        let mut reader = FieldReader::new(&data[..]);
        let module = Module::read_fields(&mut reader, &ValidationConfig::default())?;
        let consumed = reader.position();
        data.advance(consumed);
        Ok(module)
    }
}

impl ModWriter for Module {
    fn to_bytes(&self, buffer: &mut BytesMut) -> ModResult<()> {
        buffer.reserve(self.encoded_len());
        self.encode((&mut *buffer).writer())
    }
}

/// Decode a module from a byte stream with default validation
pub fn decode<R: Read>(reader: R) -> ModResult<Module> {
    Module::decode(reader)
}

/// Validate a module, then encode it to a byte stream
pub fn encode<W: Write>(module: &Module, writer: W) -> ModResult<()> {
    module.encode(writer)
}

fn derived_pattern_count(sequence: &[u8; SEQUENCE_LEN]) -> usize {
    sequence.iter().copied().max().map_or(0, usize::from) + 1
}

fn file_error(path: &Path, err: std::io::Error) -> ModError {
    match err.kind() {
        std::io::ErrorKind::NotFound => ModError::FileNotFound {
            path: path.display().to_string(),
        },
        std::io::ErrorKind::PermissionDenied => ModError::PermissionDenied {
            path: path.display().to_string(),
        },
        kind => ModError::Io {
            kind,
            reason: format!("{}: {}", path.display(), err),
        },
    }
}
