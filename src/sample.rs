use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::errors::{ModError, ModResult};
use crate::io::{FieldReader, FieldWriter};
use crate::utils::SAMPLE_NAME_LEN;

/// One instrument slot: header metadata plus the raw signed 8-bit PCM payload
///
/// On disk every length and offset is stored as a 16-bit word count; here they
/// are byte counts. The sample length is not a field of its own: it is always
/// `data.len()`, so header and payload cannot disagree.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub name: String,
    /// Signed nibble, -8..=7
    pub fine_tune: i8,
    /// 0..=64
    pub volume: u8,
    /// Loop start in bytes
    pub repeat_start: u32,
    /// Loop length in bytes
    pub repeat_length: u32,
    pub data: Vec<u8>,
}

impl Sample {
    pub fn length_in_bytes(&self) -> usize {
        self.data.len()
    }

    /// Unused slot: no payload bytes on disk
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// A repeat length of one word (or zero) means "play once"
    pub fn has_loop(&self) -> bool {
        self.repeat_length > 2
    }

    /// Write the 30-byte header. Byte counts are halved back to word counts.
    pub fn write_header<W: Write>(&self, writer: &mut FieldWriter<W>, index: usize) -> ModResult<()> {
        let field = |what: &str| format!("sample {} {}", index, what);

        writer.write_fixed_text(&field("name"), &self.name, SAMPLE_NAME_LEN)?;
        writer.write_u16_be(&field("length"), to_words(&field("length"), self.data.len())?)?;
        writer.write_signed_nibble(&field("fine tune"), self.fine_tune)?;
        writer.write_u8(&field("volume"), self.volume)?;
        writer.write_u16_be(
            &field("repeat start"),
            to_words(&field("repeat start"), self.repeat_start as usize)?,
        )?;
        writer.write_u16_be(
            &field("repeat length"),
            to_words(&field("repeat length"), self.repeat_length as usize)?,
        )?;
        Ok(())
    }

    /// Write the payload; empty samples write nothing
    pub fn write_payload<W: Write>(&self, writer: &mut FieldWriter<W>, index: usize) -> ModResult<()> {
        if self.data.is_empty() {
            return Ok(());
        }
        writer.write_exact(&format!("sample {} data", index), &self.data)
    }
}

/// A sample header as read from disk, before its payload has been read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleHeader {
    pub name: String,
    pub length_in_bytes: usize,
    pub fine_tune: i8,
    pub volume: u8,
    pub repeat_start: u32,
    pub repeat_length: u32,
}

impl SampleHeader {
    /// Read the 30-byte header. Word counts are doubled into byte counts.
    pub fn read<R: Read>(reader: &mut FieldReader<R>, index: usize) -> ModResult<Self> {
        let field = |what: &str| format!("sample {} {}", index, what);

        let name = reader.read_fixed_text(&field("name"), SAMPLE_NAME_LEN)?;
        let length = reader.read_u16_be(&field("length"))?;
        let fine_tune = reader.read_low_nibble(&field("fine tune"))?;
        let volume = reader.read_u8(&field("volume"))?;
        let repeat_start = reader.read_u16_be(&field("repeat start"))?;
        let repeat_length = reader.read_u16_be(&field("repeat length"))?;

        Ok(Self {
            name,
            length_in_bytes: usize::from(length) * 2,
            fine_tune,
            volume,
            repeat_start: u32::from(repeat_start) * 2,
            repeat_length: u32::from(repeat_length) * 2,
        })
    }

    /// Read exactly `length_in_bytes` of payload and complete the sample
    pub fn read_payload<R: Read>(self, reader: &mut FieldReader<R>, index: usize) -> ModResult<Sample> {
        let data = if self.length_in_bytes > 0 {
            reader.read_exact(&format!("sample {} data", index), self.length_in_bytes)?
        } else {
            Vec::new()
        };

        Ok(Sample {
            name: self.name,
            fine_tune: self.fine_tune,
            volume: self.volume,
            repeat_start: self.repeat_start,
            repeat_length: self.repeat_length,
            data,
        })
    }
}

fn to_words(field: &str, bytes: usize) -> ModResult<u16> {
    u16::try_from(bytes / 2).map_err(|_| ModError::ValidationFailed {
        field: field.to_string(),
        reason: format!("{} bytes does not fit a 16-bit word count", bytes),
    })
}
