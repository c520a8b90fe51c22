use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::errors::ModResult;
use crate::io::{FieldReader, FieldWriter};
use crate::utils::{fixed_array, CHANNELS, NOTE_SIZE, PATTERN_SIZE, ROWS_PER_PATTERN};

/// One channel's event within one pattern row
///
/// On disk a note is four bytes `d0 d1 d2 d3`:
///
/// ```text
///  d0        d1        d2        d3
/// iiii pppp pppp pppp iiii eeee eeee eeee
/// ^hi  ^period 11..0  ^lo  ^effect 11..0
/// ```
///
/// The instrument number is split: its high nibble lives in `d0`, its low
/// nibble in `d2`. Period and effect are confined to 12 bits each.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Note {
    pub instrument: u8,
    pub period: u16,
    pub effect: u16,
}

impl Note {
    pub fn new(instrument: u8, period: u16, effect: u16) -> Self {
        Self {
            instrument,
            period,
            effect,
        }
    }

    /// Unpack a note from its 4-byte cell. Inverse of `to_bytes`.
    pub fn from_bytes(cell: [u8; NOTE_SIZE]) -> Self {
        let [d0, d1, d2, d3] = cell;
        Self {
            instrument: (d0 & 0xF0) | ((d2 & 0xF0) >> 4),
            period: (u16::from(d0 & 0x0F) << 8) | u16::from(d1),
            effect: (u16::from(d2 & 0x0F) << 8) | u16::from(d3),
        }
    }

    /// Pack a note into its 4-byte cell. Inverse of `from_bytes`.
    ///
    /// Bits of `period` and `effect` above bit 11 are dropped; validation
    /// rejects such notes before an encode gets here.
    pub fn to_bytes(&self) -> [u8; NOTE_SIZE] {
        [
            (self.instrument & 0xF0) | ((self.period >> 8) & 0x0F) as u8,
            (self.period & 0xFF) as u8,
            ((self.instrument & 0x0F) << 4) | ((self.effect >> 8) & 0x0F) as u8,
            (self.effect & 0xFF) as u8,
        ]
    }

    /// Effect number, the top nibble of the 12-bit command
    pub fn effect_type(&self) -> u8 {
        ((self.effect >> 8) & 0x0F) as u8
    }

    /// Effect parameter, the low byte of the 12-bit command
    pub fn effect_param(&self) -> u8 {
        (self.effect & 0xFF) as u8
    }

    pub fn is_empty(&self) -> bool {
        self.instrument == 0 && self.period == 0 && self.effect == 0
    }
}

pub type Row = [Note; CHANNELS];

/// A 64-row by 4-channel grid of notes. The size is fixed by the type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    #[serde(with = "fixed_array")]
    pub rows: [Row; ROWS_PER_PATTERN],
}

impl Default for Pattern {
    fn default() -> Self {
        Self::new()
    }
}

impl Pattern {
    /// A pattern where every note is empty
    pub fn new() -> Self {
        Self {
            rows: [[Note::default(); CHANNELS]; ROWS_PER_PATTERN],
        }
    }

    pub fn row(&self, row: usize) -> &Row {
        &self.rows[row]
    }

    pub fn note(&self, row: usize, channel: usize) -> &Note {
        &self.rows[row][channel]
    }

    pub fn note_mut(&mut self, row: usize, channel: usize) -> &mut Note {
        &mut self.rows[row][channel]
    }

    /// Notes in file order: row by row, channel by channel
    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.rows.iter().flat_map(|row| row.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.notes().all(Note::is_empty)
    }

    pub fn from_bytes(data: &[u8; PATTERN_SIZE]) -> Self {
        let mut pattern = Self::new();
        let cells = data.chunks_exact(NOTE_SIZE);
        for (note, cell) in pattern.rows.iter_mut().flatten().zip(cells) {
            *note = Note::from_bytes([cell[0], cell[1], cell[2], cell[3]]);
        }
        pattern
    }

    pub fn to_bytes(&self) -> [u8; PATTERN_SIZE] {
        let mut data = [0u8; PATTERN_SIZE];
        for (cell, note) in data.chunks_exact_mut(NOTE_SIZE).zip(self.notes()) {
            cell.copy_from_slice(&note.to_bytes());
        }
        data
    }

    pub fn read<R: Read>(reader: &mut FieldReader<R>, index: usize) -> ModResult<Self> {
        let mut data = [0u8; PATTERN_SIZE];
        reader.read_into(&format!("pattern {}", index), &mut data)?;
        Ok(Self::from_bytes(&data))
    }

    pub fn write<W: Write>(&self, writer: &mut FieldWriter<W>, index: usize) -> ModResult<()> {
        writer.write_exact(&format!("pattern {}", index), &self.to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ModError;
    use proptest::prelude::*;
    use std::io::Cursor;

    #[test]
    fn test_note_unpack_known_cell() {
        let note = Note::from_bytes([0x0F, 0x96, 0xA5, 0xC3]);
        assert_eq!(note.instrument, 0x0A);
        assert_eq!(note.period, 0xF96);
        assert_eq!(note.effect, 0x5C3);
        assert_eq!(note.to_bytes(), [0x0F, 0x96, 0xA5, 0xC3]);
    }

    #[test]
    fn test_note_instrument_split_across_bytes() {
        // Instrument 0x1F: high nibble in d0, low nibble in d2
        let note = Note::new(0x1F, 0x1AC, 0xC40);
        assert_eq!(note.to_bytes(), [0x11, 0xAC, 0xFC, 0x40]);
        assert_eq!(Note::from_bytes([0x11, 0xAC, 0xFC, 0x40]), note);
    }

    #[test]
    fn test_note_effect_accessors() {
        let note = Note::new(1, 428, 0xC40);
        assert_eq!(note.effect_type(), 0xC);
        assert_eq!(note.effect_param(), 0x40);
        assert!(!note.is_empty());
        assert!(Note::default().is_empty());
    }

    #[test]
    fn test_note_drops_bits_above_twelve() {
        let note = Note::new(0, 0xFFFF, 0x1ABC);
        let unpacked = Note::from_bytes(note.to_bytes());
        assert_eq!(unpacked.period, 0xFFF);
        assert_eq!(unpacked.effect, 0xABC);
    }

    #[test]
    fn test_pattern_cell_order() {
        let mut pattern = Pattern::new();
        *pattern.note_mut(0, 1) = Note::new(2, 0x123, 0x456);
        *pattern.note_mut(63, 3) = Note::new(0xFF, 0xFFF, 0xFFF);

        let data = pattern.to_bytes();
        // Row 0, channel 1 is the second cell
        assert_eq!(&data[4..8], &[0x01, 0x23, 0x24, 0x56]);
        assert_eq!(&data[1020..1024], &[0xFF, 0xFF, 0xFF, 0xFF]);
        assert!(data[..4].iter().all(|&b| b == 0));

        let parsed = Pattern::from_bytes(&data);
        assert_eq!(parsed, pattern);
        assert_eq!(parsed.note(0, 1).instrument, 2);
        assert_eq!(parsed.row(63)[3].period, 0xFFF);
    }

    #[test]
    fn test_pattern_is_empty() {
        let mut pattern = Pattern::new();
        assert!(pattern.is_empty());
        pattern.note_mut(10, 2).effect = 0xF06;
        assert!(!pattern.is_empty());
    }

    #[test]
    fn test_pattern_read_short() {
        let mut reader = FieldReader::new(Cursor::new(vec![0u8; 1000]));
        let result = Pattern::read(&mut reader, 5);
        match result.unwrap_err() {
            ModError::ShortRead { field, needed, available, .. } => {
                assert_eq!(field, "pattern 5");
                assert_eq!(needed, 1024);
                assert_eq!(available, 1000);
            },
            other => panic!("Expected ShortRead error, got {:?}", other),
        }
    }

    #[test]
    fn test_pattern_stream_round_trip() {
        let mut pattern = Pattern::new();
        for row in 0..ROWS_PER_PATTERN {
            *pattern.note_mut(row, row % CHANNELS) = Note::new(row as u8 % 32, 113 + row as u16, 0xA0F);
        }

        let mut writer = FieldWriter::new(Vec::new());
        pattern.write(&mut writer, 0).unwrap();
        let bytes = writer.into_inner();
        assert_eq!(bytes.len(), PATTERN_SIZE);

        let mut reader = FieldReader::new(Cursor::new(bytes));
        assert_eq!(Pattern::read(&mut reader, 0).unwrap(), pattern);
    }

    #[test]
    fn test_pattern_json_has_64_rows() {
        let pattern = Pattern::new();
        let json = serde_json::to_value(&pattern).unwrap();
        assert_eq!(json["rows"].as_array().unwrap().len(), 64);

        let parsed: Pattern = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, pattern);
    }

    proptest! {
        #[test]
        fn test_note_packing_bijection(cell in any::<[u8; 4]>()) {
            prop_assert_eq!(Note::from_bytes(cell).to_bytes(), cell);
        }

        #[test]
        fn test_note_unpacking_bijection(
            instrument in any::<u8>(),
            period in 0u16..=0xFFF,
            effect in 0u16..=0xFFF
        ) {
            let note = Note::new(instrument, period, effect);
            prop_assert_eq!(Note::from_bytes(note.to_bytes()), note);
        }
    }
}
