//! Module Test Data Builders
//!
//! Builder pattern implementations for generating module test data, both as
//! in-memory `Module`s and as raw bytes that can be corrupted on purpose.

use amiga_mod::{ModResult, Module, Note, Pattern, Sample, ValidationConfig};

/// Main builder for creating module test files with fluent API
#[derive(Debug)]
pub struct ModBuilder {
    title: String,
    song_length: Option<u8>,
    order: Vec<u8>,
    padding: Vec<(usize, u8)>,
    extra_patterns: usize,
    notes: Vec<(usize, usize, usize, Note)>,
    samples: Vec<(usize, SampleBuilder)>,
}

impl Default for ModBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ModBuilder {
    /// Create a new builder: one blank pattern played once, no samples
    pub fn new() -> Self {
        Self {
            title: String::new(),
            song_length: None,
            order: vec![0],
            padding: Vec::new(),
            extra_patterns: 0,
            notes: Vec::new(),
            samples: Vec::new(),
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// Set the played part of the sequence table; song length follows it
    /// unless set explicitly
    pub fn order(mut self, order: &[u8]) -> Self {
        self.order = order.to_vec();
        self
    }

    pub fn song_length(mut self, song_length: u8) -> Self {
        self.song_length = Some(song_length);
        self
    }

    /// Put a value in the sequence table past the played entries
    pub fn padding_entry(mut self, position: usize, pattern: u8) -> Self {
        self.padding.push((position, pattern));
        self
    }

    /// Append blank patterns that no sequence entry reaches
    pub fn extra_patterns(mut self, count: usize) -> Self {
        self.extra_patterns = count;
        self
    }

    pub fn note(mut self, pattern: usize, row: usize, channel: usize, note: Note) -> Self {
        self.notes.push((pattern, row, channel, note));
        self
    }

    pub fn sample<F>(mut self, slot: usize, f: F) -> Self
    where
        F: FnOnce(SampleBuilder) -> SampleBuilder,
    {
        self.samples.push((slot, f(SampleBuilder::default())));
        self
    }

    /// Build the module without validating it
    pub fn build(self) -> Module {
        let mut module = Module {
            name: self.title,
            song_length: self.song_length.unwrap_or(self.order.len() as u8),
            ..Module::default()
        };

        module.sequence[..self.order.len()].copy_from_slice(&self.order);
        for (position, pattern) in self.padding {
            module.sequence[position] = pattern;
        }

        let count = module.pattern_count() + self.extra_patterns;
        module.patterns = vec![Pattern::new(); count];
        for (pattern, row, channel, note) in self.notes {
            *module.patterns[pattern].note_mut(row, channel) = note;
        }

        for (slot, sample) in self.samples {
            module.samples[slot] = sample.build();
        }

        module
    }

    /// Build and encode with default validation
    pub fn build_bytes(self) -> ModResult<Vec<u8>> {
        self.build_bytes_with_config(&ValidationConfig::default())
    }

    pub fn build_bytes_with_config(self, config: &ValidationConfig) -> ModResult<Vec<u8>> {
        let module = self.build();
        let mut out = Vec::with_capacity(module.encoded_len());
        module.encode_with_config(&mut out, config)?;
        Ok(out)
    }
}

/// Builder for a single sample slot
#[derive(Debug, Default)]
pub struct SampleBuilder {
    name: String,
    fine_tune: i8,
    volume: u8,
    repeat_start: u32,
    repeat_length: u32,
    data: Vec<u8>,
}

impl SampleBuilder {
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn fine_tune(mut self, fine_tune: i8) -> Self {
        self.fine_tune = fine_tune;
        self
    }

    pub fn volume(mut self, volume: u8) -> Self {
        self.volume = volume;
        self
    }

    pub fn repeat(mut self, start: u32, length: u32) -> Self {
        self.repeat_start = start;
        self.repeat_length = length;
        self
    }

    /// Payload of `len` bytes forming a simple ramp
    pub fn ramp(mut self, len: usize) -> Self {
        self.data = (0..len).map(|i| (i % 256) as u8).collect();
        self
    }

    pub fn data(mut self, data: &[u8]) -> Self {
        self.data = data.to_vec();
        self
    }

    pub fn build(self) -> Sample {
        Sample {
            name: self.name,
            fine_tune: self.fine_tune,
            volume: self.volume,
            repeat_start: self.repeat_start,
            repeat_length: self.repeat_length,
            data: self.data,
        }
    }
}

/// Ready-made modules for common scenarios
pub struct ModGenerators;

impl ModGenerators {
    /// A short song using three patterns, two samples and a few notes
    pub fn small_song() -> ModBuilder {
        ModBuilder::new()
            .title("builder song")
            .order(&[0, 1, 0, 2])
            .note(0, 0, 0, Note::new(1, 428, 0x000))
            .note(1, 16, 2, Note::new(2, 214, 0xC20))
            .note(2, 63, 3, Note::new(0x1F, 0x358, 0xF06))
            .sample(0, |s| s.name("bass").volume(64).repeat(0, 2).ramp(64))
            .sample(1, |s| s.name("lead").volume(40).fine_tune(-3).repeat(16, 32).ramp(48))
    }

    /// Reference values of sample 9 ("TECH-CRASH") of a real module
    pub fn tech_crash() -> ModBuilder {
        ModBuilder::new()
            .title("01-WARM")
            .sample(8, |s| s.name("TECH-CRASH").volume(48).repeat(13534, 1924).ramp(15458))
    }
}
