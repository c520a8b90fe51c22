use crate::errors::{ModError, ModResult};
use crate::pattern::Pattern;
use crate::sample::Sample;
use crate::utils::{
    latin1_to_bytes, MAX_PATTERN_INDEX, MAX_SAMPLE_BYTES, MAX_SONG_LENGTH, MAX_VOLUME,
    RESTART_BYTE, ROWS_PER_PATTERN, SAMPLE_NAME_LEN, SEQUENCE_LEN, TITLE_LEN,
};
use crate::Module;

/// Configuration for validation limits and rules
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Reject what real-world files commonly get wrong: a restart byte other
    /// than 127, patterns no sequence entry reaches, loops past the sample end
    pub strict_mode: bool,
    /// Longest sample payload accepted (bytes)
    pub max_sample_length: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            max_sample_length: MAX_SAMPLE_BYTES, // 0xFFFF words
        }
    }
}

impl ValidationConfig {
    /// Configuration that also enforces the conventions of well-formed files
    pub fn strict() -> Self {
        Self {
            strict_mode: true,
            ..Self::default()
        }
    }
}

/// Trait for validatable module components
pub trait ModValidate {
    /// Validate the component with the given configuration
    fn validate(&self, config: &ValidationConfig) -> ModResult<()>;

    /// Validate with the default configuration
    fn quick_validate(&self) -> ModResult<()> {
        self.validate(&ValidationConfig::default())
    }
}

fn failed(field: impl Into<String>, reason: String) -> ModError {
    ModError::ValidationFailed {
        field: field.into(),
        reason,
    }
}

/// Song-level checks: song length, sequence table, restart byte
pub struct SongValidator;

impl SongValidator {
    /// Song length must be in 1..=128
    pub fn validate_song_length(song_length: u8) -> ModResult<()> {
        if song_length == 0 || song_length > MAX_SONG_LENGTH {
            return Err(failed(
                "song_length",
                format!("{} outside valid range 1-{}", song_length, MAX_SONG_LENGTH),
            ));
        }
        Ok(())
    }

    /// Every entry, played or padding, must name a pattern 0..=63 that exists
    pub fn validate_sequence(sequence: &[u8; SEQUENCE_LEN], pattern_count: usize) -> ModResult<()> {
        for (position, &entry) in sequence.iter().enumerate() {
            if entry > MAX_PATTERN_INDEX {
                return Err(failed(
                    format!("sequence[{}]", position),
                    format!("pattern index {} exceeds maximum {}", entry, MAX_PATTERN_INDEX),
                ));
            }
            if usize::from(entry) >= pattern_count {
                return Err(failed(
                    format!("sequence[{}]", position),
                    format!(
                        "pattern index {} but module has only {} patterns",
                        entry, pattern_count
                    ),
                ));
            }
        }
        Ok(())
    }

    /// The byte after the song length is conventionally 127
    pub fn validate_restart_byte(value: u8, config: &ValidationConfig) -> ModResult<()> {
        if config.strict_mode && value != RESTART_BYTE {
            return Err(failed(
                "restart_byte",
                format!("expected {}, found {}", RESTART_BYTE, value),
            ));
        }
        Ok(())
    }
}

/// Checks that text fits its fixed-length field once encoded
pub struct TextValidator;

impl TextValidator {
    pub fn validate_text(field: &str, text: &str, max: usize) -> ModResult<()> {
        let raw = latin1_to_bytes(field, text)?;
        if raw.len() > max {
            return Err(ModError::FieldTooLong {
                field: field.to_string(),
                len: raw.len(),
                max,
            });
        }
        Ok(())
    }
}

/// Per-slot sample checks
pub struct SampleValidator;

impl SampleValidator {
    pub fn validate_sample(sample: &Sample, index: usize, config: &ValidationConfig) -> ModResult<()> {
        let field = |what: &str| format!("sample {} {}", index, what);

        TextValidator::validate_text(&field("name"), &sample.name, SAMPLE_NAME_LEN)?;

        if sample.volume > MAX_VOLUME {
            return Err(failed(
                field("volume"),
                format!("volume {} exceeds maximum {}", sample.volume, MAX_VOLUME),
            ));
        }

        if !(-8..=7).contains(&sample.fine_tune) {
            return Err(failed(
                field("fine tune"),
                format!("{} does not fit a signed nibble (-8 to 7)", sample.fine_tune),
            ));
        }

        Self::validate_byte_count(&field("length"), sample.data.len(), config)?;
        Self::validate_byte_count(&field("repeat start"), sample.repeat_start as usize, config)?;
        Self::validate_byte_count(&field("repeat length"), sample.repeat_length as usize, config)?;

        if config.strict_mode && sample.has_loop() {
            let loop_end = sample.repeat_start as usize + sample.repeat_length as usize;
            if loop_end > sample.data.len() {
                return Err(failed(
                    field("repeat length"),
                    format!(
                        "loop ends at byte {} past sample end {}",
                        loop_end,
                        sample.data.len()
                    ),
                ));
            }
        }

        Ok(())
    }

    /// Lengths and offsets are stored as word counts, so they must be even
    /// and fit in 16 bits once halved
    fn validate_byte_count(field: &str, bytes: usize, config: &ValidationConfig) -> ModResult<()> {
        if bytes % 2 != 0 {
            return Err(failed(field, format!("{} bytes is odd", bytes)));
        }
        let limit = config.max_sample_length.min(MAX_SAMPLE_BYTES);
        if bytes > limit {
            return Err(failed(
                field,
                format!("{} bytes exceeds limit of {}", bytes, limit),
            ));
        }
        Ok(())
    }
}

/// Note-level checks within a pattern
pub struct PatternValidator;

impl PatternValidator {
    /// Period and effect must fit their 12-bit fields
    pub fn validate_pattern(pattern: &Pattern, index: usize) -> ModResult<()> {
        for row in 0..ROWS_PER_PATTERN {
            for (channel, note) in pattern.row(row).iter().enumerate() {
                if note.period > 0xFFF {
                    return Err(failed(
                        format!("pattern {} row {} channel {} period", index, row, channel),
                        format!("{:#X} does not fit 12 bits", note.period),
                    ));
                }
                if note.effect > 0xFFF {
                    return Err(failed(
                        format!("pattern {} row {} channel {} effect", index, row, channel),
                        format!("{:#X} does not fit 12 bits", note.effect),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Main validator that coordinates all validation checks
pub struct ModValidator {
    config: ValidationConfig,
}

impl Default for ModValidator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

impl ModValidator {
    /// Create a new validator with the given configuration
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Check every invariant a module must hold before it can be encoded
    pub fn validate_module(&self, module: &Module) -> ModResult<()> {
        TextValidator::validate_text("title", &module.name, TITLE_LEN)?;

        SongValidator::validate_song_length(module.song_length)?;
        SongValidator::validate_sequence(&module.sequence, module.patterns.len())?;

        if self.config.strict_mode && module.patterns.len() != module.pattern_count() {
            return Err(failed(
                "patterns",
                format!(
                    "module holds {} patterns but the sequence table reaches {}",
                    module.patterns.len(),
                    module.pattern_count()
                ),
            ));
        }

        for (index, sample) in module.samples.iter().enumerate() {
            SampleValidator::validate_sample(sample, index, &self.config)?;
        }

        for (index, pattern) in module.patterns.iter().enumerate() {
            PatternValidator::validate_pattern(pattern, index)?;
        }

        Ok(())
    }
}

impl ModValidate for Module {
    fn validate(&self, config: &ValidationConfig) -> ModResult<()> {
        ModValidator::new(config.clone()).validate_module(self)
    }
}
