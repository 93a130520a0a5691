//! Color-aware failure formatter
//!
//! Renders substituted call failures for terminals. Respects NO_COLOR.

use super::sink::FailureRecord;
use crate::marshal::ErrorKind;
use stackcall_config::ColorSetting;
use termcolor::{Color, ColorChoice, ColorSpec, WriteColor};

/// Color mode for failure output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Always,
    Never,
    /// Auto-detect terminal capabilities
    Auto,
}

impl ColorMode {
    /// Resolve to a termcolor ColorChoice
    pub fn to_color_choice(self) -> ColorChoice {
        // https://no-color.org
        if std::env::var_os("NO_COLOR").is_some() {
            return ColorChoice::Never;
        }
        match self {
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
            ColorMode::Auto => ColorChoice::Auto,
        }
    }
}

impl From<ColorSetting> for ColorMode {
    fn from(setting: ColorSetting) -> Self {
        match setting {
            ColorSetting::Always => ColorMode::Always,
            ColorSetting::Never => ColorMode::Never,
            ColorSetting::Auto => ColorMode::Auto,
        }
    }
}

/// Short code shown in the header of a failure
fn kind_code(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::StructuralTypeMismatch => "type-mismatch",
        ErrorKind::ValueConstraintViolation => "bad-value",
        ErrorKind::UserSignaledInvalidArgument => "invalid-argument",
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FailureFormatter {
    color_mode: ColorMode,
}

impl FailureFormatter {
    pub fn new(color_mode: ColorMode) -> Self {
        Self { color_mode }
    }

    /// Formatter without colors
    pub fn plain() -> Self {
        Self::new(ColorMode::Never)
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    /// Write one failure:
    ///
    /// ```text
    /// warning[type-mismatch]: Bad argument @ 'f' [...]
    ///   --> f
    ///    = note: fallback value returned
    /// ```
    pub fn write_failure(
        &self,
        w: &mut impl WriteColor,
        record: &FailureRecord,
    ) -> std::io::Result<()> {
        w.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
        write!(w, "warning[{}]", kind_code(record.kind))?;
        w.reset()?;

        w.set_color(ColorSpec::new().set_bold(true))?;
        write!(w, ": {}", record.message)?;
        w.reset()?;
        writeln!(w)?;

        w.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
        write!(w, "  --> ")?;
        w.reset()?;
        writeln!(w, "{}", record.function)?;

        w.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
        write!(w, "   = ")?;
        w.reset()?;
        w.set_color(ColorSpec::new().set_bold(true))?;
        write!(w, "note")?;
        w.reset()?;
        writeln!(w, ": fallback value returned")?;
        Ok(())
    }

    /// Render a failure into a byte buffer without colors
    pub fn format_to_buffer(&self, record: &FailureRecord) -> Vec<u8> {
        let mut buf = termcolor::Buffer::no_color();
        let _ = self.write_failure(&mut buf, record);
        buf.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_rendering() {
        let record = FailureRecord {
            function: "setHealth".to_string(),
            kind: ErrorKind::ValueConstraintViolation,
            message: "Bad argument @ 'setHealth' [Expected number at argument 1, got NaN]"
                .to_string(),
        };
        let out = String::from_utf8(FailureFormatter::plain().format_to_buffer(&record)).unwrap();
        insta::assert_snapshot!(out, @r"
        warning[bad-value]: Bad argument @ 'setHealth' [Expected number at argument 1, got NaN]
          --> setHealth
           = note: fallback value returned
        ");
    }

    #[test]
    fn test_color_mode_from_setting() {
        assert_eq!(ColorMode::from(ColorSetting::Never), ColorMode::Never);
        assert_eq!(ColorMode::from(ColorSetting::Auto), ColorMode::Auto);
    }
}
