use std::fmt;

use super::ErrorCode;

/// One recorded error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedError {
    pub code: ErrorCode,
    pub message: String,
}

impl fmt::Display for ReportedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.title(), self.message)
    }
}

/// Ordered collection of reported errors.
#[derive(Debug, Default)]
pub struct ErrorLog {
    entries: Vec<ReportedError>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error. Entries keep arrival order.
    pub fn set_error(&mut self, code: ErrorCode, message: impl Into<String>) {
        let message = message.into();
        log::debug!("error recorded: [{}] {}", code.title(), message);
        self.entries.push(ReportedError { code, message });
    }

    /// Records the error of a failed result and returns the success value.
    ///
    /// The full `anyhow` context chain is kept in the message.
    pub fn check<T>(&mut self, code: ErrorCode, result: anyhow::Result<T>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                self.set_error(code, format!("{e:#}"));
                None
            }
        }
    }

    /// Emits every entry through the `log` facade.
    ///
    /// Real errors go out at error level under their code title; `NoError`
    /// entries at debug level. Returns how many real errors were shown.
    pub fn display_errors(&self) -> usize {
        let mut shown = 0;
        for entry in &self.entries {
            if entry.code.is_error() {
                log::error!("{entry}");
                shown += 1;
            } else {
                log::debug!("{entry}");
            }
        }
        shown
    }

    /// True if any entry is a real error.
    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|e| e.code.is_error())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReportedError> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Context;

    use super::*;

    #[test]
    fn entries_keep_arrival_order() {
        let mut log = ErrorLog::new();
        log.set_error(ErrorCode::Graphics, "no adapter");
        log.set_error(ErrorCode::Texture, "missing atlas");

        let codes: Vec<_> = log.iter().map(|e| e.code).collect();
        assert_eq!(codes, vec![ErrorCode::Graphics, ErrorCode::Texture]);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn no_error_entries_are_not_counted() {
        let mut log = ErrorLog::new();
        log.set_error(ErrorCode::NoError, "all good");
        assert!(!log.has_errors());
        assert_eq!(log.display_errors(), 0);

        log.set_error(ErrorCode::Game, "level file corrupt");
        assert!(log.has_errors());
        assert_eq!(log.display_errors(), 1);
    }

    #[test]
    fn check_records_context_chain() {
        let mut log = ErrorLog::new();
        let failed: anyhow::Result<u32> =
            Err(anyhow::anyhow!("device lost")).context("failed to create wgpu device");

        assert_eq!(log.check(ErrorCode::Graphics, failed), None);
        let entry = log.iter().next().unwrap();
        assert_eq!(entry.code, ErrorCode::Graphics);
        assert_eq!(entry.message, "failed to create wgpu device: device lost");
    }

    #[test]
    fn check_passes_success_through() {
        let mut log = ErrorLog::new();
        assert_eq!(log.check(ErrorCode::Engine, Ok(7)), Some(7));
        assert!(log.is_empty());
    }

    #[test]
    fn display_uses_code_title() {
        let entry = ReportedError {
            code: ErrorCode::Shader,
            message: "link failed".into(),
        };
        assert_eq!(entry.to_string(), "[GRAPHICS SHADER] link failed");
    }

    #[test]
    fn clear_empties_the_log() {
        let mut log = ErrorLog::new();
        log.set_error(ErrorCode::Unknown, "?");
        log.clear();
        assert!(log.is_empty());
    }
}
