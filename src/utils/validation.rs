use crate::error::{AppError, AppResult, FieldError};

/// Collects field-level problems so a request is rejected with all of them at once.
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: &str) {
        self.0.push(FieldError::new(field, message));
    }

    pub fn require_text(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, "must not be empty");
        }
    }

    /// Same as `require_text` but only for fields present in a partial update.
    pub fn require_text_if_set(&mut self, field: &str, value: Option<&String>) {
        if let Some(v) = value {
            self.require_text(field, v);
        }
    }

    pub fn into_result(self) -> AppResult<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::InvalidFields(self.0))
        }
    }
}
