use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Collects field errors so a request reports every problem at once.
#[derive(Debug, Default)]
pub struct Violations(Vec<FieldError>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    pub fn check(&mut self, ok: bool, field: impl Into<String>, message: impl Into<String>) {
        if !ok {
            self.push(field, message);
        }
    }

    pub fn require_text(&mut self, value: &str, field: impl Into<String>) {
        let field = field.into();
        if value.trim().is_empty() {
            let message = format!("{field} is required");
            self.push(field, message);
        }
    }

    pub fn finish(self) -> AppResult<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.0))
        }
    }
}

pub trait Validate {
    fn validate(&self) -> AppResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_every_violation() {
        let mut v = Violations::new();
        v.require_text("  ", "name");
        v.check(false, "stock", "stock must not be negative");
        v.check(true, "price", "unused");

        match v.finish() {
            Err(AppError::Validation(errors)) => {
                assert_eq!(
                    errors,
                    vec![
                        FieldError::new("name", "name is required"),
                        FieldError::new("stock", "stock must not be negative"),
                    ]
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
