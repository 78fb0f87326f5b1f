//! Field validation and prompt helpers used by every form.
//!
//! Forms keep raw text (like the inputs they replace) and only turn it into
//! a typed payload through `validate()`, so an empty submission never
//! reaches the API.

use anyhow::Result;
use inquire::CustomUserError;
use inquire::validator::Validation;
use inquire::{Password, PasswordDisplayMode, Text};

use crate::error::FormError;

pub fn required(field: &'static str, value: &str) -> Result<String, FormError> {
    let v = value.trim();
    if v.is_empty() {
        Err(FormError::Required(field))
    } else {
        Ok(v.to_string())
    }
}

pub fn optional(value: &str) -> Option<String> {
    let v = value.trim();
    (!v.is_empty()).then(|| v.to_string())
}

pub fn number(field: &'static str, value: &str) -> Result<f64, FormError> {
    let v = required(field, value)?;
    v.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or(FormError::InvalidNumber { field, value: v })
}

pub fn positive_number(field: &'static str, value: &str) -> Result<f64, FormError> {
    let n = number(field, value)?;
    if n <= 0.0 {
        return Err(FormError::NotPositive(field));
    }
    Ok(n)
}

pub fn positive_int(field: &'static str, value: &str) -> Result<i64, FormError> {
    let v = required(field, value)?;
    let n = v
        .parse::<i64>()
        .map_err(|_| FormError::InvalidNumber { field, value: v })?;
    if n < 1 {
        return Err(FormError::NotPositive(field));
    }
    Ok(n)
}

/// Free text, pre-filled with `default`.
pub fn ask_text(prompt: &str, default: &str) -> Result<String> {
    Ok(Text::new(prompt).with_default(default).prompt()?)
}

/// Text that cannot be left empty; the prompt refuses to submit until filled.
pub fn ask_required(prompt: &str, field: &'static str, default: &str) -> Result<String> {
    let answer = Text::new(prompt)
        .with_default(default)
        .with_validator(move |input: &str| -> Result<Validation, CustomUserError> {
            Ok(match required(field, input) {
                Ok(_) => Validation::Valid,
                Err(e) => Validation::Invalid(e.to_string().into()),
            })
        })
        .prompt()?;
    Ok(answer.trim().to_string())
}

pub fn ask_number(prompt: &str, field: &'static str, default: &str, positive: bool) -> Result<String> {
    let answer = Text::new(prompt)
        .with_default(default)
        .with_validator(move |input: &str| -> Result<Validation, CustomUserError> {
            let checked = if positive {
                positive_number(field, input)
            } else {
                number(field, input)
            };
            Ok(match checked {
                Ok(_) => Validation::Valid,
                Err(e) => Validation::Invalid(e.to_string().into()),
            })
        })
        .prompt()?;
    Ok(answer.trim().to_string())
}

pub fn ask_password(prompt: &str) -> Result<String> {
    Ok(Password::new(prompt)
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?)
}

/// Shows a number without a trailing `.0` so it can be edited as typed.
pub fn number_default(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_blank() {
        assert_eq!(required("Nombre", ""), Err(FormError::Required("Nombre")));
        assert_eq!(required("Nombre", "   "), Err(FormError::Required("Nombre")));
        assert_eq!(required("Nombre", " Ana "), Ok("Ana".to_string()));
    }

    #[test]
    fn numbers() {
        assert_eq!(number("Valor", "12.5"), Ok(12.5));
        assert_eq!(number("Valor", ""), Err(FormError::Required("Valor")));
        assert!(matches!(number("Valor", "doce"), Err(FormError::InvalidNumber { .. })));
        assert!(matches!(number("Valor", "inf"), Err(FormError::InvalidNumber { .. })));
        assert_eq!(positive_number("Monto", "0"), Err(FormError::NotPositive("Monto")));
        assert_eq!(positive_number("Monto", "-5"), Err(FormError::NotPositive("Monto")));
        assert_eq!(positive_int("Cantidad", "3"), Ok(3));
        assert_eq!(positive_int("Cantidad", "0"), Err(FormError::NotPositive("Cantidad")));
        assert!(matches!(positive_int("Cantidad", "1.5"), Err(FormError::InvalidNumber { .. })));
    }

    #[test]
    fn optional_trims() {
        assert_eq!(optional("  "), None);
        assert_eq!(optional(" x "), Some("x".to_string()));
    }

    #[test]
    fn number_defaults_render_plain() {
        assert_eq!(number_default(7000.0), "7000");
        assert_eq!(number_default(2.5), "2.5");
    }
}
