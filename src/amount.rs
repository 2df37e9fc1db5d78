use crate::config::AmountBounds;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AmountError {
    #[error("'{input}' is not a valid amount: use digits with at most one decimal point")]
    Malformed { input: String },
    #[error("at most {max} decimal places are allowed")]
    TooManyDecimals { max: usize },
    #[error("amount {value} is outside the allowed range {min} to {max}")]
    OutOfRange { value: f64, min: f64, max: f64 },
}

/// Free-form amount text plus the last value accepted from it.
///
/// The text may run ahead of the committed value (`"12."` commits `12`, an
/// out-of-range number is shown but not committed).
#[derive(Debug, Clone)]
pub struct AmountInput {
    display_text: String,
    value: f64,
    validation_error: Option<AmountError>,
    bounds: AmountBounds,
}

impl AmountInput {
    pub fn new(bounds: AmountBounds, initial: f64) -> Self {
        Self {
            display_text: format_amount(initial),
            value: initial,
            validation_error: None,
            bounds,
        }
    }

    pub fn display_text(&self) -> &str {
        &self.display_text
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn validation_error(&self) -> Option<&AmountError> {
        self.validation_error.as_ref()
    }

    /// Apply a user edit. Returns the newly committed value.
    pub fn edit(&mut self, raw: &str) -> Result<f64, AmountError> {
        let text = raw.trim();
        let parsed = match self.parse(text) {
            Ok(v) => v,
            Err(e) => {
                self.validation_error = Some(e.clone());
                return Err(e);
            }
        };

        self.display_text = text.to_string();
        let AmountBounds { min, max, .. } = self.bounds;
        if parsed < min || parsed > max {
            let e = AmountError::OutOfRange {
                value: parsed,
                min,
                max,
            };
            self.validation_error = Some(e.clone());
            return Err(e);
        }

        self.value = parsed;
        self.validation_error = None;
        Ok(parsed)
    }

    /// The value was changed elsewhere; rewrite the text to match it.
    pub fn sync_external(&mut self, value: f64) {
        if value != self.value {
            self.value = value;
            self.display_text = format_amount(value);
            self.validation_error = None;
        }
    }

    fn parse(&self, text: &str) -> Result<f64, AmountError> {
        if text.is_empty() {
            return Ok(0.0);
        }

        let malformed = || AmountError::Malformed {
            input: text.to_string(),
        };

        let (whole, fraction) = match text.split_once('.') {
            Some((w, f)) => (w, Some(f)),
            None => (text, None),
        };
        let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if !all_digits(whole) || !fraction.map_or(true, all_digits) {
            return Err(malformed());
        }
        if whole.is_empty() && fraction.map_or(true, str::is_empty) {
            return Err(malformed());
        }
        if fraction.is_some_and(|f| f.len() > self.bounds.max_decimals) {
            return Err(AmountError::TooManyDecimals {
                max: self.bounds.max_decimals,
            });
        }

        text.parse::<f64>().map_err(|_| malformed())
    }
}

fn format_amount(value: f64) -> String {
    if value == 0.0 {
        String::new()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> AmountInput {
        AmountInput::new(AmountBounds::default(), 100.0)
    }

    #[test]
    fn commits_valid_decimal() {
        let mut amount = input();
        assert_eq!(amount.edit("123.45"), Ok(123.45));
        assert_eq!(amount.value(), 123.45);
        assert_eq!(amount.display_text(), "123.45");
        assert!(amount.validation_error().is_none());
    }

    #[test]
    fn rejects_second_decimal_point() {
        let mut amount = input();
        let err = amount.edit("12.3.4").unwrap_err();
        assert!(matches!(err, AmountError::Malformed { .. }));
        assert_eq!(amount.value(), 100.0);
        assert_eq!(amount.display_text(), "100");
        assert_eq!(amount.validation_error(), Some(&err));
    }

    #[test]
    fn rejects_letters_and_signs() {
        let mut amount = input();
        for bad in ["abc", "-5", "1e5", "12a", ".", "+1", "1,5"] {
            assert!(
                matches!(amount.edit(bad), Err(AmountError::Malformed { .. })),
                "{} should be malformed",
                bad
            );
        }
        assert_eq!(amount.value(), 100.0);
    }

    #[test]
    fn holds_out_of_range_text_without_committing() {
        let mut amount = input();
        let err = amount.edit("99999999999999").unwrap_err();
        assert!(matches!(err, AmountError::OutOfRange { .. }));
        assert_eq!(amount.value(), 100.0);
        assert_eq!(amount.display_text(), "99999999999999");
    }

    #[test]
    fn below_minimum_is_a_range_error() {
        let bounds = AmountBounds {
            min: 10.0,
            ..AmountBounds::default()
        };
        let mut amount = AmountInput::new(bounds, 50.0);
        assert!(matches!(
            amount.edit("5"),
            Err(AmountError::OutOfRange { min, .. }) if min == 10.0
        ));
        assert_eq!(amount.value(), 50.0);
    }

    #[test]
    fn trailing_point_commits_whole_number() {
        let mut amount = input();
        assert_eq!(amount.edit("12."), Ok(12.0));
        assert_eq!(amount.display_text(), "12.");
        assert_eq!(amount.edit(".5"), Ok(0.5));
    }

    #[test]
    fn empty_text_commits_zero() {
        let mut amount = input();
        assert_eq!(amount.edit(""), Ok(0.0));
        assert_eq!(amount.display_text(), "");
    }

    #[test]
    fn limits_decimal_places() {
        let bounds = AmountBounds {
            max_decimals: 2,
            ..AmountBounds::default()
        };
        let mut amount = AmountInput::new(bounds, 1.0);
        assert_eq!(amount.edit("1.25"), Ok(1.25));
        assert_eq!(
            amount.edit("1.255"),
            Err(AmountError::TooManyDecimals { max: 2 })
        );
        assert_eq!(amount.display_text(), "1.25");
    }

    #[test]
    fn valid_edit_clears_previous_error() {
        let mut amount = input();
        let _ = amount.edit("abc");
        assert!(amount.validation_error().is_some());
        amount.edit("7").unwrap();
        assert!(amount.validation_error().is_none());
    }

    #[test]
    fn external_change_rewrites_text() {
        let mut amount = input();
        amount.edit("12.").unwrap();
        amount.sync_external(12.0);
        assert_eq!(amount.display_text(), "12.");

        amount.sync_external(250.0);
        assert_eq!(amount.display_text(), "250");
        assert_eq!(amount.value(), 250.0);

        let _ = amount.edit("99999999999999");
        amount.sync_external(0.0);
        assert_eq!(amount.display_text(), "");
        assert!(amount.validation_error().is_none());
    }
}
