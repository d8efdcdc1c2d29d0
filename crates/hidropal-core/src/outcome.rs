//! Operation outcomes
//!
//! Every engine operation returns an [`Outcome`]: a success flag, a
//! human-readable status message, optional detail lines and an optional value.

use std::fmt::{self, Display, Formatter};

use serde::Serialize;

/// Result of an engine operation as shown to the user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome<T> {
    pub success: bool,
    pub message: String,
    /// Individual problems, e.g. one line per validation issue
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<T>,
}

impl<T> Outcome<T> {
    /// Successful outcome carrying a value
    #[inline]
    pub fn ok(message: impl Into<String>, value: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            details: Vec::new(),
            value: Some(value),
        }
    }

    /// Successful outcome without a value (informational no-op)
    #[inline]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            details: Vec::new(),
            value: None,
        }
    }

    /// Failed outcome
    #[inline]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            details: Vec::new(),
            value: None,
        }
    }

    /// Attach detail lines
    #[inline]
    #[must_use]
    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }

    /// Attach or replace the value
    #[inline]
    #[must_use]
    pub fn with_value(mut self, value: T) -> Self {
        self.value = Some(value);
        self
    }

    /// Whether the operation succeeded
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Borrow the value
    #[inline]
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Take the value
    #[inline]
    #[must_use]
    pub fn into_value(self) -> Option<T> {
        self.value
    }

    /// Same flag, message and details with another value type
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            success: self.success,
            message: self.message,
            details: self.details,
            value: self.value.map(f),
        }
    }
}

impl<T: Serialize> Outcome<T> {
    /// JSON snapshot for diagnostics
    ///
    /// # Errors
    /// Returns error if the value cannot be serialized
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl<T> Display for Outcome<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        for detail in &self.details {
            write!(f, "\n- {detail}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_flag() {
        assert!(Outcome::ok("done", 1).is_success());
        assert!(Outcome::<()>::info("nothing to do").is_success());
        assert!(!Outcome::<()>::failed("nope").is_success());
    }

    #[test]
    fn display_lists_details() {
        let outcome = Outcome::<()>::failed("invalid entry")
            .with_details(vec!["date is required".into(), "water level is required".into()]);
        assert_eq!(
            outcome.to_string(),
            "invalid entry\n- date is required\n- water level is required"
        );
    }

    #[test]
    fn json_omits_empty_parts() {
        let json = Outcome::<u32>::failed("nope").to_json().unwrap();
        assert_eq!(json, r#"{"success":false,"message":"nope"}"#);
        let json = Outcome::ok("done", 3u32).to_json().unwrap();
        assert_eq!(json, r#"{"success":true,"message":"done","value":3}"#);
    }

    #[test]
    fn map_keeps_message() {
        let outcome = Outcome::ok("two rows", vec![1, 2]).map(|v| v.len());
        assert_eq!(outcome.value(), Some(&2));
        assert_eq!(outcome.message, "two rows");
    }
}
