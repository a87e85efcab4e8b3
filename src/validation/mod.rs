//! Declarative request validation. Every rule for a payload is evaluated
//! before any handler logic runs; failures are aggregated per field and
//! reported together, never just the first.

pub mod auth;
pub mod container;
pub mod device;
pub mod site;

use std::net::Ipv4Addr;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

use crate::database::query::Page;
use crate::database::update::Patch;
use crate::error::{ApiError, FieldError};

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").unwrap());
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());
static MAC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9A-Fa-f]{2}[:-]){5}[0-9A-Fa-f]{2}$").unwrap());

/// Collects field-level failures across a whole payload.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation(self.errors))
        }
    }

    /// Required string: trimmed, non-empty, bounded length.
    pub fn required_text(
        &mut self,
        field: &str,
        label: &str,
        value: Option<String>,
        max: usize,
    ) -> Option<String> {
        match value.map(|v| v.trim().to_string()) {
            None => {
                self.push(field, format!("{} is required", label));
                None
            }
            Some(s) if s.is_empty() => {
                self.push(field, format!("{} is required", label));
                None
            }
            Some(s) => self.check_max(field, label, s, max),
        }
    }

    /// Optional string: trimmed, bounded length when present.
    pub fn optional_text(
        &mut self,
        field: &str,
        label: &str,
        value: Option<String>,
        max: usize,
    ) -> Option<String> {
        value
            .map(|v| v.trim().to_string())
            .and_then(|s| self.check_max(field, label, s, max))
    }

    /// Required (non-nullable) string in a partial update: absent is fine,
    /// but an explicit null or empty value is rejected.
    pub fn required_text_patch(
        &mut self,
        field: &str,
        label: &str,
        value: Patch<String>,
        max: usize,
    ) -> Option<String> {
        match value {
            Patch::Missing => None,
            Patch::Null => {
                self.push(field, format!("{} cannot be empty", label));
                None
            }
            Patch::Value(s) => {
                let s = s.trim().to_string();
                if s.is_empty() {
                    self.push(field, format!("{} cannot be empty", label));
                    None
                } else {
                    self.check_max(field, label, s, max)
                }
            }
        }
    }

    /// Nullable string in a partial update: null clears, value is bounded.
    pub fn optional_text_patch(
        &mut self,
        field: &str,
        label: &str,
        value: Patch<String>,
        max: usize,
    ) -> Patch<String> {
        match value {
            Patch::Missing => Patch::Missing,
            Patch::Null => Patch::Null,
            Patch::Value(s) => {
                let s = s.trim().to_string();
                match self.check_max(field, label, s, max) {
                    Some(s) => Patch::Value(s),
                    None => Patch::Missing,
                }
            }
        }
    }

    fn check_max(&mut self, field: &str, label: &str, value: String, max: usize) -> Option<String> {
        if value.chars().count() > max {
            self.push(field, format!("{} cannot exceed {} characters", label, max));
            None
        } else {
            Some(value)
        }
    }

    /// Closed-enum membership; `message` names the accepted values.
    pub fn parse_enum<T: FromStr>(
        &mut self,
        field: &str,
        value: Option<String>,
        message: &str,
    ) -> Option<T> {
        let s = value?;
        match s.trim().parse::<T>() {
            Ok(v) => Some(v),
            Err(_) => {
                self.push(field, message);
                None
            }
        }
    }

    /// Non-nullable enum in a partial update.
    pub fn parse_enum_patch<T: FromStr>(
        &mut self,
        field: &str,
        value: Patch<String>,
        message: &str,
    ) -> Option<T> {
        match value {
            Patch::Missing => None,
            Patch::Null => {
                self.push(field, message);
                None
            }
            Patch::Value(s) => self.parse_enum(field, Some(s), message),
        }
    }

    /// Identifier-format foreign key.
    pub fn parse_uuid(&mut self, field: &str, value: Option<String>, message: &str) -> Option<Uuid> {
        let s = value?;
        match Uuid::parse_str(s.trim()) {
            Ok(id) => Some(id),
            Err(_) => {
                self.push(field, message);
                None
            }
        }
    }

    pub fn parse_uuid_patch(
        &mut self,
        field: &str,
        value: Patch<String>,
        message: &str,
    ) -> Option<Uuid> {
        match value {
            Patch::Missing => None,
            Patch::Null => {
                self.push(field, message);
                None
            }
            Patch::Value(s) => self.parse_uuid(field, Some(s), message),
        }
    }

    /// Username: 3-30 chars, letters/digits/underscores only.
    pub fn username(&mut self, field: &str, value: Option<String>) -> Option<String> {
        match value.map(|v| v.trim().to_string()) {
            None => {
                self.push(field, "Username must be between 3 and 30 characters");
                None
            }
            Some(s) => {
                let len = s.chars().count();
                if !(3..=30).contains(&len) {
                    self.push(field, "Username must be between 3 and 30 characters");
                    None
                } else if !USERNAME_RE.is_match(&s) {
                    self.push(
                        field,
                        "Username can only contain letters, numbers, and underscores",
                    );
                    None
                } else {
                    Some(s)
                }
            }
        }
    }

    /// Email: trimmed, lower-cased, syntax-checked.
    pub fn email(&mut self, field: &str, value: Option<String>) -> Option<String> {
        match value.map(|v| v.trim().to_lowercase()) {
            None => {
                self.push(field, "Please provide a valid email address");
                None
            }
            Some(s) if !EMAIL_RE.is_match(&s) => {
                self.push(field, "Please provide a valid email address");
                None
            }
            Some(s) => Some(s),
        }
    }

    pub fn password(&mut self, field: &str, value: Option<String>) -> Option<String> {
        match value {
            Some(s) if s.chars().count() >= 6 => Some(s),
            _ => {
                self.push(field, "Password must be at least 6 characters");
                None
            }
        }
    }

    /// Strict dotted-quad IPv4; each octet must be in range (999.1.1.1 fails).
    pub fn ipv4(&mut self, field: &str, value: Option<String>) -> Option<String> {
        let s = value?.trim().to_string();
        match s.parse::<Ipv4Addr>() {
            Ok(_) => Some(s),
            Err(_) => {
                self.push(field, "Please provide a valid IP address");
                None
            }
        }
    }

    pub fn ipv4_patch(&mut self, field: &str, value: Patch<String>) -> Patch<String> {
        match value {
            Patch::Missing => Patch::Missing,
            Patch::Null => Patch::Null,
            Patch::Value(s) => match self.ipv4(field, Some(s)) {
                Some(s) => Patch::Value(s),
                None => Patch::Missing,
            },
        }
    }

    /// Colon- or hyphen-separated hex pairs. Case normalization happens at
    /// the store on write.
    pub fn mac(&mut self, field: &str, value: Option<String>) -> Option<String> {
        let s = value?.trim().to_string();
        if MAC_RE.is_match(&s) {
            Some(s)
        } else {
            self.push(
                field,
                "Please provide a valid MAC address (format: XX:XX:XX:XX:XX:XX)",
            );
            None
        }
    }

    pub fn mac_patch(&mut self, field: &str, value: Patch<String>) -> Patch<String> {
        match value {
            Patch::Missing => Patch::Missing,
            Patch::Null => Patch::Null,
            Patch::Value(s) => match self.mac(field, Some(s)) {
                Some(s) => Patch::Value(s),
                None => Patch::Missing,
            },
        }
    }

    /// Coerce a JSON number or numeric string to a non-negative integer.
    pub fn non_negative_int(
        &mut self,
        field: &str,
        label: &str,
        value: Option<Value>,
    ) -> Option<i32> {
        let value = value?;
        let parsed = match &value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        match parsed {
            Some(n) if (0..=i32::MAX as i64).contains(&n) => Some(n as i32),
            _ => {
                self.push(field, format!("{} must be a non-negative integer", label));
                None
            }
        }
    }

    /// Pagination window: defaults page=1 / limit=10, both must be positive
    /// integers, limit is capped by configuration.
    pub fn page_params(&mut self, page: Option<String>, limit: Option<String>) -> Page {
        let cfg = &crate::config::config().pagination;

        let page = match page {
            None => 1,
            Some(s) => match s.trim().parse::<i64>() {
                Ok(n) if n >= 1 => n,
                _ => {
                    self.push("page", "Page must be a positive integer");
                    1
                }
            },
        };

        let limit = match limit {
            None => cfg.default_limit,
            Some(s) => match s.trim().parse::<i64>() {
                Ok(n) if n >= 1 => n.min(cfg.max_limit),
                _ => {
                    self.push("limit", "Limit must be a positive integer");
                    cfg.default_limit
                }
            },
        };

        Page { page, limit }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_every_failing_field() {
        let mut v = Validator::new();
        v.required_text("name", "Site name", None, 100);
        v.required_text("location", "Location", Some("   ".to_string()), 200);
        v.ipv4("ipAddress", Some("999.1.1.1".to_string()));

        let err = v.finish().unwrap_err();
        match err {
            ApiError::Validation { errors } => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["name", "location", "ipAddress"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn trims_before_rule_evaluation() {
        let mut v = Validator::new();
        let name = v.required_text("name", "Site name", Some("  HQ  ".to_string()), 100);
        assert_eq!(name.as_deref(), Some("HQ"));
        assert!(!v.has_errors());
    }

    #[test]
    fn enforces_length_bounds() {
        let mut v = Validator::new();
        let long = "x".repeat(101);
        assert!(v.required_text("name", "Site name", Some(long), 100).is_none());
        assert!(v.has_errors());
    }

    #[test]
    fn strict_ipv4_rejects_out_of_range_octets() {
        let mut v = Validator::new();
        assert!(v.ipv4("ipAddress", Some("999.1.1.1".to_string())).is_none());
        assert!(v.has_errors());

        let mut v = Validator::new();
        assert_eq!(
            v.ipv4("ipAddress", Some("10.0.0.1".to_string())).as_deref(),
            Some("10.0.0.1")
        );
        assert!(!v.has_errors());
    }

    #[test]
    fn mac_accepts_colon_and_hyphen_pairs() {
        let mut v = Validator::new();
        assert!(v.mac("macAddress", Some("aa:bb:cc:dd:ee:ff".to_string())).is_some());
        assert!(v.mac("macAddress", Some("AA-BB-CC-DD-EE-FF".to_string())).is_some());
        assert!(!v.has_errors());

        assert!(v.mac("macAddress", Some("aa:bb:cc:dd:ee".to_string())).is_none());
        assert!(v.mac("macAddress", Some("zz:bb:cc:dd:ee:ff".to_string())).is_none());
        assert!(v.has_errors());
    }

    #[test]
    fn username_rules() {
        let mut v = Validator::new();
        assert!(v.username("username", Some("al".to_string())).is_none());
        assert!(v.username("username", Some("alice!".to_string())).is_none());
        assert_eq!(
            v.username("username", Some("alice_01".to_string())).as_deref(),
            Some("alice_01")
        );
    }

    #[test]
    fn email_is_normalized() {
        let mut v = Validator::new();
        assert_eq!(
            v.email("email", Some("  Alice@Example.COM ".to_string())).as_deref(),
            Some("alice@example.com")
        );
        assert!(v.email("email", Some("not-an-email".to_string())).is_none());
    }

    #[test]
    fn capacity_coercion_rejects_negative_and_non_numeric() {
        let mut v = Validator::new();
        assert_eq!(
            v.non_negative_int("capacity", "Capacity", Some(serde_json::json!(42))),
            Some(42)
        );
        assert_eq!(
            v.non_negative_int("capacity", "Capacity", Some(serde_json::json!("17"))),
            Some(17)
        );
        assert!(!v.has_errors());

        assert!(v
            .non_negative_int("capacity", "Capacity", Some(serde_json::json!(-1)))
            .is_none());
        assert!(v
            .non_negative_int("capacity", "Capacity", Some(serde_json::json!("lots")))
            .is_none());
        assert!(v
            .non_negative_int("capacity", "Capacity", Some(serde_json::json!(1.5)))
            .is_none());
        assert!(v.has_errors());
    }

    #[test]
    fn page_params_default_cap_and_reject() {
        let mut v = Validator::new();
        let page = v.page_params(None, None);
        assert_eq!(page, Page { page: 1, limit: 10 });

        let page = v.page_params(Some("2".to_string()), Some("25".to_string()));
        assert_eq!(page, Page { page: 2, limit: 25 });

        // Limit above the configured cap is clamped
        let page = v.page_params(None, Some("100000".to_string()));
        assert_eq!(page.limit, crate::config::config().pagination.max_limit);
        assert!(!v.has_errors());

        v.page_params(Some("0".to_string()), Some("nan".to_string()));
        assert!(v.has_errors());
    }

    #[test]
    fn patch_rules_respect_tri_state() {
        let mut v = Validator::new();

        // Nullable field: null passes through as a clear
        assert_eq!(
            v.optional_text_patch("notes", "Notes", Patch::Null, 1000),
            Patch::Null
        );
        // Non-nullable field: null rejected
        assert!(v
            .required_text_patch("name", "Device name", Patch::Null, 100)
            .is_none());
        assert!(v.has_errors());

        let mut v = Validator::new();
        assert_eq!(
            v.required_text_patch("name", "Device name", Patch::Value(" sw1 ".to_string()), 100)
                .as_deref(),
            Some("sw1")
        );
        assert!(v
            .required_text_patch("name", "Device name", Patch::Missing, 100)
            .is_none());
        assert!(!v.has_errors());
    }
}
