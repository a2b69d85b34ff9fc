//! Hostname rule definitions.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{SimError, SimResult};
use crate::http::host::normalize_host;
use crate::http::status::HttpStatus;

/// Response override applied to every non-admin request for one hostname.
///
/// Serialized as `{"type": "status", "code": 503}` or
/// `{"type": "redirect", "code": 301, "target": "https://..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Rule {
    Status { code: HttpStatus },
    Redirect { code: HttpStatus, target: String },
}

impl Rule {
    pub fn code(&self) -> HttpStatus {
        match self {
            Rule::Status { code } | Rule::Redirect { code, .. } => *code,
        }
    }

    /// `"status"` or `"redirect"`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Rule::Status { .. } => "status",
            Rule::Redirect { .. } => "redirect",
        }
    }

    pub fn target(&self) -> Option<&str> {
        match self {
            Rule::Redirect { target, .. } => Some(target),
            Rule::Status { .. } => None,
        }
    }
}

/// Raw admin payload for creating or replacing a rule.
///
/// Every field is optional so that missing fields surface as a validation
/// error instead of a JSON decoding error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleInput {
    pub hostname: Option<String>,
    #[serde(rename = "type")]
    pub rule_type: Option<String>,
    pub code: Option<serde_json::Value>,
    pub target: Option<String>,
}

impl RuleInput {
    /// Validate the payload into a normalized hostname and a typed rule.
    pub fn into_rule(self) -> SimResult<(String, Rule)> {
        let hostname = self
            .hostname
            .map(|h| normalize_host(&h))
            .filter(|h| !h.is_empty());
        let rule_type = self.rule_type.filter(|t| !t.is_empty());
        let code = self.code.filter(|c| !c.is_null() && c.as_str() != Some(""));

        let (Some(hostname), Some(rule_type), Some(code)) = (hostname, rule_type, code) else {
            return Err(SimError::Validation("Missing required fields".into()));
        };

        let code: HttpStatus = serde_json::from_value(code)
            .map_err(|_| SimError::Validation("Unsupported status code".into()))?;

        let rule = match rule_type.as_str() {
            "status" => Rule::Status { code },
            "redirect" => {
                let target = self.target.filter(|t| !t.trim().is_empty()).ok_or_else(|| {
                    SimError::Validation("Target URL required for redirect rules".into())
                })?;
                let target = target.trim().to_string();
                Url::parse(&target)
                    .map_err(|_| SimError::Validation("Target must be an absolute URL".into()))?;
                if !code.is_redirect() {
                    return Err(SimError::Validation(
                        "Redirect rules require a 3xx status code".into(),
                    ));
                }
                Rule::Redirect { code, target }
            }
            _ => return Err(SimError::Validation("Unknown rule type".into())),
        };

        Ok((hostname, rule))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(value: serde_json::Value) -> RuleInput {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_status_rule_from_string_code() {
        let (host, rule) = input(json!({"hostname": "Down.Example:8080", "type": "status", "code": "503"}))
            .into_rule()
            .unwrap();
        assert_eq!(host, "down.example");
        assert_eq!(rule, Rule::Status { code: HttpStatus::ServiceUnavailable });
        assert_eq!(rule.target(), None);
    }

    #[test]
    fn test_redirect_rule() {
        let (_, rule) = input(json!({
            "hostname": "old.example",
            "type": "redirect",
            "code": 301,
            "target": "https://new.example/"
        }))
        .into_rule()
        .unwrap();
        assert_eq!(rule.type_name(), "redirect");
        assert_eq!(rule.target(), Some("https://new.example/"));
    }

    #[test]
    fn test_redirect_target_kept_as_entered() {
        let (_, rule) = input(json!({
            "hostname": "old.example",
            "type": "redirect",
            "code": 302,
            "target": "  https://New.example?from=old  "
        }))
        .into_rule()
        .unwrap();
        assert_eq!(rule.target(), Some("https://New.example?from=old"));
    }

    #[test]
    fn test_missing_fields() {
        let err = input(json!({"hostname": "a.example", "type": "status"}))
            .into_rule()
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields");

        let err = input(json!({"hostname": "", "type": "status", "code": 200}))
            .into_rule()
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields");
    }

    #[test]
    fn test_redirect_requires_target() {
        let err = input(json!({"hostname": "a.example", "type": "redirect", "code": 302}))
            .into_rule()
            .unwrap_err();
        assert_eq!(err.to_string(), "Target URL required for redirect rules");

        let err = input(json!({"hostname": "a.example", "type": "redirect", "code": 302, "target": "/relative"}))
            .into_rule()
            .unwrap_err();
        assert!(matches!(err, SimError::Validation(_)));
    }

    #[test]
    fn test_rejects_unknown_codes_and_types() {
        let err = input(json!({"hostname": "a.example", "type": "status", "code": 299}))
            .into_rule()
            .unwrap_err();
        assert_eq!(err.to_string(), "Unsupported status code");

        let err = input(json!({"hostname": "a.example", "type": "redirect", "code": 404, "target": "https://b.example"}))
            .into_rule()
            .unwrap_err();
        assert!(err.to_string().contains("3xx"));

        let err = input(json!({"hostname": "a.example", "type": "proxy", "code": 200}))
            .into_rule()
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown rule type");
    }

    #[test]
    fn test_wire_format() {
        let rule = Rule::Redirect { code: HttpStatus::Found, target: "https://b.example/".into() };
        let value = serde_json::to_value(&rule).unwrap();
        assert_eq!(value, json!({"type": "redirect", "code": 302, "target": "https://b.example/"}));

        let parsed: Rule = serde_json::from_value(json!({"type": "status", "code": "410"})).unwrap();
        assert_eq!(parsed, Rule::Status { code: HttpStatus::Gone });
    }
}
