//! Path + method + role authorization rules.
//!
//! Rules are evaluated in declaration order and the first rule whose path prefix
//! and method match decides the request. Requests no rule matches are allowed.

use std::str::FromStr;

use axum::http::Method;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("invalid policy rule: {0:?} (expected `METHOD /prefix=ROLE[|reason]`)")]
    InvalidRule(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRule {
    pub method: Method,
    pub path_prefix: String,
    pub required_role: String,
    // Logged on denial, never sent to the caller.
    pub reason: String,
}

impl PolicyRule {
    pub fn new(method: Method, path_prefix: impl Into<String>, required_role: impl Into<String>) -> Self {
        let required_role = required_role.into();
        Self {
            method,
            path_prefix: path_prefix.into(),
            reason: format!("Access denied: {} role required", required_role),
            required_role,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn matches(&self, path: &str, method: &Method) -> bool {
        self.method == *method && path.starts_with(&self.path_prefix)
    }

    fn permits(&self, role: Option<&str>) -> bool {
        role == Some(self.required_role.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationPolicy {
    rules: Vec<PolicyRule>,
}

impl AuthorizationPolicy {
    pub fn new(rules: Vec<PolicyRule>) -> Self {
        Self { rules }
    }

    /// Only employers may create vacancies.
    pub fn employer_default() -> Self {
        Self::new(vec![
            PolicyRule::new(Method::POST, "/api/vacancies", "EMPLOYER")
                .with_reason("Access denied: Employers only"),
        ])
    }

    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    /// `Err(rule)` carries the rule that denied the request.
    pub fn authorize(
        &self,
        path: &str,
        method: &Method,
        role: Option<&str>,
    ) -> Result<(), &PolicyRule> {
        match self.rules.iter().find(|rule| rule.matches(path, method)) {
            Some(rule) if !rule.permits(role) => Err(rule),
            _ => Ok(()),
        }
    }
}

/// `;`-separated rules, each `METHOD /prefix=ROLE`, optionally followed by
/// `|reason` (the logged denial reason; defaults to "Access denied: ROLE role required").
///
/// ```text
/// POST /api/vacancies=EMPLOYER|Access denied: Employers only; DELETE /api/admin=ADMIN
/// ```
impl FromStr for AuthorizationPolicy {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rules = s
            .split(';')
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(parse_rule)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(rules))
    }
}

fn parse_rule(raw: &str) -> Result<PolicyRule, PolicyError> {
    let invalid = || PolicyError::InvalidRule(raw.to_string());

    let (rule, reason) = match raw.split_once('|') {
        Some((rule, reason)) => (rule, Some(reason.trim())),
        None => (raw, None),
    };

    let (target, role) = rule.rsplit_once('=').ok_or_else(invalid)?;
    let (method, prefix) = target.trim().split_once(char::is_whitespace).ok_or_else(invalid)?;

    let method =
        Method::from_bytes(method.to_ascii_uppercase().as_bytes()).map_err(|_| invalid())?;
    let prefix = prefix.trim();
    let role = role.trim();

    if !prefix.starts_with('/') || role.is_empty() || reason == Some("") {
        return Err(invalid());
    }

    let rule = PolicyRule::new(method, prefix, role);
    Ok(match reason {
        Some(reason) => rule.with_reason(reason),
        None => rule,
    })
}
