//! Path-based authorization policy.

use super::staff::Role;

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No identity was bound and the path is not public.
    Unauthenticated,
    /// An identity was bound but its role is not allowed on the path.
    InsufficientRole,
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Deny(DenyReason),
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow)
    }
}

/// A single role-gated prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRule {
    pub prefix: String,
    pub roles: Vec<Role>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Path pattern must start with '/': {0}")]
    InvalidPattern(String),

    #[error("Duplicate rule for prefix: {0}")]
    DuplicateRule(String),

    #[error("Rule for {0} names no roles")]
    EmptyRoles(String),
}

/// Static mapping from path prefixes to the roles allowed on them.
///
/// Matching is segment-aware: `/admin` covers `/admin` and `/admin/reportes`
/// but not `/administrator`. When several rules cover a path the longest
/// prefix wins. Paths covered by no rule need only a bound identity.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    public: Vec<String>,
    rules: Vec<AccessRule>,
}

impl AccessPolicy {
    pub fn builder() -> AccessPolicyBuilder {
        AccessPolicyBuilder::default()
    }

    /// True when the path needs no identity at all.
    pub fn is_public(&self, path: &str) -> bool {
        self.public.iter().any(|prefix| prefix_matches(prefix, path))
    }

    /// The most specific rule covering `path`, if any.
    pub fn rule_for(&self, path: &str) -> Option<&AccessRule> {
        self.rules
            .iter()
            .filter(|rule| prefix_matches(&rule.prefix, path))
            .max_by_key(|rule| rule.prefix.len())
    }

    /// Decide whether a request for `path` may proceed.
    pub fn authorize(&self, path: &str, bound_role: Option<Role>) -> AccessDecision {
        if self.is_public(path) {
            return AccessDecision::Allow;
        }

        let Some(role) = bound_role else {
            return AccessDecision::Deny(DenyReason::Unauthenticated);
        };

        match self.rule_for(path) {
            Some(rule) if !rule.roles.contains(&role) => {
                AccessDecision::Deny(DenyReason::InsufficientRole)
            }
            _ => AccessDecision::Allow,
        }
    }
}

impl Default for AccessPolicy {
    /// Login, health and static assets are public; `/admin` needs `ADMIN`.
    fn default() -> Self {
        Self {
            public: vec![
                "/api/auth/login".to_string(),
                "/api/health".to_string(),
                "/static".to_string(),
            ],
            rules: vec![AccessRule {
                prefix: "/admin".to_string(),
                roles: vec![Role::Admin],
            }],
        }
    }
}

#[derive(Debug, Default)]
pub struct AccessPolicyBuilder {
    public: Vec<String>,
    rules: Vec<(String, Vec<Role>)>,
}

impl AccessPolicyBuilder {
    pub fn public(mut self, prefix: impl Into<String>) -> Self {
        self.public.push(prefix.into());
        self
    }

    pub fn rule(mut self, prefix: impl Into<String>, roles: &[Role]) -> Self {
        self.rules.push((prefix.into(), roles.to_vec()));
        self
    }

    pub fn build(self) -> Result<AccessPolicy, PolicyError> {
        let mut public = Vec::with_capacity(self.public.len());
        for prefix in self.public {
            public.push(normalize(&prefix)?);
        }

        let mut rules: Vec<AccessRule> = Vec::with_capacity(self.rules.len());
        for (prefix, roles) in self.rules {
            let prefix = normalize(&prefix)?;
            if roles.is_empty() {
                return Err(PolicyError::EmptyRoles(prefix));
            }
            if rules.iter().any(|r| r.prefix == prefix) {
                return Err(PolicyError::DuplicateRule(prefix));
            }
            rules.push(AccessRule { prefix, roles });
        }

        Ok(AccessPolicy { public, rules })
    }
}

fn normalize(pattern: &str) -> Result<String, PolicyError> {
    if !pattern.starts_with('/') {
        return Err(PolicyError::InvalidPattern(pattern.to_string()));
    }
    let trimmed = pattern.trim_end_matches('/');
    Ok(if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    })
}

fn prefix_matches(prefix: &str, path: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
