//! Domain allow-list with per-domain auth-injection rules.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// How a domain's credential is attached to an outbound request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuthRule {
    /// Send the credential as `Authorization: Bearer <secret>`.
    #[default]
    Bearer,
    /// Send the credential in a custom request header.
    Header {
        /// Header name to carry the secret.
        name: String,
    },
    /// Append the credential as a query parameter.
    Query {
        /// Query parameter name to carry the secret.
        param: String,
    },
    /// Substitute the credential for the `{api_key}` placeholder in the
    /// endpoint path.
    PathToken,
}

/// One approved domain pattern and the auth rule applied to it.
///
/// Patterns match by case-insensitive substring against the request host, so
/// `coingecko.com` approves `api.coingecko.com` as well.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRule {
    pattern: String,
    #[serde(default)]
    auth: AuthRule,
}

impl DomainRule {
    /// Creates a rule for the given pattern.
    #[must_use]
    pub fn new(pattern: impl Into<String>, auth: AuthRule) -> Self {
        Self {
            pattern: pattern.into().to_ascii_lowercase(),
            auth,
        }
    }

    /// Approved domain substring, stored lowercase.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Auth rule applied to hosts matching this pattern.
    #[must_use]
    pub fn auth(&self) -> &AuthRule {
        &self.auth
    }

    fn matches(&self, host: &str) -> bool {
        host.to_ascii_lowercase().contains(&self.pattern)
    }
}

/// Outcome of evaluating a host against the allow-list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomainDecision {
    /// The host matched an approved pattern; inject per the rule.
    Allowed {
        /// Pattern that matched.
        pattern: String,
        /// Auth rule of the matching pattern.
        auth: AuthRule,
    },
    /// The host matched nothing; the call must be rejected.
    Denied,
}

impl DomainDecision {
    /// Whether the call may proceed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    /// Auth rule of the matching pattern, when allowed.
    #[must_use]
    pub fn auth(&self) -> Option<&AuthRule> {
        match self {
            Self::Allowed { auth, .. } => Some(auth),
            Self::Denied => None,
        }
    }
}

/// Ordered allow-list of approved domain patterns.
///
/// Evaluation is first-match-wins, so a narrow pattern with a dedicated auth
/// rule can precede a broader one. The list is extensible at runtime through
/// [`DomainPolicy::allow`] and from the environment without code changes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainPolicy {
    rules: Vec<DomainRule>,
}

impl DomainPolicy {
    /// Creates an empty policy that rejects every host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an approved pattern using the default bearer rule.
    #[must_use]
    pub fn with_domain(self, pattern: impl Into<String>) -> Self {
        self.with_rule(pattern, AuthRule::default())
    }

    /// Adds an approved pattern with an explicit auth rule.
    #[must_use]
    pub fn with_rule(mut self, pattern: impl Into<String>, auth: AuthRule) -> Self {
        self.rules.push(DomainRule::new(pattern, auth));
        self
    }

    /// Adds patterns parsed from a comma-separated list, all with the default
    /// bearer rule. Blank entries are skipped.
    #[must_use]
    pub fn with_domain_list(mut self, list: &str) -> Self {
        for entry in list.split(',') {
            let entry = entry.trim();
            if !entry.is_empty() {
                self.rules.push(DomainRule::new(entry, AuthRule::default()));
            }
        }
        self
    }

    /// Adds patterns from a comma-separated environment variable, when set.
    #[must_use]
    pub fn with_env_domains(self, var: &str) -> Self {
        match std::env::var(var) {
            Ok(list) => self.with_domain_list(&list),
            Err(_) => self,
        }
    }

    /// Approves one more pattern at runtime.
    pub fn allow(&mut self, pattern: impl Into<String>, auth: AuthRule) {
        self.rules.push(DomainRule::new(pattern, auth));
    }

    /// Evaluates a request host against the allow-list.
    #[must_use]
    pub fn evaluate(&self, host: &str) -> DomainDecision {
        for rule in &self.rules {
            if rule.matches(host) {
                return DomainDecision::Allowed {
                    pattern: rule.pattern.clone(),
                    auth: rule.auth.clone(),
                };
            }
        }
        debug!(host, "host matched no approved domain pattern");
        DomainDecision::Denied
    }

    /// Number of approved patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the policy approves nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_match_approves_subdomains() {
        let policy = DomainPolicy::new().with_domain("coingecko.com");
        assert!(policy.evaluate("api.coingecko.com").is_allowed());
        assert!(policy.evaluate("API.COINGECKO.COM").is_allowed());
        assert!(!policy.evaluate("api.coinpecko.com").is_allowed());
    }

    #[test]
    fn empty_policy_denies_everything() {
        let policy = DomainPolicy::new();
        assert_eq!(policy.evaluate("example.com"), DomainDecision::Denied);
    }

    #[test]
    fn first_matching_rule_wins() {
        let policy = DomainPolicy::new()
            .with_rule(
                "api.example.com",
                AuthRule::Query {
                    param: "api_key".into(),
                },
            )
            .with_rule("example.com", AuthRule::Bearer);

        let decision = policy.evaluate("api.example.com");
        assert_eq!(
            decision.auth(),
            Some(&AuthRule::Query {
                param: "api_key".into()
            })
        );

        let broader = policy.evaluate("www.example.com");
        assert_eq!(broader.auth(), Some(&AuthRule::Bearer));
    }

    #[test]
    fn domain_list_parsing_skips_blanks() {
        let policy = DomainPolicy::new().with_domain_list(" etherscan.io, , coingecko.com ,");
        assert_eq!(policy.len(), 2);
        assert!(policy.evaluate("api.etherscan.io").is_allowed());
        assert!(policy.evaluate("coingecko.com").is_allowed());
    }

    #[test]
    fn runtime_allow_extends_the_list() {
        let mut policy = DomainPolicy::new();
        assert!(!policy.evaluate("newapi.dev").is_allowed());
        policy.allow(
            "newapi.dev",
            AuthRule::Header {
                name: "x-api-key".into(),
            },
        );
        let decision = policy.evaluate("data.newapi.dev");
        assert!(decision.is_allowed());
        assert_eq!(
            decision.auth(),
            Some(&AuthRule::Header {
                name: "x-api-key".into()
            })
        );
    }

    #[test]
    fn rules_serialize_with_kind_tags() {
        let rule = DomainRule::new(
            "example.com",
            AuthRule::Query {
                param: "key".into(),
            },
        );
        let text = serde_json::to_string(&rule).expect("serialize");
        assert!(text.contains(r#""kind":"query""#));
        let back: DomainRule = serde_json::from_str(&text).expect("parse");
        assert_eq!(back, rule);
    }
}
