// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! The Policy Engine (spec §4.4, §4.5): target authorization, sliding-window
//! rate limiting, exploit gating, and violation accounting.

use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    UnauthorizedTarget,
    RateLimitExceeded,
    ExploitNotAllowed,
    InvalidAsset,
    ConfigurationError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyRule {
    pub name: String,
    pub description: String,
    pub enabled: bool,
    pub priority: i32,
    pub violation_type: ViolationType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyViolation {
    pub rule_name: String,
    pub violation_type: ViolationType,
    pub target: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub details: String,
    pub severity: Severity,
}

impl PolicyViolation {
    pub fn new(
        rule_name: impl Into<String>,
        violation_type: ViolationType,
        target: impl Into<String>,
        details: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            rule_name: rule_name.into(),
            violation_type,
            target: target.into(),
            timestamp: chrono::Utc::now(),
            details: details.into(),
            severity,
        }
    }
}

// ---------------------------------------------------------------------------
// Rate limiter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimiterConfig {
    pub window_size_secs: i64,
    pub max_requests: usize,
    pub global_max_requests: usize,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            window_size_secs: 60,
            max_requests: 10,
            global_max_requests: 30,
        }
    }
}

/// Per-key sliding window of admitted request timestamps (spec §4.3).
struct RateLimiterState {
    windows: HashMap<String, VecDeque<chrono::DateTime<chrono::Utc>>>,
}

pub struct RateLimiter {
    config: RateLimiterConfig,
    state: Mutex<RateLimiterState>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            state: Mutex::new(RateLimiterState { windows: HashMap::new() }),
        }
    }

    fn trim(window: &mut VecDeque<chrono::DateTime<chrono::Utc>>, now: chrono::DateTime<chrono::Utc>, window_size_secs: i64) {
        let cutoff = now - chrono::Duration::seconds(window_size_secs);
        while window.front().is_some_and(|t| *t < cutoff) {
            window.pop_front();
        }
    }

    /// Admission check only — does not record.
    pub fn check(&self, key: &str) -> bool {
        let now = chrono::Utc::now();
        let mut state = self.state.lock();
        let window = state.windows.entry(key.to_string()).or_default();
        Self::trim(window, now, self.config.window_size_secs);
        let per_key_ok = window.len() < self.config.max_requests;

        let global = state.windows.entry("global".to_string()).or_default();
        Self::trim(global, now, self.config.window_size_secs);
        let global_ok = global.len() < self.config.global_max_requests;

        per_key_ok && global_ok
    }

    /// Appends `now` to both the adapter-specific window and the global
    /// window. Must only be called after admission (spec §4.3, §8 rate
    /// conservation invariant).
    pub fn record(&self, key: &str) {
        let now = chrono::Utc::now();
        let mut state = self.state.lock();
        state.windows.entry(key.to_string()).or_default().push_back(now);
        state.windows.entry("global".to_string()).or_default().push_back(now);
    }

    /// Atomic check-then-record under a single critical section (spec §5:
    /// "the check-then-record sequence must be a single critical section
    /// per key").
    pub fn check_and_record(&self, key: &str) -> bool {
        let now = chrono::Utc::now();
        let mut state = self.state.lock();

        let window = state.windows.entry(key.to_string()).or_default();
        Self::trim(window, now, self.config.window_size_secs);
        let per_key_ok = window.len() < self.config.max_requests;

        let global = state.windows.entry("global".to_string()).or_default();
        Self::trim(global, now, self.config.window_size_secs);
        let global_ok = global.len() < self.config.global_max_requests;

        if per_key_ok && global_ok {
            state.windows.get_mut(key).unwrap().push_back(now);
            state.windows.get_mut("global").unwrap().push_back(now);
            true
        } else {
            false
        }
    }

    pub fn current_rate(&self, key: &str) -> f64 {
        let now = chrono::Utc::now();
        let mut state = self.state.lock();
        let window = state.windows.entry(key.to_string()).or_default();
        Self::trim(window, now, self.config.window_size_secs);
        window.len() as f64 / self.config.window_size_secs as f64
    }
}

// ---------------------------------------------------------------------------
// Target validator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetValidatorConfig {
    pub authorized_networks: Vec<String>,
    pub authorized_domains: Vec<String>,
    pub blocked_targets: Vec<String>,
}

pub struct TargetValidator {
    config: TargetValidatorConfig,
    networks: Vec<(IpAddr, u8)>,
}

impl TargetValidator {
    pub fn new(config: TargetValidatorConfig) -> Self {
        let networks = config
            .authorized_networks
            .iter()
            .filter_map(|cidr| parse_cidr(cidr))
            .collect();
        Self { config, networks }
    }

    /// Decision procedure of spec §4.4: blocklist first, then CIDR
    /// membership for IPs, then exact-or-suffix domain match.
    pub fn validate_target(&self, target: &str) -> bool {
        if self.config.blocked_targets.iter().any(|b| b == target) {
            return false;
        }
        if let Ok(ip) = target.parse::<IpAddr>() {
            return self.networks.iter().any(|(net, prefix)| ip_in_network(&ip, net, *prefix));
        }
        if !is_valid_fqdn(target) {
            return false;
        }
        self.config
            .authorized_domains
            .iter()
            .any(|d| target == d || target.ends_with(&format!(".{d}")))
    }
}

fn parse_cidr(s: &str) -> Option<(IpAddr, u8)> {
    let (addr, prefix) = s.split_once('/')?;
    let ip: IpAddr = addr.trim().parse().ok()?;
    let prefix: u8 = prefix.trim().parse().ok()?;
    Some((ip, prefix))
}

fn ip_in_network(ip: &IpAddr, net: &IpAddr, prefix: u8) -> bool {
    match (ip, net) {
        (IpAddr::V4(ip), IpAddr::V4(net)) => {
            let mask: u32 = if prefix == 0 { 0 } else { !0u32 << (32 - prefix) };
            (u32::from(*ip) & mask) == (u32::from(*net) & mask)
        }
        (IpAddr::V6(ip), IpAddr::V6(net)) => {
            let mask: u128 = if prefix == 0 { 0 } else { !0u128 << (128 - prefix) };
            (u128::from(*ip) & mask) == (u128::from(*net) & mask)
        }
        _ => false,
    }
}

/// Coarse RFC 1035-style FQDN shape check: dot-separated labels of
/// alphanumerics and hyphens, no empty labels, no leading/trailing hyphen.
fn is_valid_fqdn(s: &str) -> bool {
    if s.is_empty() || s.len() > 253 {
        return false;
    }
    s.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

// ---------------------------------------------------------------------------
// Policy engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub rate_limiting: RateLimiterConfig,
    pub target_validation: TargetValidatorConfig,
    #[serde(default)]
    pub allowed_exploits: Vec<String>,
}

/// Asset-shaped input to [`PolicyEngine::validate_asset`]: a target plus the
/// tool that wants to act on it.
pub struct PolicyAsset {
    pub target: String,
    pub tool_name: String,
}

struct PolicyState {
    rules: Vec<PolicyRule>,
    violations: Vec<PolicyViolation>,
}

pub struct PolicyEngine {
    target_validator: TargetValidator,
    rate_limiter: RateLimiter,
    allowed_exploits: Vec<String>,
    lab_mode: bool,
    state: Mutex<PolicyState>,
}

fn default_rules() -> Vec<PolicyRule> {
    vec![
        PolicyRule {
            name: "target_authorization".to_string(),
            description: "Only scan assets within the authorized network/domain list".to_string(),
            enabled: true,
            priority: 100,
            violation_type: ViolationType::UnauthorizedTarget,
        },
        PolicyRule {
            name: "rate_limiting".to_string(),
            description: "Bound request volume per adapter and globally".to_string(),
            enabled: true,
            priority: 50,
            violation_type: ViolationType::RateLimitExceeded,
        },
        PolicyRule {
            name: "exploit_gating".to_string(),
            description: "Exploitation requires lab mode or an explicit allowlist entry".to_string(),
            enabled: true,
            priority: 10,
            violation_type: ViolationType::ExploitNotAllowed,
        },
    ]
}

impl PolicyEngine {
    pub fn new(config: PolicyConfig, lab_mode: bool) -> Self {
        Self {
            target_validator: TargetValidator::new(config.target_validation),
            rate_limiter: RateLimiter::new(config.rate_limiting),
            allowed_exploits: config.allowed_exploits,
            lab_mode,
            state: Mutex::new(PolicyState { rules: default_rules(), violations: Vec::new() }),
        }
    }

    fn rule_name(&self, violation_type: ViolationType) -> String {
        let state = self.state.lock();
        state
            .rules
            .iter()
            .find(|r| r.violation_type == violation_type && r.enabled)
            .map(|r| r.name.clone())
            .unwrap_or_else(|| format!("{violation_type:?}"))
    }

    /// Runs target authorization then rate-limit admission, in that order
    /// (spec §4.5, §5 — order affects which violation type is recorded).
    pub fn validate_asset(&self, asset: &PolicyAsset) -> bool {
        if !self.target_validator.validate_target(&asset.target) {
            self.log_violation(PolicyViolation::new(
                self.rule_name(ViolationType::UnauthorizedTarget),
                ViolationType::UnauthorizedTarget,
                &asset.target,
                format!("target not in authorized networks/domains for tool {}", asset.tool_name),
                Severity::High,
            ));
            return false;
        }
        if !self.rate_limiter.check(&format!("adapter:{}", asset.tool_name)) {
            self.log_violation(PolicyViolation::new(
                self.rule_name(ViolationType::RateLimitExceeded),
                ViolationType::RateLimitExceeded,
                &asset.target,
                format!("rate limit exceeded for tool {}", asset.tool_name),
                Severity::Medium,
            ));
            return false;
        }
        true
    }

    /// Thin wrapper over the rate limiter; logs a violation on deny.
    pub fn enforce_rate_limits(&self, tool_name: &str) -> bool {
        let key = format!("adapter:{tool_name}");
        let admitted = self.rate_limiter.check_and_record(&key);
        if !admitted {
            self.log_violation(PolicyViolation::new(
                self.rule_name(ViolationType::RateLimitExceeded),
                ViolationType::RateLimitExceeded,
                tool_name,
                format!("rate limit exceeded for tool {tool_name}"),
                Severity::Medium,
            ));
        }
        admitted
    }

    pub fn check_exploit_permissions(&self, exploit: &str) -> bool {
        if self.lab_mode {
            return true;
        }
        let admitted = self.allowed_exploits.iter().any(|e| e == exploit);
        if !admitted {
            self.log_violation(PolicyViolation::new(
                self.rule_name(ViolationType::ExploitNotAllowed),
                ViolationType::ExploitNotAllowed,
                exploit,
                "exploitation not permitted outside lab mode without an allowlist entry".to_string(),
                Severity::High,
            ));
        }
        admitted
    }

    pub fn log_violation(&self, violation: PolicyViolation) {
        match violation.severity {
            Severity::High => tracing::error!(target: "policy", rule = %violation.rule_name, tgt = %violation.target, "policy violation: {}", violation.details),
            Severity::Medium => tracing::warn!(target: "policy", rule = %violation.rule_name, tgt = %violation.target, "policy violation: {}", violation.details),
            Severity::Low => tracing::debug!(target: "policy", rule = %violation.rule_name, tgt = %violation.target, "policy violation: {}", violation.details),
        }
        self.state.lock().violations.push(violation);
    }

    pub fn get_violation_report(&self) -> Vec<PolicyViolation> {
        self.state.lock().violations.clone()
    }

    pub fn get_current_rates(&self, keys: &[&str]) -> HashMap<String, f64> {
        keys.iter()
            .map(|k| (k.to_string(), self.rate_limiter.current_rate(&format!("adapter:{k}"))))
            .collect()
    }

    pub fn add_rule(&self, rule: PolicyRule) {
        let mut state = self.state.lock();
        state.rules.push(rule);
        state.rules.sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    pub fn remove_rule(&self, name: &str) {
        self.state.lock().rules.retain(|r| r.name != name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> PolicyEngine {
        PolicyEngine::new(
            PolicyConfig {
                rate_limiting: RateLimiterConfig { window_size_secs: 1, max_requests: 2, global_max_requests: 100 },
                target_validation: TargetValidatorConfig {
                    authorized_networks: vec!["192.168.1.0/24".to_string()],
                    authorized_domains: vec!["example.com".to_string()],
                    blocked_targets: vec![],
                },
                allowed_exploits: vec![],
            },
            false,
        )
    }

    #[test]
    fn scenario_1_authorization_gate() {
        let engine = engine();
        assert!(engine.validate_asset(&PolicyAsset { target: "192.168.1.50".to_string(), tool_name: "nmap".to_string() }));
        assert!(!engine.validate_asset(&PolicyAsset { target: "10.0.0.1".to_string(), tool_name: "nmap".to_string() }));
        let violations = engine.get_violation_report();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].violation_type, ViolationType::UnauthorizedTarget);
    }

    #[test]
    fn scenario_2_rate_limiting() {
        let engine = engine();
        assert!(engine.enforce_rate_limits("whois"));
        assert!(engine.enforce_rate_limits("whois"));
        assert!(!engine.enforce_rate_limits("whois"));
        assert!(engine.get_current_rates(&["whois"])["whois"] > 0.0);
    }

    #[test]
    fn blocked_target_denied_even_if_in_network() {
        let engine = PolicyEngine::new(
            PolicyConfig {
                rate_limiting: RateLimiterConfig::default(),
                target_validation: TargetValidatorConfig {
                    authorized_networks: vec!["192.168.1.0/24".to_string()],
                    authorized_domains: vec![],
                    blocked_targets: vec!["192.168.1.1".to_string()],
                },
                allowed_exploits: vec![],
            },
            false,
        );
        assert!(!engine.validate_asset(&PolicyAsset { target: "192.168.1.1".to_string(), tool_name: "nmap".to_string() }));
    }

    #[test]
    fn domain_suffix_match_admits_subdomain() {
        let engine = engine();
        assert!(engine.validate_asset(&PolicyAsset { target: "api.example.com".to_string(), tool_name: "whois".to_string() }));
    }

    #[test]
    fn exploit_gating_bypassed_in_lab_mode() {
        let engine = PolicyEngine::new(PolicyConfig::default(), true);
        assert!(engine.check_exploit_permissions("anything"));
    }

    #[test]
    fn exploit_gating_denies_outside_allowlist() {
        let engine = PolicyEngine::new(PolicyConfig::default(), false);
        assert!(!engine.check_exploit_permissions("eternalblue"));
    }

    #[test]
    fn invariant_violation_count_matches_denies() {
        let engine = engine();
        let _ = engine.validate_asset(&PolicyAsset { target: "10.0.0.1".to_string(), tool_name: "nmap".to_string() });
        let _ = engine.validate_asset(&PolicyAsset { target: "10.0.0.2".to_string(), tool_name: "nmap".to_string() });
        assert_eq!(engine.get_violation_report().len(), 2);
    }
}
