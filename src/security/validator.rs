//! Request signal validation.
//!
//! Each check is independent and returns a [`SecurityDecision`] value.
//! Handlers run them cheapest-first and short-circuit on the first
//! rejection, so a bot caught by the honeypot never costs a downstream
//! call.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use url::Url;

use crate::downstream::CaptchaVerdict;
use crate::secrets::Secret;

type HmacSha256 = Hmac<Sha256>;

/// Why a request was rejected. The code is client-visible and audited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    HoneypotTriggered,
    SubmittedTooFast,
    LowCaptchaScore,
    InvalidSignature,
    DisallowedAction,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RejectReason::HoneypotTriggered => "honeypot_triggered",
            RejectReason::SubmittedTooFast => "submitted_too_fast",
            RejectReason::LowCaptchaScore => "low_captcha_score",
            RejectReason::InvalidSignature => "invalid_signature",
            RejectReason::DisallowedAction => "disallowed_action",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a security check. A value, never an error: expected
/// conditions do not raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityDecision {
    Accept,
    Reject(RejectReason),
}

impl SecurityDecision {
    pub fn rejection(self) -> Option<RejectReason> {
        match self {
            SecurityDecision::Accept => None,
            SecurityDecision::Reject(reason) => Some(reason),
        }
    }
}

/// A hidden form field that a human never fills in. Any non-empty value
/// marks the submission as automated.
pub fn check_honeypot(honeypot: Option<&str>) -> SecurityDecision {
    match honeypot {
        Some(value) if !value.trim().is_empty() => {
            SecurityDecision::Reject(RejectReason::HoneypotTriggered)
        }
        _ => SecurityDecision::Accept,
    }
}

/// Render-to-submit time reported by the client. Absent means a
/// non-browser caller with no render step, which the origin policy already
/// permits, so the check is skipped.
pub fn check_timing(elapsed_ms: Option<u64>, min_submission_ms: u64) -> SecurityDecision {
    match elapsed_ms {
        Some(elapsed) if elapsed < min_submission_ms => {
            SecurityDecision::Reject(RejectReason::SubmittedTooFast)
        }
        _ => SecurityDecision::Accept,
    }
}

/// Evaluate a CAPTCHA service verdict against the route's thresholds.
pub fn evaluate_captcha(
    verdict: &CaptchaVerdict,
    min_score: f64,
    allowed_actions: &[String],
) -> SecurityDecision {
    let action_ok = verdict
        .action
        .as_deref()
        .is_some_and(|action| allowed_actions.iter().any(|a| a == action));
    if !action_ok {
        return SecurityDecision::Reject(RejectReason::DisallowedAction);
    }

    match verdict.score {
        Some(score) if score >= min_score => SecurityDecision::Accept,
        _ => SecurityDecision::Reject(RejectReason::LowCaptchaScore),
    }
}

/// The requested audience must be in the configured allow-list.
pub fn check_audience(audience_id: &str, allowed_audiences: &[String]) -> SecurityDecision {
    if allowed_audiences.iter().any(|a| a == audience_id) {
        SecurityDecision::Accept
    } else {
        SecurityDecision::Reject(RejectReason::DisallowedAction)
    }
}

/// The webhook target must exactly match an allow-listed URL.
pub fn check_webhook_url(target: &str, allowed_webhooks: &[String]) -> SecurityDecision {
    let Ok(target_url) = Url::parse(target) else {
        return SecurityDecision::Reject(RejectReason::DisallowedAction);
    };
    let allowed = allowed_webhooks
        .iter()
        .filter_map(|raw| Url::parse(raw).ok())
        .any(|url| url == target_url);
    if allowed {
        SecurityDecision::Accept
    } else {
        SecurityDecision::Reject(RejectReason::DisallowedAction)
    }
}

/// Verify the caller's HMAC-SHA256 signature over the raw payload bytes.
///
/// Accepts an optional `sha256=` prefix on the hex digest. `verify_slice`
/// performs the comparison in constant time.
pub fn verify_webhook_signature(
    secret: &Secret,
    payload: &[u8],
    signature: &str,
) -> SecurityDecision {
    let hex_digest = signature.strip_prefix("sha256=").unwrap_or(signature);
    let Ok(sig_bytes) = hex::decode(hex_digest) else {
        return SecurityDecision::Reject(RejectReason::InvalidSignature);
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.expose().as_bytes()) else {
        return SecurityDecision::Reject(RejectReason::InvalidSignature);
    };
    mac.update(payload);

    if mac.verify_slice(&sig_bytes).is_ok() {
        SecurityDecision::Accept
    } else {
        SecurityDecision::Reject(RejectReason::InvalidSignature)
    }
}
