//! Unlock verifier: monotonic-prefix acceptance of the session secret

use lockin_api::UnlockProgress;
use lockin_util::UnlockSecret;

/// Result of checking one candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlockVerdict {
    pub accept: bool,
    pub complete: bool,
}

/// Check a candidate against the secret
///
/// A candidate is accepted while it is a case-sensitive prefix of the
/// secret, and completes the unlock when it equals the secret. The empty
/// secret accepts nothing.
pub fn verify(candidate: &str, secret: &str) -> UnlockVerdict {
    if secret.is_empty() {
        return UnlockVerdict {
            accept: false,
            complete: false,
        };
    }

    let accept = candidate.len() <= secret.len() && secret.starts_with(candidate);
    UnlockVerdict {
        accept,
        complete: accept && candidate == secret,
    }
}

/// In-progress unlock input for one secret
///
/// Holds the last accepted candidate. Rejected candidates leave it
/// unchanged. Switching to a different secret starts over from empty.
#[derive(Debug, Default)]
pub struct UnlockAttempt {
    secret: UnlockSecret,
    accepted: String,
}

impl UnlockAttempt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebind to `secret`, clearing the input if it changed
    pub fn bind(&mut self, secret: &UnlockSecret) {
        if &self.secret != secret {
            self.secret = secret.clone();
            self.accepted.clear();
        }
    }

    /// Feed the next candidate
    pub fn submit(&mut self, candidate: &str, secret: &UnlockSecret) -> UnlockProgress {
        self.bind(secret);

        let verdict = verify(candidate, self.secret.as_str());
        if verdict.accept {
            self.accepted = candidate.to_string();
        }

        UnlockProgress {
            accepted: verdict.accept,
            complete: verdict.complete,
            typed: self.accepted.len(),
            total: self.secret.len(),
        }
    }

    /// Progress without submitting anything
    pub fn progress(&self, secret: &UnlockSecret) -> UnlockProgress {
        let typed = if &self.secret == secret {
            self.accepted.len()
        } else {
            0
        };
        UnlockProgress {
            accepted: false,
            complete: false,
            typed,
            total: secret.len(),
        }
    }

    /// The accepted prefix
    pub fn accepted(&self) -> &str {
        &self.accepted
    }

    pub fn reset(&mut self) {
        self.secret = UnlockSecret::empty();
        self.accepted.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "abcd-1234";

    #[test]
    fn prefix_is_accepted() {
        assert_eq!(
            verify("abc", SECRET),
            UnlockVerdict {
                accept: true,
                complete: false
            }
        );
        assert!(verify("", SECRET).accept);
    }

    #[test]
    fn wrong_character_rejected() {
        let verdict = verify("abd", SECRET);
        assert!(!verdict.accept);
        assert!(!verdict.complete);
    }

    #[test]
    fn exact_match_completes() {
        assert_eq!(
            verify(SECRET, SECRET),
            UnlockVerdict {
                accept: true,
                complete: true
            }
        );
    }

    #[test]
    fn overlong_and_case_changes_rejected() {
        assert!(!verify("abcd-12345", SECRET).accept);
        assert!(!verify("ABC", SECRET).accept);
    }

    #[test]
    fn empty_secret_accepts_nothing() {
        assert!(!verify("", "").accept);
        assert!(!verify("", "").complete);
        assert!(!verify("a", "").accept);
    }

    #[test]
    fn rejected_input_keeps_previous_value() {
        let secret = UnlockSecret::from_string(SECRET);
        let mut attempt = UnlockAttempt::new();

        let p = attempt.submit("abc", &secret);
        assert!(p.accepted);
        assert_eq!(p.typed, 3);

        let p = attempt.submit("abd", &secret);
        assert!(!p.accepted);
        assert_eq!(attempt.accepted(), "abc");
        assert_eq!(p.typed, 3);
        assert_eq!(p.total, 9);

        let p = attempt.submit(SECRET, &secret);
        assert!(p.complete);
    }

    #[test]
    fn new_secret_resets_attempt() {
        let mut attempt = UnlockAttempt::new();
        attempt.submit("abc", &UnlockSecret::from_string(SECRET));

        let other = UnlockSecret::from_string("zzzz-9999");
        assert_eq!(attempt.progress(&other).typed, 0);

        attempt.bind(&other);
        assert_eq!(attempt.accepted(), "");
    }
}
