//! Fetch attempt records.
//!
//! The retry loop is an explicit state machine: each attempt ends in exactly
//! one [`AttemptOutcome`], and the engine decides retry-or-terminal from the
//! outcome plus the family's attempt cap. Attempt records are internal; they
//! drive backoff and the final error message but are never exposed.

use crate::fetch::blocking::BlockReason;

/// Terminal state of one fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Blocked(BlockReason),
    NetworkError(String),
}

/// One retry's identity, outcome, and response size.
#[derive(Debug, Clone)]
pub struct FetchAttempt {
    /// 1-based attempt number.
    pub number: u32,
    /// Label of the identity profile used.
    pub identity: &'static str,
    pub outcome: AttemptOutcome,
    pub response_bytes: usize,
}

impl FetchAttempt {
    pub fn is_blocked(&self) -> bool {
        matches!(self.outcome, AttemptOutcome::Blocked(_))
    }
}

/// Summary over a finished attempt sequence, used to pick the terminal error.
pub fn last_block_reason(attempts: &[FetchAttempt]) -> Option<&BlockReason> {
    attempts.iter().rev().find_map(|a| match &a.outcome {
        AttemptOutcome::Blocked(reason) => Some(reason),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::blocking::BlockVendor;

    #[test]
    fn test_last_block_reason_prefers_latest() {
        let attempts = vec![
            FetchAttempt {
                number: 1,
                identity: "chrome-win",
                outcome: AttemptOutcome::Blocked(BlockReason::SuspiciouslySmall {
                    bytes: 10,
                    minimum: 1024,
                }),
                response_bytes: 10,
            },
            FetchAttempt {
                number: 2,
                identity: "safari-mac",
                outcome: AttemptOutcome::Blocked(BlockReason::Challenge {
                    vendor: Some(BlockVendor::Incapsula),
                }),
                response_bytes: 200,
            },
        ];
        assert_eq!(
            last_block_reason(&attempts),
            Some(&BlockReason::Challenge {
                vendor: Some(BlockVendor::Incapsula)
            })
        );
    }

    #[test]
    fn test_no_block_reason_for_network_failures() {
        let attempts = vec![FetchAttempt {
            number: 1,
            identity: "chrome-win",
            outcome: AttemptOutcome::NetworkError("connection reset".to_string()),
            response_bytes: 0,
        }];
        assert_eq!(last_block_reason(&attempts), None);
    }
}
