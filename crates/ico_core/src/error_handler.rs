use serde::{Deserialize, Serialize};

/// Fine-grained failure category derived from node or wallet error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassifiedCategory {
    /// The wallet rejected the message because its seqno no longer matches.
    StaleNonce,
    /// The sender cannot cover the attached value plus fees.
    InsufficientBalance,
    /// Transport failure: timeouts, refused connections, DNS, 5xx.
    Network,
    /// The node accepted the request but refused the message.
    Rejected,
    /// Invalid or missing configuration.
    Configuration,
    Internal,
}

/// Classified error with context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedError {
    pub category: ClassifiedCategory,
    pub message: String,
    pub user_message: String,
    /// Whether the caller may resubmit after refreshing the seqno.
    pub resubmittable: bool,
}

/// Classify an error message by looking for known node/wallet patterns.
pub fn classify_message(message: &str) -> ClassifiedError {
    let msg = message.to_lowercase();

    let (category, user_msg, resubmittable) = if msg.contains("exitcode=33")
        || msg.contains("exit code 33")
        || msg.contains("invalid seqno")
        || msg.contains("seqno mismatch")
    {
        (
            ClassifiedCategory::StaleNonce,
            "Wallet seqno is stale. Fetch a fresh seqno before resubmitting.",
            true,
        )
    } else if msg.contains("insufficient") || msg.contains("not enough balance") {
        (
            ClassifiedCategory::InsufficientBalance,
            "Deployer wallet balance is too low for this batch.",
            false,
        )
    } else if msg.contains("timeout")
        || msg.contains("timed out")
        || msg.contains("connection")
        || msg.contains("dns")
        || msg.contains("502")
        || msg.contains("503")
    {
        (
            ClassifiedCategory::Network,
            "Network error. Check the node endpoint.",
            true,
        )
    } else if msg.contains("config") {
        (
            ClassifiedCategory::Configuration,
            "Configuration error. Check the deploy config.",
            false,
        )
    } else if msg.contains("rejected") || msg.contains("exitcode") || msg.contains("exit code") {
        (
            ClassifiedCategory::Rejected,
            "The node refused the message.",
            false,
        )
    } else {
        (
            ClassifiedCategory::Internal,
            "An unexpected error occurred.",
            false,
        )
    };

    ClassifiedError {
        category,
        message: message.to_string(),
        user_message: user_msg.to_string(),
        resubmittable,
    }
}

/// Classify an `anyhow::Error` using its full context chain.
pub fn classify_error(error: &anyhow::Error) -> ClassifiedError {
    classify_message(&format!("{error:#}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn classify_stale_seqno_exit_code() {
        let classified = classify_message("external message rejected: exitCode=33");
        assert_eq!(classified.category, ClassifiedCategory::StaleNonce);
        assert!(classified.resubmittable);
    }

    #[test]
    fn classify_insufficient_balance() {
        let classified = classify_message("Insufficient funds on account");
        assert_eq!(classified.category, ClassifiedCategory::InsufficientBalance);
        assert!(!classified.resubmittable);
    }

    #[test]
    fn classify_network_timeout() {
        let classified = classify_message("operation timed out");
        assert_eq!(classified.category, ClassifiedCategory::Network);
    }

    #[test]
    fn classify_rejection_without_known_code() {
        let classified = classify_message("message rejected: exitCode=35");
        assert_eq!(classified.category, ClassifiedCategory::Rejected);
    }

    #[test]
    fn classify_unknown_is_internal() {
        let classified = classify_message("something odd");
        assert_eq!(classified.category, ClassifiedCategory::Internal);
        assert_eq!(classified.user_message, "An unexpected error occurred.");
    }

    #[test]
    fn classify_error_uses_context_chain() {
        let err = anyhow!("connection refused").context("failed to send boc");
        let classified = classify_error(&err);
        assert_eq!(classified.category, ClassifiedCategory::Network);
        assert!(classified.message.contains("failed to send boc"));
    }
}
