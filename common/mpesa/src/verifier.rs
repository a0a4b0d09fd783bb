use crate::parser::{self, ParsedPayment};
use common_money::Money;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Amount and recipient a confirmation message must match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedPayment {
    pub amount: Money,
    pub recipient_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationFailure {
    #[error("no plan selected")]
    NoPlanSelected,
    #[error("unparseable input")]
    UnparseableMessage,
    #[error("amount mismatch: expected Ksh {expected}, found Ksh {actual}")]
    AmountMismatch { expected: Money, actual: Money },
    #[error("recipient mismatch: expected \"{expected}\"")]
    RecipientMismatch { expected: String },
}

impl VerificationFailure {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoPlanSelected => "no_plan_selected",
            Self::UnparseableMessage => "unparseable_message",
            Self::AmountMismatch { .. } => "amount_mismatch",
            Self::RecipientMismatch { .. } => "recipient_mismatch",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Verified,
    /// Never empty. Mismatches appear amount first, then recipient.
    Rejected(Vec<VerificationFailure>),
}

impl VerificationOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }

    pub fn failures(&self) -> &[VerificationFailure] {
        match self {
            Self::Verified => &[],
            Self::Rejected(failures) => failures,
        }
    }

    pub fn reasons(&self) -> Vec<String> {
        self.failures().iter().map(ToString::to_string).collect()
    }
}

fn labels_match(actual: &str, expected: &str) -> bool {
    actual.to_lowercase() == expected.to_lowercase()
}

/// Compare a parse result against the expected payment.
///
/// A missing `expected` is reported before the parse result is looked at.
/// Every failing comparison is reported, not just the first.
pub fn verify(
    parsed: Option<&ParsedPayment>,
    expected: Option<&ExpectedPayment>,
) -> VerificationOutcome {
    let Some(expected) = expected else {
        return VerificationOutcome::Rejected(vec![VerificationFailure::NoPlanSelected]);
    };
    let Some(parsed) = parsed else {
        return VerificationOutcome::Rejected(vec![VerificationFailure::UnparseableMessage]);
    };

    let mut failures = Vec::new();
    if parsed.amount() != expected.amount {
        failures.push(VerificationFailure::AmountMismatch {
            expected: expected.amount,
            actual: parsed.amount(),
        });
    }
    if !labels_match(parsed.recipient_label(), &expected.recipient_label) {
        failures.push(VerificationFailure::RecipientMismatch {
            expected: expected.recipient_label.clone(),
        });
    }

    if failures.is_empty() {
        VerificationOutcome::Verified
    } else {
        debug!(
            codes = ?failures.iter().map(VerificationFailure::code).collect::<Vec<_>>(),
            "Payment comparison failed"
        );
        VerificationOutcome::Rejected(failures)
    }
}

/// Verifier bound to the configured recipient (till / paybill name).
#[derive(Debug, Clone)]
pub struct PaymentVerifier {
    recipient_label: String,
}

impl PaymentVerifier {
    pub fn new(recipient_label: impl Into<String>) -> Self {
        Self { recipient_label: recipient_label.into().trim().to_string() }
    }

    pub fn recipient_label(&self) -> &str {
        &self.recipient_label
    }

    pub fn expected_for(&self, amount: Money) -> ExpectedPayment {
        ExpectedPayment { amount, recipient_label: self.recipient_label.clone() }
    }

    /// Parse `message` and verify it against `plan_price`.
    ///
    /// `None` for the price means no plan is selected; the message is not parsed.
    pub fn verify_message(&self, message: &str, plan_price: Option<Money>) -> VerificationOutcome {
        let outcome = match plan_price.map(|price| self.expected_for(price)) {
            None => verify(None, None),
            Some(expected) => verify(parser::parse(message).as_ref(), Some(&expected)),
        };
        info!(
            verified = outcome.is_verified(),
            failures = outcome.failures().len(),
            message_len = message.len(),
            "M-Pesa message verified"
        );
        outcome
    }
}
