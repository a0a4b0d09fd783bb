//! Parsing and verification of M-Pesa payment confirmation messages.
//!
//! The parser only extracts candidate fields from user-supplied text; it does
//! not authenticate the transaction.

pub mod parser;
pub mod verifier;

pub use parser::{extract_amount, extract_recipient, parse, ParsedPayment};
pub use verifier::{verify, ExpectedPayment, PaymentVerifier, VerificationFailure, VerificationOutcome};
