//! Field extraction from pasted M-Pesa confirmation messages.
//!
//! Two independent first-match scans run over the text: one for the `Ksh`
//! amount token and one for the recipient marker (`to:`, `Paybill:`,
//! `Till Number:`). Both must succeed for a message to parse. A bare `to`
//! without a colon is only consulted when no colon marker exists anywhere.

use common_money::Money;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

// "Ksh", one optional whitespace char, digits with comma grouping, optional 2-digit fraction.
static AMOUNT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)ksh\s?(\d[\d,]*(?:\.\d{2})?)").expect("amount pattern compiles")
});

// Marker, ':', then the label up to newline or comma.
static RECIPIENT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:to|paybill|till[ \t]+number)\b[ \t]*:[ \t]*([^\n,]*)")
        .expect("recipient pattern compiles")
});

// Peer-transfer phrasing ("sent to NAME") with no colon.
static BARE_TRANSFER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bto[ \t]+([^\n,]*)").expect("transfer pattern compiles")
});

/// Amount and recipient extracted from a confirmation message.
///
/// Only [`parse`] builds this, so both fields are always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedPayment {
    amount: Money,
    recipient_label: String,
}

impl ParsedPayment {
    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn recipient_label(&self) -> &str {
        &self.recipient_label
    }
}

/// First `Ksh` amount in the text, with grouping commas removed.
///
/// Returns `None` when no token exists or the digits do not fit in [`Money`].
pub fn extract_amount(text: &str) -> Option<Money> {
    let raw = AMOUNT_PATTERN.captures(text)?.get(1)?.as_str();
    let digits: String = raw.chars().filter(|c| *c != ',').collect();
    match Money::parse_major(&digits) {
        Ok(amount) => Some(amount),
        Err(err) => {
            debug!(error = %err, "Amount token rejected");
            None
        }
    }
}

/// Label following the first colon-terminated recipient marker, trimmed.
/// Falls back to the first bare `to` only when no such marker exists.
/// The label may be empty.
pub fn extract_recipient(text: &str) -> Option<&str> {
    RECIPIENT_PATTERN
        .captures(text)
        .or_else(|| BARE_TRANSFER_PATTERN.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

/// Parse a confirmation message. All-or-nothing: a missing amount or a
/// missing recipient marker yields `None`.
pub fn parse(text: &str) -> Option<ParsedPayment> {
    let amount = extract_amount(text);
    let recipient = extract_recipient(text);
    debug!(
        message_len = text.len(),
        amount_found = amount.is_some(),
        recipient_found = recipient.is_some(),
        "Scanned confirmation message"
    );
    Some(ParsedPayment {
        amount: amount?,
        recipient_label: recipient?.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ksh(units: i64) -> Money {
        Money::from_major(units).unwrap()
    }

    #[test]
    fn paybill_message_parses() {
        let parsed = parse("Confirmed. Ksh 1000 sent. Paybill: CLICKSURVEY\nThank you").unwrap();
        assert_eq!(parsed.amount(), ksh(1000));
        assert_eq!(parsed.recipient_label(), "CLICKSURVEY");
    }

    #[test]
    fn grouped_amount_with_to_marker() {
        let parsed = parse("Ksh1,000.00 to CLICKSURVEY").unwrap();
        assert_eq!(parsed.amount(), ksh(1000));
        assert_eq!(parsed.recipient_label(), "CLICKSURVEY");
    }

    #[test]
    fn till_number_marker_and_comma_terminator() {
        let parsed = parse("QK12AB Confirmed. Ksh 1,234.56 paid. Till Number: Click Survey , on 2/3/24").unwrap();
        assert_eq!(parsed.amount(), Money::from_cents(123_456));
        assert_eq!(parsed.recipient_label(), "Click Survey");
    }

    #[test]
    fn markers_and_currency_are_case_insensitive() {
        let parsed = parse("KSH 250 PAYBILL: ClickSurvey").unwrap();
        assert_eq!(parsed.amount(), ksh(250));
        assert_eq!(parsed.recipient_label(), "ClickSurvey");
    }

    #[test]
    fn first_amount_wins() {
        assert_eq!(extract_amount("Ksh 300 sent. New balance is Ksh 9,000.00"), Some(ksh(300)));
    }

    #[test]
    fn first_marker_wins() {
        assert_eq!(extract_recipient("Paybill: FIRST\nTill Number: SECOND"), Some("FIRST"));
    }

    #[test]
    fn fraction_needs_two_digits() {
        // "1.5" is not a cent-precision fraction, only the integer part is taken.
        assert_eq!(extract_amount("Ksh 1.5"), Some(ksh(1)));
        assert_eq!(extract_amount("Ksh 1.50"), Some(Money::from_cents(150)));
    }

    #[test]
    fn transfer_wording_does_not_hide_paybill() {
        let parsed = parse("Confirmed. Ksh 1000 sent to Paybill: CLICKSURVEY\nThank you").unwrap();
        assert_eq!(parsed.recipient_label(), "CLICKSURVEY");
        let parsed = parse("Ksh 1000 paid to M-PESA. Paybill: CLICKSURVEY").unwrap();
        assert_eq!(parsed.recipient_label(), "CLICKSURVEY");
        assert_eq!(extract_recipient("Welcome to M-PESA\nTill Number: SHOP"), Some("SHOP"));
    }

    #[test]
    fn bare_to_is_a_fallback_only() {
        assert_eq!(extract_recipient("sent to CLICKSURVEY on 2/3/24"), Some("CLICKSURVEY on 2/3/24"));
        assert_eq!(extract_recipient("sent to\nCLICKSURVEY"), None);
    }

    #[test]
    fn merchant_markers_need_a_colon() {
        assert_eq!(parse("Ksh 500 Paybill CLICKSURVEY"), None);
        assert_eq!(extract_recipient("Till Number 12345, ok"), None);
        assert_eq!(extract_recipient("Till Number : 12345, ok"), Some("12345"));
    }

    #[test]
    fn marker_inside_word_is_ignored() {
        assert_eq!(extract_recipient("total: 500"), None);
        assert_eq!(extract_recipient("Customer paybills: X"), None);
    }

    #[test]
    fn whitespace_only_label_is_empty_not_failure() {
        let parsed = parse("Ksh 500 Paybill:   \nrest").unwrap();
        assert_eq!(parsed.recipient_label(), "");
    }

    #[test]
    fn missing_either_field_fails() {
        assert_eq!(parse("Ksh 500 sent"), None);
        assert_eq!(parse("Paybill: CLICKSURVEY"), None);
        assert_eq!(parse(""), None);
        assert_eq!(parse("garbage text"), None);
    }

    #[test]
    fn oversized_amount_is_unparseable() {
        assert_eq!(parse("Ksh 99999999999999999999999 Paybill: X"), None);
    }

    #[test]
    fn bare_currency_marker_is_not_an_amount() {
        assert_eq!(extract_amount("Ksh ,,, Paybill: X"), None);
    }
}
