use serde_json::Value;

use super::session::PaymentStatus;

/// Extract a canonical payment status from an arbitrary backend payload.
///
/// The backend is not held to one schema: depending on the route answering,
/// the status may arrive as a direct `status` token, a payment-status string
/// on the record or its embedded order, or an order-status string. Rules are
/// evaluated in precedence order:
///
/// 1. a direct `status` string is taken verbatim (upper-cased) when it is one
///    of the canonical tokens; anything else yields no candidate,
/// 2. a payment-status string matches on substring (COMP / FAIL / PEND),
/// 3. an order-status string equal to CONFIRMED or PAID means completed.
///
/// `Expired` is never produced here: expiry is a local countdown outcome, not
/// something the wire can report.
pub fn normalize_status(payload: &Value) -> Option<PaymentStatus> {
    if let Some(direct) = payload.get("status").and_then(Value::as_str) {
        return parse_canonical(&direct.to_uppercase());
    }

    if let Some(payment_status) = string_field(payload, &["paymentStatus", "payment_status"]) {
        let upper = payment_status.to_uppercase();
        if upper.contains("COMP") {
            return Some(PaymentStatus::Completed);
        }
        if upper.contains("FAIL") {
            return Some(PaymentStatus::Failed);
        }
        if upper.contains("PEND") {
            return Some(PaymentStatus::Pending);
        }
        // Unrecognized payment-status strings fall through to the order rules
    }

    if let Some(order_status) = string_field(payload, &["orderStatus", "order_status", "status"]) {
        let upper = order_status.to_uppercase();
        if upper == "CONFIRMED" || upper == "PAID" {
            return Some(PaymentStatus::Completed);
        }
    }

    None
}

fn parse_canonical(token: &str) -> Option<PaymentStatus> {
    match token {
        "PENDING" => Some(PaymentStatus::Pending),
        "COMPLETED" => Some(PaymentStatus::Completed),
        "FAILED" => Some(PaymentStatus::Failed),
        _ => None,
    }
}

/// Look a string field up at the top level or nested under `order`. The
/// top-level `status` key never reaches this helper for rule 1's benefit, so
/// including it in the key list only ever reads `order.status`.
fn string_field<'a>(payload: &'a Value, keys: &[&str]) -> Option<&'a str> {
    for key in keys {
        if *key != "status" {
            if let Some(value) = payload.get(*key).and_then(Value::as_str) {
                return Some(value);
            }
        }
        if let Some(value) = payload
            .get("order")
            .and_then(|order| order.get(*key))
            .and_then(Value::as_str)
        {
            return Some(value);
        }
    }
    None
}
