use serde::{Deserialize, Serialize};
use chrono::Utc;
use rand::Rng;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// Status recorded at booking time: a supplied payment method counts as paid.
    pub fn at_checkout(payment_method: Option<&str>) -> Self {
        if crate::is_blank(payment_method) {
            PaymentStatus::Pending
        } else {
            PaymentStatus::Paid
        }
    }

    /// Status after the booking is cancelled.
    pub fn after_cancellation(self) -> Self {
        match self {
            PaymentStatus::Paid => PaymentStatus::Refunded,
            other => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(PaymentStatus::Pending),
            "PAID" => Ok(PaymentStatus::Paid),
            "FAILED" => Ok(PaymentStatus::Failed),
            "REFUNDED" => Ok(PaymentStatus::Refunded),
            other => Err(format!("unknown payment status: {}", other)),
        }
    }
}

/// Opaque payment reference: `PAY-<base36 millis>-<0..999>`.
pub fn generate_payment_reference() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let salt: u32 = rand::thread_rng().gen_range(0..1000);
    format!("PAY-{}-{}", to_base36(millis), salt)
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}
