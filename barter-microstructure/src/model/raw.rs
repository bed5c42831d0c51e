use crate::error::MicrostructureError;
use rust_decimal::{Decimal, prelude::FromPrimitive};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Order book as delivered by the market-data collaborator.
///
/// Example (Indodax `depth` shape, `buy`/`sell` keys are accepted as aliases):
/// ```json
/// {
///   "buy":  [["950000000", "0.0105"], ["949500000", "0.2"]],
///   "sell": [["951000000", "0.0300"], [951500000, 1.25]]
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct RawOrderBook {
    #[serde(default, alias = "buy")]
    pub bids: Vec<Value>,
    #[serde(default, alias = "sell")]
    pub asks: Vec<Value>,
}

/// Trade record as delivered by the market-data collaborator.
///
/// Example:
/// ```json
/// { "date": "1700000000", "price": "950000000", "amount": "0.01", "type": "buy", "tid": "123" }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct RawTrade {
    #[serde(default)]
    pub date: Value,
    #[serde(default)]
    pub price: Value,
    #[serde(default)]
    pub amount: Value,
    #[serde(default, rename = "type")]
    pub kind: Value,
    #[serde(default)]
    pub tid: Value,
}

/// Parse a decimal from either a JSON string or number.
///
/// Strings may use plain or scientific notation, eg/ "0.0105" or "1.05e-2".
pub fn decimal_from_value(value: &Value) -> Result<Decimal, MicrostructureError> {
    let malformed = || MicrostructureError::MalformedRecord(format!("not a decimal: {value}"));

    match value {
        Value::String(raw) => {
            let raw = raw.trim();
            Decimal::from_str(raw)
                .or_else(|_| Decimal::from_scientific(raw))
                .map_err(|_| malformed())
        }
        Value::Number(number) => {
            if let Some(integer) = number.as_i64() {
                Ok(Decimal::from(integer))
            } else if let Some(integer) = number.as_u64() {
                Ok(Decimal::from(integer))
            } else {
                number
                    .as_f64()
                    .filter(|float| float.is_finite())
                    .and_then(Decimal::from_f64)
                    .ok_or_else(malformed)
            }
        }
        _ => Err(malformed()),
    }
}

/// Parse a unix timestamp in seconds from either a JSON string or number.
pub fn timestamp_from_value(value: &Value) -> Result<i64, MicrostructureError> {
    let malformed = || MicrostructureError::MalformedRecord(format!("not a timestamp: {value}"));

    let parsed = match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(raw) => {
            let raw = raw.trim();
            raw.parse::<i64>().ok().or_else(|| {
                raw.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    };

    parsed.ok_or_else(malformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_decimal_from_value() {
        struct TestCase {
            input: Value,
            expected: Option<Decimal>,
        }

        let tests = vec![
            TestCase {
                // TC0: plain string
                input: json!("950000000"),
                expected: Some(dec!(950000000)),
            },
            TestCase {
                // TC1: fractional string with whitespace
                input: json!(" 0.0105 "),
                expected: Some(dec!(0.0105)),
            },
            TestCase {
                // TC2: scientific notation string
                input: json!("1.5e-3"),
                expected: Some(dec!(0.0015)),
            },
            TestCase {
                // TC3: integer number
                input: json!(42),
                expected: Some(dec!(42)),
            },
            TestCase {
                // TC4: float number
                input: json!(1.25),
                expected: Some(dec!(1.25)),
            },
            TestCase {
                // TC5: garbage string
                input: json!("abc"),
                expected: None,
            },
            TestCase {
                // TC6: null
                input: Value::Null,
                expected: None,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = decimal_from_value(&test.input).ok();
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_timestamp_from_value() {
        assert_eq!(timestamp_from_value(&json!(1700000000)), Ok(1700000000));
        assert_eq!(timestamp_from_value(&json!("1700000000")), Ok(1700000000));
        assert_eq!(timestamp_from_value(&json!(1700000000.9)), Ok(1700000000));
        assert!(timestamp_from_value(&json!("yesterday")).is_err());
        assert!(timestamp_from_value(&Value::Null).is_err());
    }

    #[test]
    fn test_raw_order_book_aliases() {
        let input = r#"{ "buy": [["100", "1"]], "sell": [[101, 2]] }"#;
        let book: RawOrderBook = serde_json::from_str(input).unwrap();
        assert_eq!(book.bids.len(), 1);
        assert_eq!(book.asks.len(), 1);

        let empty: RawOrderBook = serde_json::from_str("{}").unwrap();
        assert!(empty.bids.is_empty() && empty.asks.is_empty());
    }
}
