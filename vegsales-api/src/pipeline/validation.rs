//! Batch validation
//!
//! A batch is accepted or rejected as a whole. No record of a rejected batch reaches storage.

use serde_json::{Map, Value};
use vegsales_common::calendar;
use vegsales_common::models::RawSale;
use vegsales_common::{Error, Result};

/// Fields every incoming record must carry
pub const REQUIRED_FIELDS: [&str; 3] = ["date", "vegetable", "kilo_sold"];

/// Validate a decoded request body and convert it into typed records
///
/// The body must be a JSON array of objects, each with a `"YYYY-WW"` string `date`, a
/// non-blank string `vegetable` and a finite numeric `kilo_sold`. An empty array is valid.
/// Extra fields are ignored.
pub fn validate_batch(payload: &Value) -> Result<Vec<RawSale>> {
    let records = payload
        .as_array()
        .ok_or_else(|| Error::Validation("Data must be a list of records".to_string()))?;

    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let fields = record.as_object().ok_or_else(|| {
                Error::Validation(format!("Record {} must be a JSON object", index))
            })?;
            validate_record(index, fields)
        })
        .collect()
}

fn validate_record(index: usize, fields: &Map<String, Value>) -> Result<RawSale> {
    if let Some(missing) = REQUIRED_FIELDS.iter().find(|name| !fields.contains_key(**name)) {
        return Err(Error::Validation(format!(
            "All records must contain required columns (date, vegetable, kilo_sold); record {} is missing '{}'",
            index, missing
        )));
    }

    let date = fields["date"].as_str().ok_or_else(|| {
        Error::Validation(format!("Record {}: 'date' must be a string", index))
    })?;
    calendar::parse_date_label(date)
        .map_err(|e| Error::Validation(format!("Record {}: {}", index, validation_message(e))))?;

    let vegetable = fields["vegetable"].as_str().ok_or_else(|| {
        Error::Validation(format!("Record {}: 'vegetable' must be a string", index))
    })?;
    if vegetable.trim().is_empty() {
        return Err(Error::Validation(format!(
            "Record {}: 'vegetable' must not be empty",
            index
        )));
    }

    let kilo_sold = fields["kilo_sold"]
        .as_f64()
        .filter(|value| value.is_finite())
        .ok_or_else(|| {
            Error::Validation(format!("Record {}: 'kilo_sold' must be a number", index))
        })?;

    Ok(RawSale {
        date: date.to_string(),
        vegetable: vegetable.to_string(),
        kilo_sold,
    })
}

fn validation_message(err: Error) -> String {
    match err {
        Error::Validation(msg) => msg,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(result: Result<Vec<RawSale>>) -> String {
        match result {
            Err(Error::Validation(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_batch() {
        let batch = validate_batch(&json!([
            {"date": "2020-01", "vegetable": "tomate", "kilo_sold": 100},
            {"date": "2020-2", "vegetable": "pear", "kilo_sold": 12.5, "store": "north"}
        ]))
        .unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].vegetable, "tomate");
        assert_eq!(batch[0].kilo_sold, 100.0);
        assert_eq!(batch[1].date, "2020-2");
    }

    #[test]
    fn test_empty_batch_is_valid() {
        assert!(validate_batch(&json!([])).unwrap().is_empty());
    }

    #[test]
    fn test_non_array_rejected() {
        let msg = message(validate_batch(&json!({"date": "2020-01"})));
        assert_eq!(msg, "Data must be a list of records");
    }

    #[test]
    fn test_non_object_record_rejected() {
        let msg = message(validate_batch(&json!([42])));
        assert!(msg.contains("Record 0"));
    }

    #[test]
    fn test_missing_field_names_record_and_field() {
        let msg = message(validate_batch(&json!([
            {"date": "2020-01", "vegetable": "pear", "kilo_sold": 1},
            {"date": "2020-02", "vegetable": "pear"}
        ])));
        assert!(msg.contains("required columns"));
        assert!(msg.contains("record 1"));
        assert!(msg.contains("kilo_sold"));
    }

    #[test]
    fn test_bad_date_rejected() {
        for date in ["2020/01", "2020-54", "abcd-01", ""] {
            let result = validate_batch(&json!([{"date": date, "vegetable": "pear", "kilo_sold": 1}]));
            assert!(message(result).starts_with("Record 0"), "date {:?}", date);
        }
    }

    #[test]
    fn test_wrong_types_rejected() {
        assert!(validate_batch(&json!([{"date": 202001, "vegetable": "pear", "kilo_sold": 1}])).is_err());
        assert!(validate_batch(&json!([{"date": "2020-01", "vegetable": 7, "kilo_sold": 1}])).is_err());
        assert!(validate_batch(&json!([{"date": "2020-01", "vegetable": "pear", "kilo_sold": "1"}])).is_err());
        assert!(validate_batch(&json!([{"date": "2020-01", "vegetable": "pear", "kilo_sold": null}])).is_err());
    }

    #[test]
    fn test_blank_vegetable_rejected() {
        let msg = message(validate_batch(&json!([
            {"date": "2020-01", "vegetable": "   ", "kilo_sold": 1}
        ])));
        assert!(msg.contains("'vegetable'"));
    }

    #[test]
    fn test_negative_sales_accepted() {
        let batch = validate_batch(&json!([{"date": "2020-01", "vegetable": "pear", "kilo_sold": -3}])).unwrap();
        assert_eq!(batch[0].kilo_sold, -3.0);
    }
}
