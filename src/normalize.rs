use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::domain::{NOT_REVEALED, Record};
use crate::error::CensusError;

static TOKEN_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\d+)").expect("token name pattern is valid"));

/// Turns one raw metadata document into a [`Record`].
///
/// An absent document, or one without an `attributes` list, is a placeholder
/// and yields `Ok(None)`. A present document whose `name` lacks `#<digits>`
/// is a schema problem and fails.
pub fn extract_record(document: Option<&Value>) -> Result<Option<Record>, CensusError> {
    let Some(document) = document else {
        return Ok(None);
    };
    let Some(attributes) = document.get("attributes").and_then(Value::as_array) else {
        return Ok(None);
    };

    let mut traits: HashMap<&str, String> = HashMap::new();
    for attribute in attributes {
        let Some(trait_type) = attribute.get("trait_type").and_then(Value::as_str) else {
            continue;
        };
        match attribute.get("value").and_then(attribute_text) {
            Some(value) => {
                traits.insert(trait_type, value);
            }
            None => {
                traits.remove(trait_type);
            }
        }
    }

    let token_id = token_id_from_name(document.get("name").and_then(Value::as_str))?;
    let mut take = |key: &str| traits.remove(key);

    Ok(Some(Record {
        token_id,
        image: document
            .get("image")
            .and_then(Value::as_str)
            .map(str::to_string),
        age: take("age"),
        body: take("body").unwrap_or_else(|| NOT_REVEALED.to_string()),
        disposition: take("disposition"),
        health: take("health"),
        is_awake: take("isAwake"),
        is_buried: take("isBuried"),
        generation: take("generation"),
        mitosis_credits: take("mitosisCredits"),
        parent_id: take("parentID"),
    }))
}

pub fn token_id_from_name(name: Option<&str>) -> Result<u64, CensusError> {
    let name = name.ok_or_else(|| CensusError::TokenName("<missing>".to_string()))?;
    TOKEN_NAME
        .captures(name)
        .and_then(|captures| captures.get(1))
        .and_then(|digits| digits.as_str().parse().ok())
        .ok_or_else(|| CensusError::TokenName(name.to_string()))
}

fn attribute_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn extracts_known_traits() {
        let document = json!({
            "name": "Gobbler #17",
            "image": "ipfs://image/17",
            "attributes": [
                { "trait_type": "age", "value": "adult" },
                { "trait_type": "body", "value": "Goo" },
                { "trait_type": "health", "value": 9 },
                { "trait_type": "isBuried", "value": false },
                { "trait_type": "generation", "value": "1" },
                { "trait_type": "mitosisCredits", "value": "2" },
                { "trait_type": "parentID", "value": "3" },
                { "trait_type": "mood", "value": "hungry" }
            ]
        });

        let record = extract_record(Some(&document)).unwrap().unwrap();
        assert_eq!(record.token_id, 17);
        assert_eq!(record.image.as_deref(), Some("ipfs://image/17"));
        assert_eq!(record.age.as_deref(), Some("adult"));
        assert_eq!(record.body, "Goo");
        assert_eq!(record.health.as_deref(), Some("9"));
        assert_eq!(record.is_buried.as_deref(), Some("false"));
        assert_eq!(record.parent_id.as_deref(), Some("3"));
        assert_eq!(record.disposition, None);
    }

    #[test]
    fn last_trait_wins_and_body_defaults() {
        let document = json!({
            "name": "Gobbler #2",
            "attributes": [
                { "trait_type": "health", "value": "4" },
                { "trait_type": "health", "value": "8" }
            ]
        });

        let record = extract_record(Some(&document)).unwrap().unwrap();
        assert_eq!(record.health.as_deref(), Some("8"));
        assert_eq!(record.body, NOT_REVEALED);
        assert_eq!(record.image, None);
    }

    #[test]
    fn null_value_clears_an_earlier_trait() {
        let document = json!({
            "name": "Gobbler #3",
            "attributes": [
                { "trait_type": "body", "value": "Goo" },
                { "trait_type": "health", "value": "6" },
                { "trait_type": "body", "value": null }
            ]
        });

        let record = extract_record(Some(&document)).unwrap().unwrap();
        assert_eq!(record.body, NOT_REVEALED);
        assert_eq!(record.health.as_deref(), Some("6"));
    }

    #[test]
    fn placeholders() {
        assert_eq!(extract_record(None).unwrap(), None);
        let no_attributes = json!({ "name": "Gobbler #2" });
        assert_eq!(extract_record(Some(&no_attributes)).unwrap(), None);
    }

    #[test]
    fn bad_name_fails() {
        let document = json!({ "name": "Gobbler two", "attributes": [] });
        assert_matches!(
            extract_record(Some(&document)),
            Err(CensusError::TokenName(_))
        );
        let nameless = json!({ "attributes": [] });
        assert_matches!(
            extract_record(Some(&nameless)),
            Err(CensusError::TokenName(_))
        );
    }

    #[test]
    fn first_digit_run_after_hash() {
        assert_eq!(token_id_from_name(Some("Gen 2 Gobbler #2013 (v2)")).unwrap(), 2013);
    }
}
