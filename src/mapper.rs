//! Pure mapping from an enriched Segment profile into Voucherify's customer
//! schema. No I/O, no shared state; safe to call concurrently.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::contract::{EnrichedProfile, Traits};

/// Fixed provenance marker stamped into every customer's system_metadata.
const SOURCE_TAG: &str = "segmentio";

/// Customer payload for Voucherify's bulk upsert endpoint.
///
/// Optional fields serialise as explicit nulls (the original integration
/// always sent the full shape, address included).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoucherifyCustomer {
    pub name: Option<String>,
    pub source_id: String,
    pub email: Option<String>,
    pub description: Option<String>,
    pub address: Address,
    pub phone: Option<String>,
    pub birthdate: Option<String>,
    pub metadata: Option<Value>,
    pub system_metadata: Value,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Address {
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub line_1: Option<String>,
    pub country: Option<String>,
}

/// First non-empty string value among the given trait keys.
fn str_trait(traits: &Traits, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| traits.get(*key).and_then(Value::as_str))
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

fn resolve_name(traits: &Traits) -> Option<String> {
    if let Some(name) = str_trait(traits, &["name"]) {
        return Some(name);
    }
    // Absent parts are omitted, not rendered as empty strings.
    let parts: Vec<String> = [
        str_trait(traits, &["firstName", "first_name"]),
        str_trait(traits, &["lastName", "last_name"]),
    ]
    .into_iter()
    .flatten()
    .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

fn resolve_address(traits: &Traits) -> Address {
    if let Some(nested) = traits.get("address").and_then(Value::as_object) {
        Address {
            city: str_trait(nested, &["city"]),
            state: str_trait(nested, &["state"]),
            postal_code: str_trait(nested, &["postalCode", "postal_code"]),
            line_1: str_trait(nested, &["street", "line_1"]),
            country: str_trait(nested, &["country"]),
        }
    } else {
        Address {
            city: str_trait(traits, &["city"]),
            state: str_trait(traits, &["state"]),
            postal_code: str_trait(traits, &["postalCode", "postal_code"]),
            line_1: str_trait(traits, &["street", "line_1"]),
            country: str_trait(traits, &["country"]),
        }
    }
}

/// Normalise a birthdate trait to a `YYYY-MM-DD` calendar date, discarding
/// any time-of-day component. Unparseable values map to `None` with a
/// warning rather than a wrong date.
fn resolve_birthdate(traits: &Traits) -> Option<String> {
    let raw = str_trait(traits, &["birthdate"])?;
    let date_part = raw.split('T').next().unwrap_or(raw.as_str());
    match chrono::NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        Ok(date) => Some(date.format("%Y-%m-%d").to_string()),
        Err(_) => {
            warn!(birthdate = %raw, "unparseable birthdate trait; mapping to null");
            None
        }
    }
}

/// Map one enriched profile into a Voucherify customer. Pure and total:
/// equal input always yields identical output.
pub fn map_customer(profile: &EnrichedProfile) -> VoucherifyCustomer {
    let empty = Traits::new();
    let traits = profile.traits.as_ref().unwrap_or(&empty);

    VoucherifyCustomer {
        name: resolve_name(traits),
        source_id: profile.source_id.clone(),
        email: str_trait(traits, &["email"]),
        description: str_trait(traits, &["description"]),
        address: resolve_address(traits),
        phone: str_trait(traits, &["phone"]),
        birthdate: resolve_birthdate(traits),
        metadata: traits.get("metadata").filter(|v| !v.is_null()).cloned(),
        system_metadata: serde_json::json!({ "source": SOURCE_TAG }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile_with(traits: Value) -> EnrichedProfile {
        EnrichedProfile {
            segment_id: "seg-1".to_string(),
            traits: Some(traits.as_object().unwrap().clone()),
            source_id: "src-1".to_string(),
        }
    }

    #[test]
    fn explicit_name_wins() {
        let customer = map_customer(&profile_with(json!({
            "name": "Ann Lee",
            "firstName": "Other",
            "lastName": "Person"
        })));
        assert_eq!(customer.name.as_deref(), Some("Ann Lee"));
    }

    #[test]
    fn name_falls_back_to_joined_parts() {
        let customer = map_customer(&profile_with(json!({
            "firstName": "Ann",
            "lastName": "Lee"
        })));
        assert_eq!(customer.name.as_deref(), Some("Ann Lee"));
    }

    #[test]
    fn single_name_part_is_not_padded() {
        let customer = map_customer(&profile_with(json!({ "firstName": "Ann" })));
        assert_eq!(customer.name.as_deref(), Some("Ann"));
    }

    #[test]
    fn snake_case_name_parts_accepted() {
        let customer = map_customer(&profile_with(json!({
            "first_name": "Ann",
            "last_name": "Lee"
        })));
        assert_eq!(customer.name.as_deref(), Some("Ann Lee"));
    }

    #[test]
    fn no_name_traits_maps_to_null() {
        let customer = map_customer(&profile_with(json!({ "email": "a@b.c" })));
        assert_eq!(customer.name, None);
    }

    #[test]
    fn birthdate_time_component_is_stripped() {
        let customer = map_customer(&profile_with(json!({
            "birthdate": "1990-05-02T00:00:00.000Z"
        })));
        assert_eq!(customer.birthdate.as_deref(), Some("1990-05-02"));
    }

    #[test]
    fn plain_birthdate_passes_through() {
        let customer = map_customer(&profile_with(json!({ "birthdate": "1990-05-02" })));
        assert_eq!(customer.birthdate.as_deref(), Some("1990-05-02"));
    }

    #[test]
    fn unparseable_birthdate_maps_to_null() {
        let customer = map_customer(&profile_with(json!({ "birthdate": "not-a-date" })));
        assert_eq!(customer.birthdate, None);
    }

    #[test]
    fn structured_address_with_alias_fallbacks() {
        let customer = map_customer(&profile_with(json!({
            "address": {
                "city": "Gdansk",
                "state": "PM",
                "postalCode": "80-001",
                "street": "Long Lane 1",
                "country": "PL"
            }
        })));
        assert_eq!(customer.address.city.as_deref(), Some("Gdansk"));
        assert_eq!(customer.address.postal_code.as_deref(), Some("80-001"));
        assert_eq!(customer.address.line_1.as_deref(), Some("Long Lane 1"));
    }

    #[test]
    fn flat_address_traits_used_without_object() {
        let customer = map_customer(&profile_with(json!({
            "city": "Gdansk",
            "postal_code": "80-001",
            "line_1": "Long Lane 1"
        })));
        assert_eq!(customer.address.city.as_deref(), Some("Gdansk"));
        assert_eq!(customer.address.postal_code.as_deref(), Some("80-001"));
        assert_eq!(customer.address.line_1.as_deref(), Some("Long Lane 1"));
        assert_eq!(customer.address.state, None);
    }

    #[test]
    fn null_traits_maps_to_emptiest_record() {
        let profile = EnrichedProfile {
            segment_id: "seg-1".to_string(),
            traits: None,
            source_id: "src-1".to_string(),
        };
        let customer = map_customer(&profile);
        assert_eq!(customer.source_id, "src-1");
        assert_eq!(customer.name, None);
        assert_eq!(customer.email, None);
        assert_eq!(customer.address, Address::default());
        assert_eq!(customer.system_metadata, json!({ "source": "segmentio" }));
    }

    #[test]
    fn metadata_is_copied_verbatim() {
        let customer = map_customer(&profile_with(json!({
            "metadata": { "tier": "gold", "visits": 7 }
        })));
        assert_eq!(
            customer.metadata,
            Some(json!({ "tier": "gold", "visits": 7 }))
        );
    }

    #[test]
    fn mapping_is_deterministic() {
        let profile = profile_with(json!({
            "firstName": "Ann",
            "lastName": "Lee",
            "birthdate": "1990-05-02T12:30:00Z",
            "email": "ann@example.com"
        }));
        assert_eq!(map_customer(&profile), map_customer(&profile));
    }
}
