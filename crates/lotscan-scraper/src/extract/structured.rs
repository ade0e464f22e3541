//! Structured-metadata lookup: machine-authored vehicle/product records
//! embedded in the page. Preferred over every heuristic scan because it is
//! low-noise.

use regex::Regex;
use serde_json::Value;

use crate::normalize::{normalize_color, parse_distance_km, parse_money};

/// Fields recoverable from embedded structured metadata, already normalized.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StructuredVehicle {
    pub price: Option<String>,
    pub mileage_km: Option<u32>,
    pub color: Option<String>,
    pub stock_number: Option<String>,
    pub vin: Option<String>,
}

impl StructuredVehicle {
    fn merge(&mut self, other: StructuredVehicle) {
        if self.price.is_none() {
            self.price = other.price;
        }
        if self.mileage_km.is_none() {
            self.mileage_km = other.mileage_km;
        }
        if self.color.is_none() {
            self.color = other.color;
        }
        if self.stock_number.is_none() {
            self.stock_number = other.stock_number;
        }
        if self.vin.is_none() {
            self.vin = other.vin;
        }
    }
}

/// Extracts vehicle fields from `<script type="application/ld+json">` blocks.
///
/// Accepts top-level objects, arrays, and `@graph` containers; keeps items
/// whose `@type` (string or array) names a vehicle/product record. Multiple
/// matching items merge first-non-null-wins in document order.
#[must_use]
pub fn extract_structured(html: &str) -> StructuredVehicle {
    let script_re = Regex::new(
        r#"(?is)<script[^>]+type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#,
    )
    .expect("valid regex");

    let mut result = StructuredVehicle::default();

    for cap in script_re.captures_iter(html) {
        let Some(json_text) = cap.get(1) else {
            continue;
        };
        let Ok(value) = serde_json::from_str::<Value>(json_text.as_str()) else {
            continue;
        };

        let mut candidates: Vec<Value> = if let Some(arr) = value.as_array() {
            arr.clone()
        } else {
            vec![value]
        };

        // Expand @graph containers: some page revisions wrap everything in
        // {"@graph": [...]} at the top level.
        let mut expanded = Vec::new();
        for item in &candidates {
            if let Some(graph) = item.get("@graph").and_then(Value::as_array) {
                expanded.extend(graph.iter().cloned());
            }
        }
        candidates.extend(expanded);

        for item in candidates {
            if let Some(vehicle) = item_to_vehicle(&item) {
                result.merge(vehicle);
            }
        }
    }

    result
}

fn item_to_vehicle(item: &Value) -> Option<StructuredVehicle> {
    let type_node = item.get("@type")?;
    let accepted_types = ["Product", "Vehicle", "Car", "MotorizedBicycle"];

    let type_matches = if let Some(s) = type_node.as_str() {
        accepted_types.iter().any(|t| s.eq_ignore_ascii_case(t))
    } else if let Some(arr) = type_node.as_array() {
        arr.iter()
            .filter_map(Value::as_str)
            .any(|s| accepted_types.iter().any(|t| s.eq_ignore_ascii_case(t)))
    } else {
        false
    };
    if !type_matches {
        return None;
    }

    let price = price_node(item).and_then(|raw| parse_money(&raw));

    let mileage_km = item
        .get("mileageFromOdometer")
        .and_then(|node| {
            // Either a QuantitativeValue object or a bare number/string.
            node.get("value").map_or_else(
                || scalar_to_string(node),
                |value| scalar_to_string(value),
            )
        })
        .and_then(|raw| parse_distance_km(&format!("{raw} km")));

    let color = item
        .get("color")
        .and_then(Value::as_str)
        .and_then(normalize_color);

    let stock_number = item
        .get("sku")
        .or_else(|| item.get("stockNumber"))
        .and_then(scalar_to_string)
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty());

    let vin = item
        .get("vehicleIdentificationNumber")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_uppercase())
        .filter(|s| super::mine::looks_like_vin(s));

    Some(StructuredVehicle {
        price,
        mileage_km,
        color,
        stock_number,
        vin,
    })
}

/// `offers.price`, `offers[0].price`, or a top-level `price`.
fn price_node(item: &Value) -> Option<String> {
    let offers = item.get("offers");
    let price = match offers {
        Some(Value::Object(map)) => map.get("price"),
        Some(Value::Array(arr)) => arr.first().and_then(|o| o.get("price")),
        _ => None,
    }
    .or_else(|| item.get("price"))?;
    scalar_to_string(price)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
