//! Flattening of heterogeneous marketplace payloads into a [`NormalizedProduct`].
//!
//! The product card (`info`) and the attribute record come from different
//! endpoints and disagree on field names; every lookup here tries the card
//! first and falls back to the attribute record.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::models::content::NormalizedProduct;

const BRAND_ATTRIBUTE_ID: &str = "85";
const TYPE_ATTRIBUTE_ID: &str = "8229";
const ANNOTATION_ATTRIBUTE_ID: &str = "4191";

const BRAND_NAMES: &[&str] = &["Бренд", "Brand"];
const TYPE_NAMES: &[&str] = &["Тип", "Type"];

pub fn normalize_product(offer_id: &str, info: &Value, attributes: &Value) -> NormalizedProduct {
    let flat = flatten_attributes(attributes);

    let brand = first_text(&[info, attributes], &["brand", "brand_name"])
        .or_else(|| named_attribute(&flat, BRAND_NAMES, BRAND_ATTRIBUTE_ID));

    let category_name = first_text(
        &[info, attributes],
        &["category_name", "description_category_name", "category"],
    );

    let type_name = first_text(&[info, attributes], &["type_name"])
        .or_else(|| named_attribute(&flat, TYPE_NAMES, TYPE_ATTRIBUTE_ID));

    let description = first_text(&[info, attributes], &["description"])
        .or_else(|| flat.get(ANNOTATION_ATTRIBUTE_ID).cloned());

    NormalizedProduct {
        offer_id: offer_id.to_string(),
        name: first_text(&[info, attributes], &["name"]),
        brand,
        category_name,
        type_name,
        description,
        images: collect_images(&[info, attributes]),
        attributes: flat,
    }
}

fn text(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

fn first_text(sources: &[&Value], keys: &[&str]) -> Option<String> {
    for source in sources {
        for key in keys {
            if let Some(found) = source.get(*key).and_then(text) {
                return Some(found);
            }
        }
    }
    None
}

fn named_attribute(flat: &BTreeMap<String, String>, names: &[&str], id: &str) -> Option<String> {
    names
        .iter()
        .find_map(|name| flat.get(*name))
        .or_else(|| flat.get(id))
        .cloned()
}

/// Map of attribute name (or id when unnamed) to its values joined by `", "`.
pub fn flatten_attributes(record: &Value) -> BTreeMap<String, String> {
    let mut flat = BTreeMap::new();
    let Some(list) = record.get("attributes").and_then(Value::as_array) else {
        return flat;
    };

    for attribute in list {
        let key = attribute
            .get("name")
            .and_then(text)
            .or_else(|| attribute.get("attribute_id").and_then(text))
            .or_else(|| attribute.get("id").and_then(text));
        let Some(key) = key else { continue };

        let values: Vec<String> = match attribute.get("values") {
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(|v| v.get("value").and_then(text).or_else(|| text(v)))
                .collect(),
            Some(single) => text(single).into_iter().collect(),
            None => attribute.get("value").and_then(text).into_iter().collect(),
        };

        if !values.is_empty() {
            flat.insert(key, values.join(", "));
        }
    }
    flat
}

fn image_url(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => ["url", "file_name"]
            .iter()
            .filter_map(|k| map.get(*k))
            .find_map(text),
        other => text(other),
    }
}

/// Primary image first, then gallery images, de-duplicated in order.
pub fn collect_images(sources: &[&Value]) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for key in ["primary_image", "images"] {
        for source in sources {
            let found: Vec<String> = match source.get(key) {
                Some(Value::Array(list)) => list.iter().filter_map(image_url).collect(),
                Some(single) => image_url(single).into_iter().collect(),
                None => Vec::new(),
            };
            for url in found {
                if !urls.contains(&url) {
                    urls.push(url);
                }
            }
        }
    }
    urls
}
