//! Marketplace payload fixtures shaped like Ozon Seller API responses

#![allow(dead_code)]

use serde_json::{json, Value};

/// Product card as returned by the product info endpoint.
pub fn product_info(offer_id: &str) -> Value {
    json!({
        "id": 1_024_768,
        "offer_id": offer_id,
        "name": format!("Электрический чайник {offer_id}"),
        "description_category_id": 17_028_922,
        "type_id": 92_840,
        "primary_image": ["https://cdn1.ozone.ru/s3/multimedia/kettle-main.jpg"],
        "images": [
            "https://cdn1.ozone.ru/s3/multimedia/kettle-main.jpg",
            "https://cdn1.ozone.ru/s3/multimedia/kettle-side.jpg"
        ]
    })
}

/// Attribute record as returned by the attributes endpoint.
pub fn product_attributes(offer_id: &str) -> Value {
    json!({
        "id": 1_024_768,
        "offer_id": offer_id,
        "attributes": [
            { "id": 85, "complex_id": 0, "values": [{ "dictionary_value_id": 971, "value": "Kitfort" }] },
            { "id": 8229, "complex_id": 0, "values": [{ "dictionary_value_id": 92840, "value": "Чайник электрический" }] },
            { "id": 4191, "complex_id": 0, "values": [{ "dictionary_value_id": 0, "value": "Быстрый нагрев, 1.7 л" }] },
            { "id": 10096, "complex_id": 0, "values": [{ "value": "белый" }, { "value": "серый" }] }
        ],
        "images": [
            { "file_name": "https://cdn1.ozone.ru/s3/multimedia/kettle-box.jpg", "default": false, "index": 2 }
        ]
    })
}

/// Rich-content document a generator would produce.
pub fn rich_content() -> Value {
    json!({
        "content": [{
            "widgetName": "raTextBlock",
            "title": { "content": ["Kitfort"], "size": "size4" },
            "text": { "content": ["Быстрый нагрев"], "size": "size2" }
        }],
        "version": 0.3
    })
}
