//! Index template for the yearly measurement partitions.

use serde_json::{json, Value};

use measurement_query::fields;

/// Composable index template applied to every `<prefix>-*` partition.
///
/// `city` is a keyword so it can be collapsed on and used for routing;
/// `country` is free text.
pub fn measurement_template(prefix: &str) -> Value {
    json!({
        "index_patterns": [format!("{}-*", prefix)],
        "priority": 0,
        "template": {
            "settings": {
                "number_of_shards": 1
            },
            "mappings": {
                "properties": {
                    (fields::DAY): {"type": "date"},
                    (fields::AVERAGE_TEMPERATURE): {"type": "float"},
                    (fields::AVERAGE_TEMPERATURE_UNCERTAINTY): {"type": "float"},
                    (fields::CITY): {"type": "keyword"},
                    (fields::COUNTRY): {"type": "text"},
                    (fields::LOCATION): {"type": "geo_point"}
                }
            }
        }
    })
}
