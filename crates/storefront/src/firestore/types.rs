//! Firestore REST wire types.
//!
//! Documents carry their fields as typed value objects
//! (`{"stringValue": "x"}`, `{"integerValue": "5"}`, ...). Fields are kept
//! as raw JSON and read through typed accessors so that documents with
//! unexpected extra fields still decode.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};

use tity_core::{Price, Product, Style};

/// Document field names used by the shop.
pub mod fields {
    /// Product name (query key within a style collection).
    pub const PRODUCT: &str = "producto";
    /// Units in stock.
    pub const QUANTITY: &str = "cantidad";
    pub const PRICE: &str = "precio";
    pub const IMAGE: &str = "imagen";
    pub const DESCRIPTION: &str = "descripcion";

    /// Collection holding user accounts.
    pub const USERS_COLLECTION: &str = "usuarios";
    pub const USERNAME: &str = "usuario";
    /// Password value (argon2 hash, or raw password on legacy accounts).
    pub const PASSWORD: &str = "contra";
    pub const CREATED_AT: &str = "createdAt";
}

/// A Firestore document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name, `projects/{p}/databases/(default)/documents/{collection}/{id}`.
    pub name: String,
    #[serde(default)]
    pub fields: HashMap<String, Value>,
    pub create_time: Option<String>,
    pub update_time: Option<String>,
}

impl Document {
    /// The document ID (last path segment of the resource name).
    #[must_use]
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    #[must_use]
    pub fn string(&self, field: &str) -> Option<&str> {
        self.fields.get(field)?.get("stringValue")?.as_str()
    }

    /// Integer field. Doubles are truncated, numeric strings are parsed.
    #[must_use]
    pub fn integer(&self, field: &str) -> Option<i64> {
        let value = self.fields.get(field)?;
        if let Some(raw) = value.get("integerValue") {
            // The REST API encodes int64 as a JSON string
            return raw
                .as_str()
                .and_then(|s| s.parse().ok())
                .or_else(|| raw.as_i64());
        }
        #[allow(clippy::cast_possible_truncation)]
        let truncated = value
            .get("doubleValue")
            .and_then(Value::as_f64)
            .map(|d| d.trunc() as i64);
        if truncated.is_some() {
            return truncated;
        }
        value
            .get("stringValue")?
            .as_str()
            .and_then(|s| s.trim().parse().ok())
    }

    /// Price field from a double, integer or decimal string.
    #[must_use]
    pub fn price(&self, field: &str) -> Option<Price> {
        let value = self.fields.get(field)?;
        if let Some(d) = value.get("doubleValue").and_then(Value::as_f64) {
            return Price::from_f64(d);
        }
        if let Some(raw) = value.get("integerValue") {
            return raw
                .as_str()
                .and_then(|s| s.parse::<i64>().ok())
                .or_else(|| raw.as_i64())
                .map(|i| Price::new(Decimal::from(i)));
        }
        value
            .get("stringValue")?
            .as_str()
            .and_then(|s| Decimal::from_str(s.trim()).ok())
            .map(Price::new)
    }

    /// Timestamp field, accepting native timestamps and RFC 3339 strings.
    #[must_use]
    pub fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        let value = self.fields.get(field)?;
        let raw = value
            .get("timestampValue")
            .or_else(|| value.get("stringValue"))?
            .as_str()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Stock count, clamped to zero. Missing counts as zero.
    #[must_use]
    pub fn stock(&self) -> u32 {
        self.integer(fields::QUANTITY)
            .map_or(0, |n| u32::try_from(n.max(0)).unwrap_or(u32::MAX))
    }

    /// Decode a product document of the given style collection.
    ///
    /// Returns `None` if the document has no product name.
    #[must_use]
    pub fn to_product(&self, style: Style) -> Option<Product> {
        let name = self.string(fields::PRODUCT)?.to_owned();
        Some(Product {
            price: self.price(fields::PRICE).unwrap_or(Price::ZERO),
            stock: self.stock(),
            image: self.string(fields::IMAGE).map(str::to_owned),
            description: self.string(fields::DESCRIPTION).map(str::to_owned),
            style,
            name,
        })
    }
}

/// One element of a `:runQuery` response stream.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryItem {
    pub document: Option<Document>,
    pub read_time: Option<String>,
}

/// Response of a collection listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsResponse {
    #[serde(default)]
    pub documents: Vec<Document>,
    pub next_page_token: Option<String>,
}

/// Error body returned by the REST API.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

/// `:runQuery` body selecting the first document whose `field` equals `value`.
#[must_use]
pub fn field_equals_query(collection: &str, field: &str, value: &str) -> Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": collection }],
            "where": {
                "fieldFilter": {
                    "field": { "fieldPath": field },
                    "op": "EQUAL",
                    "value": string_value(value),
                }
            },
            "limit": 1,
        }
    })
}

#[must_use]
pub fn string_value(value: &str) -> Value {
    json!({ "stringValue": value })
}

#[must_use]
pub fn integer_value(value: i64) -> Value {
    json!({ "integerValue": value.to_string() })
}

#[must_use]
pub fn timestamp_value(value: DateTime<Utc>) -> Value {
    json!({ "timestampValue": value.to_rfc3339() })
}

impl FromStr for Document {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PRODUCT_DOC: &str = r#"{
        "name": "projects/tienda/databases/(default)/documents/hippie/x81Kd",
        "fields": {
            "producto": { "stringValue": "Blusa hippie" },
            "cantidad": { "integerValue": "7" },
            "precio": { "doubleValue": 255.5 },
            "imagen": { "stringValue": "/img/blusa.jpg" },
            "etiquetas": { "arrayValue": { "values": [] } }
        },
        "createTime": "2025-01-01T00:00:00Z",
        "updateTime": "2025-01-02T00:00:00Z"
    }"#;

    #[test]
    fn test_decode_product_document() {
        let doc: Document = PRODUCT_DOC.parse().unwrap();
        assert_eq!(doc.id(), "x81Kd");

        let product = doc.to_product(Style::Hippie).unwrap();
        assert_eq!(product.name, "Blusa hippie");
        assert_eq!(product.stock, 7);
        assert_eq!(product.price, Price::from_cents(25550));
        assert_eq!(product.image.as_deref(), Some("/img/blusa.jpg"));
        assert!(product.description.is_none());
    }

    #[test]
    fn test_stock_variants() {
        let doc: Document = r#"{"name": "a/b", "fields": {"cantidad": {"doubleValue": 3.9}}}"#
            .parse()
            .unwrap();
        assert_eq!(doc.stock(), 3);

        let doc: Document = r#"{"name": "a/b", "fields": {"cantidad": {"integerValue": "-4"}}}"#
            .parse()
            .unwrap();
        assert_eq!(doc.stock(), 0);

        let doc: Document = r#"{"name": "a/b"}"#.parse().unwrap();
        assert_eq!(doc.stock(), 0);
    }

    #[test]
    fn test_document_without_name_field_is_skipped() {
        let doc: Document = r#"{"name": "a/b", "fields": {"cantidad": {"integerValue": "2"}}}"#
            .parse()
            .unwrap();
        assert!(doc.to_product(Style::Gotico).is_none());
    }

    #[test]
    fn test_timestamp_accepts_iso_strings() {
        let doc: Document =
            r#"{"name": "a/b", "fields": {"createdAt": {"stringValue": "2025-03-04T05:06:07.000Z"}}}"#
                .parse()
                .unwrap();
        let ts = doc.timestamp(fields::CREATED_AT).unwrap();
        assert_eq!(ts.to_rfc3339(), "2025-03-04T05:06:07+00:00");
    }

    #[test]
    fn test_run_query_response_without_match() {
        let items: Vec<RunQueryItem> =
            serde_json::from_str(r#"[{"readTime": "2025-01-01T00:00:00Z"}]"#).unwrap();
        assert!(items.into_iter().find_map(|i| i.document).is_none());
    }

    #[test]
    fn test_field_equals_query_shape() {
        let query = field_equals_query("gotico", fields::PRODUCT, "Cadenas");
        let filter = &query["structuredQuery"]["where"]["fieldFilter"];
        assert_eq!(filter["field"]["fieldPath"], "producto");
        assert_eq!(filter["value"]["stringValue"], "Cadenas");
        assert_eq!(query["structuredQuery"]["limit"], 1);
    }

    #[test]
    fn test_integer_value_is_string_encoded() {
        assert_eq!(integer_value(12), json!({"integerValue": "12"}));
    }
}
