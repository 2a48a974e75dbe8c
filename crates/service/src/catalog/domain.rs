use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_RATING: i64 = 5;
pub const DEFAULT_CATEGORY: &str = "Other";

/// A product owned by exactly one user.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rating: i64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub store: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
}

/// Optional product fields; `None` means "not supplied".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProductDetails {
    pub description: Option<String>,
    pub rating: Option<i64>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub store: Option<String>,
    pub country: Option<String>,
}

/// Uploaded file as received from the client.
#[derive(Clone, Debug, Default)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Input for adding a product; username, name and image are required.
#[derive(Clone, Debug, Default)]
pub struct NewProduct {
    pub username: String,
    pub name: String,
    pub details: ProductDetails,
    pub image: Option<Upload>,
}

/// Input for updating a product; username, product id and name are required.
#[derive(Clone, Debug, Default)]
pub struct ProductUpdate {
    pub username: String,
    pub product_id: String,
    pub name: String,
    pub details: ProductDetails,
    pub image: Option<Upload>,
}

impl Product {
    /// Fresh product with defaults filled in for anything not supplied.
    pub fn create(id: String, name: String, details: ProductDetails, image: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            description: details.description.unwrap_or_default(),
            rating: details.rating.unwrap_or(DEFAULT_RATING),
            category: normalize_category(details.category),
            price: details.price.unwrap_or(0.0),
            store: details.store.unwrap_or_default(),
            country: details.country.unwrap_or_default(),
            image,
            is_favorite: false,
            created_at: now,
        }
    }

    /// Overwrite the supplied fields, keep the rest.
    pub fn apply(&mut self, name: String, details: ProductDetails) {
        self.name = name;
        if let Some(description) = details.description {
            self.description = description;
        }
        if let Some(rating) = details.rating {
            self.rating = rating;
        }
        if details.category.is_some() {
            self.category = normalize_category(details.category);
        }
        if let Some(price) = details.price {
            self.price = price;
        }
        if let Some(store) = details.store {
            self.store = store;
        }
        if let Some(country) = details.country {
            self.country = country;
        }
    }
}

fn normalize_category(category: Option<String>) -> String {
    category
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
}

/// Leading integer of `raw`; empty, unparsable or zero falls back to the default rating.
pub fn parse_rating(raw: &str) -> i64 {
    let s = raw.trim_start();
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits.bytes().take_while(u8::is_ascii_digit).count();
    match digits[..end].parse::<i64>() {
        Ok(0) | Err(_) => DEFAULT_RATING,
        Ok(n) => sign * n,
    }
}

/// Longest numeric prefix of `raw`; anything unparsable is `0`.
pub fn parse_price(raw: &str) -> f64 {
    let s = raw.trim_start();
    let candidate_len = s
        .bytes()
        .take_while(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'))
        .count();
    (1..=candidate_len)
        .rev()
        .find_map(|len| s[..len].parse::<f64>().ok().filter(|v| v.is_finite()))
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_parsing_follows_form_semantics() {
        assert_eq!(parse_rating("4"), 4);
        assert_eq!(parse_rating(" 3 stars"), 3);
        assert_eq!(parse_rating("4.9"), 4);
        assert_eq!(parse_rating(""), DEFAULT_RATING);
        assert_eq!(parse_rating("abc"), DEFAULT_RATING);
        assert_eq!(parse_rating("0"), DEFAULT_RATING);
        assert_eq!(parse_rating("-2"), -2);
    }

    #[test]
    fn price_parsing_takes_numeric_prefix() {
        assert_eq!(parse_price("12.5"), 12.5);
        assert_eq!(parse_price("12.5 EUR"), 12.5);
        assert_eq!(parse_price("1e3"), 1000.0);
        assert_eq!(parse_price("3."), 3.0);
        assert_eq!(parse_price("free"), 0.0);
        assert_eq!(parse_price(""), 0.0);
    }

    #[test]
    fn create_fills_defaults() {
        let now = Utc::now();
        let p = Product::create("id1".into(), "Tea".into(), ProductDetails::default(), "/uploads/a.png".into(), now);
        assert_eq!(p.rating, DEFAULT_RATING);
        assert_eq!(p.category, DEFAULT_CATEGORY);
        assert_eq!(p.price, 0.0);
        assert!(p.description.is_empty() && p.store.is_empty() && p.country.is_empty());
        assert!(!p.is_favorite);
        assert_eq!(p.created_at, now);
    }

    #[test]
    fn apply_touches_only_supplied_fields() {
        let details = ProductDetails {
            description: Some("green".into()),
            rating: Some(4),
            category: Some("Drinks".into()),
            price: Some(3.5),
            store: Some("Corner".into()),
            country: Some("JP".into()),
        };
        let mut p = Product::create("id1".into(), "Tea".into(), details, "/uploads/a.png".into(), Utc::now());
        let before = p.clone();

        p.apply("Matcha".into(), ProductDetails { price: Some(4.0), category: Some(String::new()), ..Default::default() });
        assert_eq!(p.name, "Matcha");
        assert_eq!(p.price, 4.0);
        assert_eq!(p.category, DEFAULT_CATEGORY);
        assert_eq!(p.description, before.description);
        assert_eq!(p.rating, before.rating);
        assert_eq!(p.store, before.store);
        assert_eq!(p.country, before.country);
        assert_eq!(p.image, before.image);
    }

    #[test]
    fn serialized_with_camel_case_keys() {
        let p = Product::create("id1".into(), "Tea".into(), ProductDetails::default(), "/uploads/a.png".into(), Utc::now());
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["isFavorite"], serde_json::json!(false));
        assert!(v.get("createdAt").is_some());
        assert!(v.get("is_favorite").is_none());
    }

    #[test]
    fn reads_documents_written_by_earlier_deployments() {
        let raw = r#"{
            "id": "5f0c", "name": "Tea", "description": "", "rating": 5,
            "category": "Other", "price": 0, "store": "", "country": "",
            "image": "/uploads/x.png", "isFavorite": true,
            "createdAt": "2024-03-01T10:00:00.000Z"
        }"#;
        let p: Product = serde_json::from_str(raw).unwrap();
        assert!(p.is_favorite);
        assert_eq!(p.price, 0.0);
    }
}
