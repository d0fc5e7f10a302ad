//! Shared fixtures for integration tests.

#![allow(dead_code)]

use tessera::doc;
use tessera::prelude::*;

/// User with an optional address and a list of photos.
pub fn schema() -> Schema {
    Schema::new()
        .with_type(
            TypeDef::composite("Address")
                .field("street", FieldType::Scalar(ScalarType::String), TypeModifier::Required)
                .field("city", FieldType::Scalar(ScalarType::String), TypeModifier::Required)
                .field("zip", FieldType::Scalar(ScalarType::String), TypeModifier::Optional),
        )
        .with_type(
            TypeDef::composite("Photo")
                .field("url", FieldType::Scalar(ScalarType::String), TypeModifier::Required)
                .field("height", FieldType::Scalar(ScalarType::Int), TypeModifier::Required),
        )
        .with_type(
            TypeDef::model("User")
                .field("id", FieldType::Scalar(ScalarType::String), TypeModifier::Required)
                .field("email", FieldType::Scalar(ScalarType::String), TypeModifier::Required)
                .field("name", FieldType::Scalar(ScalarType::String), TypeModifier::Optional)
                .field("address", FieldType::Composite("Address".into()), TypeModifier::Optional)
                .field("photos", FieldType::Composite("Photo".into()), TypeModifier::List),
        )
}

pub fn candy_cane_lane() -> Document {
    doc! {
        "street" => "555 Candy Cane Lane",
        "city" => "Wonderland",
        "zip" => "52337",
    }
}

pub fn photo(url: &str, height: i64) -> Value {
    Value::from(doc! { "url" => url, "height" => height })
}

pub fn users() -> Vec<Document> {
    vec![
        doc! {
            "id" => "u1",
            "email" => "alice@example.com",
            "name" => "Alice",
            "address" => candy_cane_lane(),
            "photos" => vec![photo("1.jpg", 100), photo("2.jpg", 200)],
        },
        doc! {
            "id" => "u2",
            "email" => "bob@example.com",
            "name" => Value::Null,
            "address" => Value::Null,
            "photos" => Vec::<Value>::new(),
        },
        doc! {
            "id" => "u3",
            "email" => "carol@example.com",
            "photos" => vec![photo("3.jpg", 100)],
        },
    ]
}
