use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A shortened URL as stored and as returned over the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: i64,
    pub slug: String,
    pub url: String,
    pub clicks: i64,
    /// Unix seconds in storage, RFC 3339 on the wire
    #[serde(with = "rfc3339_seconds")]
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkRequest {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_slug: Option<String>,
}

/// Create response: the new link plus its QR code inline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedLink {
    #[serde(flatten)]
    pub link: Link,
    /// PNG data URI of the short URL's QR code
    pub qr_png: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkList {
    pub items: Vec<Link>,
    #[serde(default)]
    pub total: i64,
}

mod rfc3339_seconds {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(secs: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        let dt = DateTime::<Utc>::from_timestamp(*secs, 0).unwrap_or_default();
        serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.timestamp())
            .map_err(de::Error::custom)
    }
}
