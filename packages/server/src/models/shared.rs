use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Pagination metadata included in list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page.
    #[schema(example = 6)]
    pub limit: u64,
    /// Total number of matching items across all pages.
    #[schema(example = 14)]
    pub total: u64,
    /// Total number of pages.
    #[schema(example = 3)]
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        Self {
            page,
            limit,
            total,
            total_pages: total.div_ceil(limit),
        }
    }
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(i64),
    String(String),
}

impl NumberOrString {
    fn into_i32<E: serde::de::Error>(self) -> Result<i32, E> {
        match self {
            NumberOrString::Number(n) => i32::try_from(n).map_err(E::custom),
            NumberOrString::String(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("expected an integer, got {s:?}"))),
        }
    }
}

/// Accepts `5` as well as `"5"`. Form-based clients send numbers as strings.
pub fn number_or_string<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    NumberOrString::deserialize(deserializer)?.into_i32()
}

/// Optional variant of [`number_or_string`]; pair with `#[serde(default)]`.
pub fn optional_number_or_string<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NumberOrString>::deserialize(deserializer)?
        .map(NumberOrString::into_i32)
        .transpose()
}

/// Query-string boolean: `1`/`true` or `0`/`false`.
pub fn query_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") | Some("0") | Some("false") => Ok(false),
        Some("1") | Some("true") => Ok(true),
        Some(other) => Err(D::Error::custom(format!(
            "expected 0, 1, true or false, got {other:?}"
        ))),
    }
}
