use serde::{Deserialize, Deserializer, Serialize};

pub type BookId = i64;

/// Catalog entry as exchanged with the book-catalog service.
///
/// `id` is unset on books built for creation and filled in by the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct Book {
    pub id: Option<BookId>,
    #[serde(deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub author: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub isbn: String,
}

/// Servers may send unset fields as `null`
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Book {
    /// Builds a book without an id, ready to be sent to `add_book`
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        isbn: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            author: author.into(),
            isbn: isbn.into(),
        }
    }
}
