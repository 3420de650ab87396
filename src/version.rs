use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One historical revision of a document's content in one locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    id: String,
    locale: String,
    author: Option<String>,
    authored: DateTime<Utc>,
}

impl Version {
    pub fn new<I: Into<String>, L: Into<String>>(
        id: I,
        locale: L,
        author: Option<String>,
        authored: DateTime<Utc>,
    ) -> Self {
        Version {
            id: id.into(),
            locale: locale.into(),
            author,
            authored,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn authored(&self) -> DateTime<Utc> {
        self.authored
    }
}
