use serde::{Deserialize, Serialize};

/// Body of `POST /hello`. The question travels in the `name` field.
#[derive(Debug, Deserialize)]
pub struct HelloForm {
    pub name: Option<String>,
}

impl HelloForm {
    /// The trimmed question, or `None` when nothing usable was submitted.
    pub fn question(&self) -> Option<&str> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Serialize)]
pub struct HelloPage<'a> {
    pub answer: &'a str,
}
