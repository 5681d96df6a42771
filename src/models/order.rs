//! Order models.

use crate::error::IngestError;

/// Submitter-provided order fields as received from the form.
///
/// Missing form fields are represented as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFields {
    pub name: String,
    pub institution: String,
    pub email: String,
}

impl OrderFields {
    pub fn new(
        name: impl Into<String>,
        institution: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            institution: institution.into(),
            email: email.into(),
        }
    }

    /// Attach an allocated order number and check that every field is present.
    ///
    /// Surrounding whitespace is trimmed before the emptiness check and the
    /// trimmed values are what gets stored.
    pub fn validate(self, number: &str) -> Result<NewOrder, IngestError> {
        let order = NewOrder {
            number: number.trim().to_string(),
            name: self.name.trim().to_string(),
            institution: self.institution.trim().to_string(),
            email: self.email.trim().to_string(),
        };

        let fields: Vec<&'static str> = [
            ("number", &order.number),
            ("name", &order.name),
            ("institution", &order.institution),
            ("email", &order.email),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| field)
        .collect();

        if !fields.is_empty() {
            return Err(IngestError::MissingFields { fields });
        }

        Ok(order)
    }
}

/// A validated order ready to be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub number: String,
    pub name: String,
    pub institution: String,
    pub email: String,
}
