use serde::{Deserialize, Deserializer, Serialize};

use crate::validate::{validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Contact {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub phone: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Input submitted through the add/edit form, kept as entered.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub category: String,
}

impl ContactForm {
    pub fn from_contact(contact: &Contact, category: &str) -> Self {
        Self {
            name: contact.name.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
            category: category.to_owned(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate(&self.name, &self.category, &self.email, &self.phone)
    }

    pub fn to_contact(&self) -> Contact {
        Contact {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// Identifies the stored contact an edit replaces.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EditContext {
    pub name: String,
    pub category: String,
}

/// Strips surrounding whitespace and title-cases every run of letters.
pub fn normalize_category(category: &str) -> String {
    let category = category.trim();

    let mut normalized = String::with_capacity(category.len());
    let mut prev_cased = false;

    for ch in category.chars() {
        if prev_cased {
            normalized.extend(ch.to_lowercase());
        } else {
            normalized.extend(ch.to_uppercase());
        }

        prev_cased = ch.is_lowercase() || ch.is_uppercase();
    }

    normalized
}
