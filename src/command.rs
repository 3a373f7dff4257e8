use std::fmt;

use crate::{
    contact::{Contact, EditContext},
    database::ContactDatabase,
    Error,
};

/// A mutation of the contact database, independent of how it was requested.
#[derive(Debug, Clone)]
pub enum Command {
    Upsert {
        contact: Contact,
        category: String,
        original: Option<EditContext>,
    },
    DeleteContact {
        category: String,
        name: String,
    },
    DeleteCategory {
        category: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Added {
        name: String,
        category: String,
    },
    Updated {
        name: String,
        category: String,
    },
    ContactDeleted {
        name: String,
        category: String,
        category_remains: bool,
    },
    CategoryDeleted {
        category: String,
    },
}

impl Command {
    pub fn apply(self, db: &mut ContactDatabase) -> Result<Outcome, Error> {
        let outcome = match self {
            Self::Upsert {
                contact,
                category,
                original,
            } => {
                let name = contact.name.clone();
                let category = db.upsert(contact, &category, original.as_ref());

                if original.is_some() {
                    Outcome::Updated { name, category }
                } else {
                    Outcome::Added { name, category }
                }
            }
            Self::DeleteContact { category, name } => {
                let category_remains = db.delete_contact(&category, &name)?;

                Outcome::ContactDeleted {
                    name,
                    category,
                    category_remains,
                }
            }
            Self::DeleteCategory { category } => {
                if !db.delete_category(&category) {
                    tracing::debug!("Category {} was already absent", category);
                }

                Outcome::CategoryDeleted { category }
            }
        };

        Ok(outcome)
    }
}

impl Outcome {
    /// The category page to show next, if any.
    pub fn category(&self) -> Option<&str> {
        match self {
            Self::Added { category, .. } | Self::Updated { category, .. } => Some(category),
            Self::ContactDeleted {
                category,
                category_remains: true,
                ..
            } => Some(category),
            Self::ContactDeleted { .. } | Self::CategoryDeleted { .. } => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Added { name, .. } => write!(fmt, "{} was added.", name),
            Self::Updated { name, .. } => write!(fmt, "{} was updated.", name),
            Self::ContactDeleted { name, category, .. } => {
                write!(fmt, "{} has been deleted from {}.", name, category)
            }
            Self::CategoryDeleted { category } => write!(fmt, "{} has been deleted.", category),
        }
    }
}
