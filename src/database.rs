use std::fmt;

use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::{
    contact::{normalize_category, Contact, EditContext},
    Error,
};

/// All contacts grouped by category, in insertion order.
///
/// Categories never hold an empty list of contacts: mutations drop emptied categories and
/// deserialization skips empty ones.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ContactDatabase {
    categories: Vec<Category>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub name: String,
    pub contacts: Vec<Contact>,
}

impl ContactDatabase {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|category| category.name.as_str())
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories
            .iter()
            .find(|category| category.name == name)
    }

    pub fn contacts(&self) -> impl Iterator<Item = &Contact> {
        self.categories
            .iter()
            .flat_map(|category| category.contacts.iter())
    }

    pub fn find_contact(&self, category: &str, name: &str) -> Option<&Contact> {
        self.category(category)?
            .contacts
            .iter()
            .find(|contact| contact.name == name)
    }

    /// Looks up a contact by name across all categories.
    ///
    /// If several categories contain the name, the one encountered last wins.
    pub fn find_by_name(&self, name: &str) -> Option<(&str, &Contact)> {
        self.categories
            .iter()
            .flat_map(|category| {
                category
                    .contacts
                    .iter()
                    .map(move |contact| (category.name.as_str(), contact))
            })
            .filter(|(_, contact)| contact.name == name)
            .last()
    }

    /// Adds `contact` to `category`, first removing the contact described by `original`.
    ///
    /// An edit is always a removal followed by an append, so the edited contact moves to
    /// the end of its category. Returns the normalized category name.
    pub fn upsert(
        &mut self,
        contact: Contact,
        category: &str,
        original: Option<&EditContext>,
    ) -> String {
        let category = normalize_category(category);

        if let Some(original) = original {
            self.remove_contact(&original.category, &original.name);
        }

        let pos = match self.position(&category) {
            Some(pos) => pos,
            None => {
                self.categories.push(Category {
                    name: category.clone(),
                    contacts: Vec::new(),
                });

                self.categories.len() - 1
            }
        };

        self.categories[pos].contacts.push(contact);

        category
    }

    /// Removes every contact called `name` from `category`.
    ///
    /// Returns whether the category still exists afterwards.
    pub fn delete_contact(&mut self, category: &str, name: &str) -> Result<bool, Error> {
        self.remove_contact(category, name)
            .ok_or_else(|| Error::NotFound(format!("{} does not exist.", category)))
    }

    /// Removes `category` with all its contacts, returning whether it existed.
    pub fn delete_category(&mut self, category: &str) -> bool {
        let len = self.categories.len();

        self.categories.retain(|category1| category1.name != category);

        self.categories.len() != len
    }

    fn position(&self, category: &str) -> Option<usize> {
        self.categories
            .iter()
            .position(|category1| category1.name == category)
    }

    fn remove_contact(&mut self, category: &str, name: &str) -> Option<bool> {
        let pos = self.position(category)?;

        let contacts = &mut self.categories[pos].contacts;
        contacts.retain(|contact| contact.name != name);

        if contacts.is_empty() {
            self.categories.remove(pos);

            Some(false)
        } else {
            Some(true)
        }
    }
}

impl Serialize for ContactDatabase {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;

        for category in &self.categories {
            map.serialize_entry(&category.name, &category.contacts)?;
        }

        map.end()
    }
}

impl<'de> Deserialize<'de> for ContactDatabase {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DatabaseVisitor;

        impl<'de> Visitor<'de> for DatabaseVisitor {
            type Value = ContactDatabase;

            fn expecting(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
                fmt.write_str("a map from category names to lists of contacts")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut db = ContactDatabase::default();

                while let Some((name, contacts)) = access.next_entry::<String, Vec<Contact>>()? {
                    let pos = db.position(&name);

                    if contacts.is_empty() {
                        if let Some(pos) = pos {
                            db.categories.remove(pos);
                        }
                    } else if let Some(pos) = pos {
                        db.categories[pos].contacts = contacts;
                    } else {
                        db.categories.push(Category { name, contacts });
                    }
                }

                Ok(db)
            }
        }

        deserializer.deserialize_map(DatabaseVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(name: &str) -> Contact {
        Contact {
            name: name.to_owned(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: "555-666-7777".to_owned(),
        }
    }

    fn names(db: &ContactDatabase, category: &str) -> Vec<String> {
        db.category(category)
            .map(|category| {
                category
                    .contacts
                    .iter()
                    .map(|contact| contact.name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn upsert_into_empty_database() {
        let mut db = ContactDatabase::default();

        let category = db.upsert(
            Contact {
                name: "Bob".to_owned(),
                email: "bob@example.com".to_owned(),
                phone: "555-666-7777".to_owned(),
            },
            "friends",
            None,
        );

        assert_eq!(category, "Friends");
        assert_eq!(
            serde_json::to_value(&db).unwrap(),
            serde_json::json!({
                "Friends": [{"name": "Bob", "email": "bob@example.com", "phone": "555-666-7777"}]
            })
        );
    }

    #[test]
    fn moving_last_contact_removes_old_category() {
        let mut db = ContactDatabase::default();
        db.upsert(contact("Bob"), "Friends", None);

        let original = EditContext {
            name: "Bob".to_owned(),
            category: "Friends".to_owned(),
        };

        let category = db.upsert(contact("Bob"), "work", Some(&original));

        assert_eq!(category, "Work");
        assert!(db.category("Friends").is_none());
        assert_eq!(names(&db, "Work"), ["Bob"]);
    }

    #[test]
    fn edit_in_place_moves_contact_to_end() {
        let mut db = ContactDatabase::default();
        db.upsert(contact("Alice"), "Friends", None);
        db.upsert(contact("Bob"), "Friends", None);
        db.upsert(contact("Carol"), "Friends", None);

        let original = EditContext {
            name: "Alice".to_owned(),
            category: "Friends".to_owned(),
        };

        db.upsert(contact("Alicia"), "Friends", Some(&original));

        assert_eq!(names(&db, "Friends"), ["Bob", "Carol", "Alicia"]);
    }

    #[test]
    fn edit_of_vanished_category_still_inserts() {
        let mut db = ContactDatabase::default();

        let original = EditContext {
            name: "Bob".to_owned(),
            category: "Gone".to_owned(),
        };

        db.upsert(contact("Bob"), "Friends", Some(&original));

        assert_eq!(db.category_names().collect::<Vec<_>>(), ["Friends"]);
        assert_eq!(names(&db, "Friends"), ["Bob"]);
    }

    #[test]
    fn upsert_then_delete_restores_categories() {
        let mut db = ContactDatabase::default();
        db.upsert(contact("Alice"), "Family", None);
        let before = db.clone();

        let category = db.upsert(contact("Bob"), "Friends", None);
        assert!(!db.delete_contact(&category, "Bob").unwrap());

        assert_eq!(db, before);
    }

    #[test]
    fn deleting_contacts_keeps_non_empty_categories() {
        let mut db = ContactDatabase::default();
        db.upsert(contact("Alice"), "Friends", None);
        db.upsert(contact("Bob"), "Friends", None);

        assert!(db.delete_contact("Friends", "Alice").unwrap());
        assert_eq!(names(&db, "Friends"), ["Bob"]);

        assert!(!db.delete_contact("Friends", "Bob").unwrap());
        assert!(db.is_empty());
    }

    #[test]
    fn deleting_from_missing_category_is_not_found() {
        let mut db = ContactDatabase::default();

        match db.delete_contact("Work", "Bob") {
            Err(Error::NotFound(msg)) => assert_eq!(msg, "Work does not exist."),
            res => panic!("Unexpected result {:?}", res),
        }
    }

    #[test]
    fn deleting_missing_category_is_noop() {
        let mut db = ContactDatabase::default();
        db.upsert(contact("Bob"), "Work", None);
        let before = db.clone();

        assert!(!db.delete_category("Friends"));
        assert_eq!(db, before);

        assert!(db.delete_category("Work"));
        assert!(db.is_empty());
    }

    #[test]
    fn global_lookup_prefers_last_category() {
        let mut db = ContactDatabase::default();
        db.upsert(contact("Bob"), "Friends", None);
        db.upsert(
            Contact {
                phone: "111-222-3333".to_owned(),
                ..contact("Bob")
            },
            "Work",
            None,
        );

        let (category, found) = db.find_by_name("Bob").unwrap();
        assert_eq!(category, "Work");
        assert_eq!(found.phone, "111-222-3333");

        assert_eq!(
            db.find_contact("Friends", "Bob").unwrap().phone,
            "555-666-7777"
        );
        assert!(db.find_by_name("Alice").is_none());
    }

    #[test]
    fn deserialization_keeps_order_and_skips_empty_categories() {
        let db = serde_json::from_str::<ContactDatabase>(
            r#"{
                "Work": [{"name": "Bob", "email": "bob@example.com", "phone": "333-444-5555"}],
                "Empty": [],
                "Family": [{"name": "Alice", "email": null, "phone": null}]
            }"#,
        )
        .unwrap();

        assert_eq!(db.category_names().collect::<Vec<_>>(), ["Work", "Family"]);
        assert_eq!(db.contacts().count(), 2);
    }
}
