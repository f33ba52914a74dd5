//! Emergency contact directory

use crate::error::{DispatchError, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactKind {
    Authority,
    Community,
}

impl fmt::Display for ContactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContactKind::Authority => write!(f, "authority"),
            ContactKind::Community => write!(f, "community"),
        }
    }
}

/// Someone to notify about fires in the regions they monitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub kind: ContactKind,
    pub regions: Vec<String>,
}

impl Contact {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        kind: ContactKind,
        regions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self> {
        let contact = Self {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            kind,
            regions: regions.into_iter().map(Into::into).collect(),
        };
        contact.validate()?;
        Ok(contact)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(DispatchError::InvalidContact("name is empty".to_string()));
        }
        if !self.email.contains('@') {
            return Err(DispatchError::InvalidContact(format!(
                "{}: malformed e-mail {:?}",
                self.name, self.email
            )));
        }
        if self.phone.trim().is_empty() {
            return Err(DispatchError::InvalidContact(format!(
                "{}: phone is empty",
                self.name
            )));
        }
        if self.regions.is_empty() {
            return Err(DispatchError::InvalidContact(format!(
                "{}: monitors no region",
                self.name
            )));
        }
        Ok(())
    }

    pub fn monitors(&self, region: &str) -> bool {
        self.regions.iter().any(|r| r == region)
    }
}

/// Contacts seeded into every new engine
pub fn default_contacts() -> Vec<Contact> {
    vec![
        Contact {
            name: "Defesa Civil Nacional".to_string(),
            email: "alerta@defesacivil.gov.br".to_string(),
            phone: "+5561999999999".to_string(),
            kind: ContactKind::Authority,
            regions: ["Amazônia", "Pantanal", "Cerrado", "Mata Atlântica"]
                .map(String::from)
                .to_vec(),
        },
        Contact {
            name: "Comunidade Local - Amazônia".to_string(),
            email: "comunidade.amazonia@example.org".to_string(),
            phone: "+5592988888888".to_string(),
            kind: ContactKind::Community,
            regions: vec!["Amazônia".to_string()],
        },
    ]
}

/// Shared, create-only list of contacts in registration order
#[derive(Debug, Clone, Default)]
pub struct ContactDirectory {
    contacts: Arc<RwLock<Vec<Contact>>>,
}

impl ContactDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append a contact
    pub fn register(&self, contact: Contact) -> Result<()> {
        contact.validate()?;
        self.contacts.write().push(contact);
        Ok(())
    }

    pub fn list(&self) -> Vec<Contact> {
        self.contacts.read().clone()
    }

    /// Contacts monitoring `region`, in registration order
    pub fn recipients_for(&self, region: &str) -> Vec<Contact> {
        self.contacts
            .read()
            .iter()
            .filter(|c| c.monitors(region))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.contacts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.read().is_empty()
    }
}
