/*!
Descriptions of the live record types whose deletions get archived
*/

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Shared handle to an entity. Registry lookups compare handles by identity.
pub type EntityRef = Arc<Entity>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    HasMany,
    HasOne,
    BelongsTo,
}

/// What happens to associated rows when the owner goes away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dependent {
    Destroy,
    Delete,
    Nullify,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    pub name: String,
    pub kind: AssociationKind,
    pub target_table: String,
    /// For `has_*` the column on the target, for `belongs_to` the column on the owner.
    pub foreign_key: String,
    #[serde(default)]
    pub dependent: Option<Dependent>,
}

impl Association {
    pub fn new(
        name: impl Into<String>,
        kind: AssociationKind,
        target_table: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            target_table: target_table.into(),
            foreign_key: foreign_key.into(),
            dependent: None,
        }
    }

    pub fn has_many(
        name: impl Into<String>,
        target_table: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self::new(name, AssociationKind::HasMany, target_table, foreign_key)
    }

    pub fn has_one(
        name: impl Into<String>,
        target_table: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self::new(name, AssociationKind::HasOne, target_table, foreign_key)
    }

    pub fn belongs_to(
        name: impl Into<String>,
        target_table: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self::new(name, AssociationKind::BelongsTo, target_table, foreign_key)
    }

    pub fn dependent(mut self, dependent: Dependent) -> Self {
        self.dependent = Some(dependent);
        self
    }

    pub fn cascades(&self) -> bool {
        self.dependent.is_some()
    }

    /// Same link pointed at `table`, with no cascade of its own.
    pub fn retarget(&self, table: &str) -> Self {
        Self {
            target_table: table.to_string(),
            dependent: None,
            ..self.clone()
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Entity {
    name: String,
    table: String,
    primary_key: String,
    associations: Vec<Association>,
}

impl Entity {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            primary_key: "id".to_string(),
            associations: Vec::new(),
        }
    }

    pub fn with_primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.primary_key = primary_key.into();
        self
    }

    pub fn with_association(mut self, association: Association) -> Self {
        self.associations.push(association);
        self
    }

    pub fn into_ref(self) -> EntityRef {
        Arc::new(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    pub fn associations(&self) -> &[Association] {
        &self.associations
    }
}
