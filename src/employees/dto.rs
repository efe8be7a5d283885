use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use crate::store::{Document, OrderBy, Snapshot, StoreError};

/// Input fields of the registration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Nin,
    Name,
    Phone,
    Address,
    Dob,
    Lga,
    State,
    Guarantor,
    Designation,
    Dofa,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::Nin,
        Field::Name,
        Field::Phone,
        Field::Address,
        Field::Dob,
        Field::Lga,
        Field::State,
        Field::Guarantor,
        Field::Designation,
        Field::Dofa,
    ];

    /// Document key, identical to the serialized name.
    pub fn key(self) -> &'static str {
        match self {
            Field::Nin => "nin",
            Field::Name => "name",
            Field::Phone => "phone",
            Field::Address => "address",
            Field::Dob => "dob",
            Field::Lga => "lga",
            Field::State => "state",
            Field::Guarantor => "guarantor",
            Field::Designation => "designation",
            Field::Dofa => "dofa",
        }
    }

    /// Registry table header.
    pub fn header(self) -> &'static str {
        match self {
            Field::Nin => "NIN",
            Field::Name => "Name",
            Field::Phone => "Phone",
            Field::Address => "Address",
            Field::Dob => "Date of Birth",
            Field::Lga => "LGA",
            Field::State => "State",
            Field::Guarantor => "Guarantor",
            Field::Designation => "Designation",
            Field::Dofa => "First Appointment",
        }
    }
}

pub const ACTIONS_COLUMN: RegistryColumn = RegistryColumn {
    key: "actions",
    header: "Actions",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistryColumn {
    pub key: &'static str,
    pub header: &'static str,
}

/// Registry table columns: every field in form order, then the row actions.
pub fn registry_columns() -> Vec<RegistryColumn> {
    Field::ALL
        .iter()
        .map(|&f| RegistryColumn {
            key: f.key(),
            header: f.header(),
        })
        .chain(std::iter::once(ACTIONS_COLUMN))
        .collect()
}

/// Field-scoped validation messages, keyed by field.
pub type FieldErrors = BTreeMap<Field, String>;

/// Values entered for a new employee. Dates are `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmployeeDraft {
    pub nin: String,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub dob: String,
    pub lga: String,
    pub state: String,
    pub guarantor: String,
    pub designation: String,
    pub dofa: String, // date of first appointment
}

impl EmployeeDraft {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Nin => &self.nin,
            Field::Name => &self.name,
            Field::Phone => &self.phone,
            Field::Address => &self.address,
            Field::Dob => &self.dob,
            Field::Lga => &self.lga,
            Field::State => &self.state,
            Field::Guarantor => &self.guarantor,
            Field::Designation => &self.designation,
            Field::Dofa => &self.dofa,
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Nin => &mut self.nin,
            Field::Name => &mut self.name,
            Field::Phone => &mut self.phone,
            Field::Address => &mut self.address,
            Field::Dob => &mut self.dob,
            Field::Lga => &mut self.lga,
            Field::State => &mut self.state,
            Field::Guarantor => &mut self.guarantor,
            Field::Designation => &mut self.designation,
            Field::Dofa => &mut self.dofa,
        };
        *slot = value;
    }

    pub fn into_document(self) -> Map<String, Value> {
        Field::ALL
            .iter()
            .map(|&f| (f.key().to_owned(), Value::String(self.get(f).to_owned())))
            .collect()
    }
}

/// Employee record as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: EmployeeDraft,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl TryFrom<Document> for Employee {
    type Error = StoreError;

    fn try_from(doc: Document) -> Result<Self, Self::Error> {
        let fields = serde_json::from_value::<EmployeeDraft>(Value::Object(doc.data)).map_err(|e| {
            StoreError::Malformed {
                id: doc.id,
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            id: doc.id,
            fields,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
    }
}

/// Convert a snapshot, skipping documents that do not decode as employees.
pub fn employees_from_snapshot(snapshot: Snapshot) -> Vec<Employee> {
    snapshot
        .into_iter()
        .filter_map(|doc| match Employee::try_from(doc) {
            Ok(e) => Some(e),
            Err(e) => {
                warn!(error = %e, "skipping malformed employee document");
                None
            }
        })
        .collect()
}

/// Registry listing order: newest first.
pub fn registry_order() -> OrderBy {
    OrderBy::desc("createdAt")
}

#[derive(Debug, Serialize)]
pub struct EmployeePage {
    pub columns: Vec<RegistryColumn>,
    pub rows: Vec<Employee>,
}

#[derive(Debug, Serialize)]
pub struct CreatedEmployeeResponse {
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ValidationErrorResponse {
    pub error: String,
    pub errors: FieldErrors,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_document_uses_form_field_names() {
        let draft = EmployeeDraft {
            nin: "12345678901".into(),
            dofa: "2015-06-01".into(),
            ..Default::default()
        };
        let doc = draft.into_document();
        assert_eq!(doc.len(), 10);
        assert_eq!(doc["nin"], "12345678901");
        assert_eq!(doc["dofa"], "2015-06-01");
        assert_eq!(doc["guarantor"], "");
    }

    #[test]
    fn employee_serializes_flat_with_camel_case_timestamps() {
        let now = OffsetDateTime::now_utc();
        let employee = Employee {
            id: Uuid::new_v4(),
            fields: EmployeeDraft {
                name: "Amina Bello".into(),
                ..Default::default()
            },
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&employee).unwrap();
        assert_eq!(json["name"], "Amina Bello");
        assert!(json["createdAt"].is_string());
        assert!(json["updatedAt"].is_string());
        assert!(json.get("fields").is_none());
    }

    #[test]
    fn malformed_document_is_rejected() {
        let now = OffsetDateTime::now_utc();
        let mut data = Map::new();
        data.insert("nin".into(), Value::from(42));
        let doc = Document {
            id: Uuid::new_v4(),
            data,
            created_at: now,
            updated_at: now,
        };
        assert!(matches!(
            Employee::try_from(doc.clone()),
            Err(StoreError::Malformed { .. })
        ));
        assert!(employees_from_snapshot(vec![doc]).is_empty());
    }

    #[test]
    fn registry_columns_follow_fields_then_actions() {
        let columns = registry_columns();
        let headers: Vec<&str> = columns.iter().map(|c| c.header).collect();
        assert_eq!(
            headers,
            vec![
                "NIN",
                "Name",
                "Phone",
                "Address",
                "Date of Birth",
                "LGA",
                "State",
                "Guarantor",
                "Designation",
                "First Appointment",
                "Actions",
            ]
        );
        assert_eq!(columns[9].key, "dofa");
        assert_eq!(columns.last(), Some(&ACTIONS_COLUMN));
    }

    #[test]
    fn field_errors_serialize_with_field_keys() {
        let mut errors = FieldErrors::new();
        errors.insert(Field::Dofa, "bad".into());
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["dofa"], "bad");
    }
}
