//! Author model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Full author model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

impl Author {
    /// Build a new author with a freshly assigned identity
    pub fn new(input: AuthorInput) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name: input.first_name,
            last_name: input.last_name,
            middle_name: input.middle_name,
            date_of_birth: input.date_of_birth,
        }
    }

    pub fn full_name(&self) -> String {
        super::full_name(&self.last_name, &self.first_name, self.middle_name.as_deref())
    }

    /// Overwrite the editable fields, keeping the identity
    pub fn apply(&mut self, input: AuthorInput) {
        self.first_name = input.first_name;
        self.last_name = input.last_name;
        self.middle_name = input.middle_name;
        self.date_of_birth = input.date_of_birth;
    }
}

/// Create / update author request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AuthorInput {
    #[serde(default)]
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    pub middle_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}
