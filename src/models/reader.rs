//! Reader model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Full reader model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Reader {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub email: String,
    pub phone_number: Option<String>,
    /// Stamped once at registration
    pub registration_date: DateTime<Utc>,
}

impl Reader {
    /// Register a new reader, stamping the registration date
    pub fn new(input: ReaderInput) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name: input.first_name,
            last_name: input.last_name,
            middle_name: input.middle_name,
            email: input.email,
            phone_number: input.phone_number,
            registration_date: Utc::now(),
        }
    }

    pub fn full_name(&self) -> String {
        super::full_name(&self.last_name, &self.first_name, self.middle_name.as_deref())
    }

    /// Overwrite the editable fields. Identity and registration date are kept.
    pub fn apply(&mut self, input: ReaderInput) {
        self.first_name = input.first_name;
        self.last_name = input.last_name;
        self.middle_name = input.middle_name;
        self.email = input.email;
        self.phone_number = input.phone_number;
    }

    pub fn has_email(&self, email: &str) -> bool {
        self.email.trim().to_lowercase() == email.trim().to_lowercase()
    }
}

/// Register / update reader request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ReaderInput {
    #[serde(default)]
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    pub middle_name: Option<String>,
    #[serde(default)]
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Invalid email format")
    )]
    pub email: String,
    pub phone_number: Option<String>,
}
