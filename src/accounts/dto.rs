use std::fmt;

use serde_json::{Map, Value};
use time::Date;

use crate::accounts::repo_types::{parse_iso_date, today};
use crate::error::AccountError;

/// Validated body of a create or update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountPayload {
    pub name: String,
    pub email: String,
    pub address: String,
    pub phone_number: String,
    pub date_joined: Option<Date>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    NotAnObject,
    Missing(&'static str),
    Empty(&'static str),
    TooLong { field: &'static str, max: usize },
    InvalidType { field: &'static str, expected: &'static str },
    InvalidDate(&'static str),
}

impl FieldError {
    /// Errors about the body's shape rather than absent content.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            FieldError::NotAnObject | FieldError::InvalidType { .. } | FieldError::InvalidDate(_)
        )
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::NotAnObject => write!(f, "body of request contained bad or no data"),
            FieldError::Missing(field) => write!(f, "missing {field}"),
            FieldError::Empty(field) => write!(f, "{field} must not be empty"),
            FieldError::TooLong { field, max } => {
                write!(f, "{field} must be at most {max} characters")
            }
            FieldError::InvalidType { field, expected } => {
                write!(f, "{field} must be a {expected}")
            }
            FieldError::InvalidDate(field) => write!(f, "{field} must be an ISO date (YYYY-MM-DD)"),
        }
    }
}

impl From<Vec<FieldError>> for AccountError {
    fn from(errors: Vec<FieldError>) -> Self {
        let detail = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let message = format!("Invalid Account: {detail}");
        if errors.iter().any(FieldError::is_malformed) {
            AccountError::DataValidation(message)
        } else {
            AccountError::Validation(message)
        }
    }
}

impl AccountPayload {
    /// Validates a decoded JSON body, collecting every field problem.
    pub fn from_json(value: &Value) -> Result<Self, Vec<FieldError>> {
        let Some(obj) = value.as_object() else {
            return Err(vec![FieldError::NotAnObject]);
        };

        let mut errors = Vec::new();
        let mut take = |field, max| match required_string(obj, field, max) {
            Ok(value) => Some(value),
            Err(e) => {
                errors.push(e);
                None
            }
        };
        let name = take("name", 64);
        let email = take("email", 64);
        let address = take("address", 256);
        let phone_number = take("phone_number", 32);

        let date_joined = match obj.get("date_joined") {
            None | Some(Value::Null) => None,
            Some(Value::String(raw)) => match parse_iso_date(raw) {
                Some(date) => Some(date),
                None => {
                    errors.push(FieldError::InvalidDate("date_joined"));
                    None
                }
            },
            Some(_) => {
                errors.push(FieldError::InvalidType {
                    field: "date_joined",
                    expected: "string",
                });
                None
            }
        };

        match (name, email, address, phone_number) {
            (Some(name), Some(email), Some(address), Some(phone_number)) if errors.is_empty() => {
                Ok(Self {
                    name,
                    email,
                    address,
                    phone_number,
                    date_joined,
                })
            }
            _ => Err(errors),
        }
    }

    /// Join date to store. A body without one means today, on create and on
    /// full replacement alike.
    pub fn joined_on(&self) -> Date {
        self.date_joined.unwrap_or_else(today)
    }

    /// Decodes and validates a raw request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, AccountError> {
        let value: Value = serde_json::from_slice(body).map_err(|e| {
            AccountError::DataValidation(format!("Invalid Account: body is not valid JSON ({e})"))
        })?;
        Self::from_json(&value).map_err(AccountError::from)
    }
}

fn required_string(
    obj: &Map<String, Value>,
    field: &'static str,
    max: usize,
) -> Result<String, FieldError> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(FieldError::Missing(field)),
        Some(Value::String(s)) if s.trim().is_empty() => Err(FieldError::Empty(field)),
        Some(Value::String(s)) if s.chars().count() > max => {
            Err(FieldError::TooLong { field, max })
        }
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(FieldError::InvalidType {
            field,
            expected: "string",
        }),
    }
}
