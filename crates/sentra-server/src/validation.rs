//! Request validation schemas, built once from resolved configuration.

use regex::Regex;

use crate::routes::RegisterRequest;

/// Validation rules for registration requests. The required-fields list is
/// resolved at startup, not re-read per request.
pub struct RegistrationSchema {
    required_fields: Vec<String>,
    email: Regex,
    username: Regex,
}

impl RegistrationSchema {
    pub fn new(required_fields: &[String]) -> Self {
        Self {
            required_fields: required_fields.to_vec(),
            email: Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern"),
            username: Regex::new(r"^[A-Za-z0-9._-]{3,30}$").expect("username pattern"),
        }
    }

    pub fn validate(&self, request: &RegisterRequest) -> Result<(), String> {
        if !self.email.is_match(&request.email) {
            return Err("Invalid email".into());
        }
        validate_password(&request.password)?;

        if let Some(name) = &request.user_name {
            if !self.username.is_match(name) {
                return Err(
                    "userName must be 3 to 30 characters of letters, digits, '.', '_' or '-'"
                        .into(),
                );
            }
        }

        for field in &self.required_fields {
            let present = match field.as_str() {
                "userName" => request.user_name.is_some(),
                "firstName" => request.first_name.is_some(),
                "lastName" => request.last_name.is_some(),
                "company" => request.company.is_some(),
                _ => true,
            };
            if !present {
                return Err(format!("{field} is required"));
            }
        }

        Ok(())
    }
}

/// Password policy shared by registration and password reset.
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.len() < 8 {
        return Err("password must be at least 8 characters".into());
    }
    if !password.chars().any(|c| c.is_ascii_digit())
        || !password.chars().any(|c| c.is_ascii_alphabetic())
    {
        return Err("Password must contain at least one letter and one number".into());
    }
    Ok(())
}
