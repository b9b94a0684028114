// Client-side validation for the login and registration forms
// Field rules and messages follow the account pages; the api module turns
// valid forms into wire payloads. Password handling beyond the length
// check belongs to the backend.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub date_of_birth: Option<NaiveDate>,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(FieldError {
                field: "name",
                message: "Name is required",
            });
        }
        if self.username.trim().is_empty() {
            errors.push(FieldError {
                field: "username",
                message: "Username is required",
            });
        }
        if !self.email.contains('@') {
            errors.push(FieldError {
                field: "email",
                message: "Valid email is required",
            });
        }
        if self.password.len() < 6 {
            errors.push(FieldError {
                field: "password",
                message: "Password must be at least 6 characters",
            });
        }
        if self.date_of_birth.is_none() {
            errors.push(FieldError {
                field: "dob",
                message: "Date of Birth is required",
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), FieldError> {
        if self.email.is_empty() || self.password.is_empty() {
            return Err(FieldError {
                field: "credentials",
                message: "Email and password are required",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> RegistrationForm {
        RegistrationForm {
            name: "John Doe".to_string(),
            username: "johndoe".to_string(),
            email: "john@example.com".to_string(),
            password: "password123".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 4, 12),
        }
    }

    #[test]
    fn test_valid_registration_passes() {
        assert!(valid_form().validate().is_ok());
    }

    #[test]
    fn test_every_field_rule_reports() {
        let form = RegistrationForm {
            name: " ".to_string(),
            username: String::new(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            date_of_birth: None,
        };
        let errors = form.validate().unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["name", "username", "email", "password", "dob"]);
    }

    #[test]
    fn test_password_boundary() {
        let mut form = valid_form();
        form.password = "12345".to_string();
        assert!(form.validate().is_err());

        form.password = "123456".to_string();
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_login_requires_both_fields() {
        let missing = LoginForm {
            email: "john@example.com".to_string(),
            password: String::new(),
        };
        let err = missing.validate().unwrap_err();
        assert_eq!(err.message, "Email and password are required");

        let ok = LoginForm {
            email: "john@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(ok.validate().is_ok());
    }
}
