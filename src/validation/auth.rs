use serde::Deserialize;

use super::Validator;
use crate::error::ApiError;
use crate::models::user::Role;

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterBody {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug)]
pub struct RegisterData {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

pub fn validate_register(body: RegisterBody) -> Result<RegisterData, ApiError> {
    let mut v = Validator::new();

    let username = v.username("username", body.username);
    let email = v.email("email", body.email);
    let password = v.password("password", body.password);
    let role = v
        .parse_enum::<Role>("role", body.role, "Role must be either admin or user")
        .unwrap_or(Role::User);

    v.finish()?;
    Ok(RegisterData {
        username: username.unwrap_or_default(),
        email: email.unwrap_or_default(),
        password: password.unwrap_or_default(),
        role,
    })
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginBody {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug)]
pub struct LoginData {
    pub email: String,
    pub password: String,
}

pub fn validate_login(body: LoginBody) -> Result<LoginData, ApiError> {
    let mut v = Validator::new();

    let email = v.email("email", body.email);
    let password = match body.password {
        Some(p) if !p.is_empty() => Some(p),
        _ => {
            v.push("password", "Password is required");
            None
        }
    };

    v.finish()?;
    Ok(LoginData {
        email: email.unwrap_or_default(),
        password: password.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_defaults_role_to_user() {
        let data = validate_register(RegisterBody {
            username: Some("alice".to_string()),
            email: Some("a@x.com".to_string()),
            password: Some("secret1".to_string()),
            role: None,
        })
        .unwrap();
        assert_eq!(data.role, Role::User);
        assert_eq!(data.username, "alice");
    }

    #[test]
    fn register_aggregates_all_failures() {
        let err = validate_register(RegisterBody {
            username: Some("a!".to_string()),
            email: Some("nope".to_string()),
            password: Some("123".to_string()),
            role: Some("root".to_string()),
        })
        .unwrap_err();

        match err {
            ApiError::Validation { errors } => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["username", "email", "password", "role"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn login_requires_both_fields() {
        let err = validate_login(LoginBody {
            email: None,
            password: None,
        })
        .unwrap_err();
        match err {
            ApiError::Validation { errors } => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
