// dtos/userdtos.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::usermodel::User;

fn validate_username_chars(username: &str) -> Result<(), ValidationError> {
    if username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(ValidationError::new("username_chars"))
    }
}

fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if has_letter && has_digit {
        Ok(())
    } else {
        Err(ValidationError::new("password_strength"))
    }
}

fn validate_full_name_chars(full_name: &str) -> Result<(), ValidationError> {
    if full_name
        .chars()
        .all(|c| c.is_alphabetic() || c.is_whitespace() || c == '-')
    {
        Ok(())
    } else {
        Err(ValidationError::new("full_name_chars"))
    }
}

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    if matches!(digits.len(), 10 | 11) && (digits.starts_with('7') || digits.starts_with('8')) {
        Ok(())
    } else {
        Err(ValidationError::new("phone_format"))
    }
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterUserDto {
    #[validate(
        length(min = 3, max = 30, message = "Username must be 3 to 30 characters"),
        custom(function = "validate_username_chars", message = "Username may only contain letters, digits and underscores")
    )]
    pub username: String,

    #[validate(
        length(min = 6, max = 50, message = "Password must be 6 to 50 characters"),
        custom(function = "validate_password_strength", message = "Password must contain a letter and a digit")
    )]
    pub password: String,

    #[validate(must_match(other = "password", message = "passwords do not match"))]
    #[serde(rename = "passwordConfirm")]
    pub password_confirm: String,

    #[validate(
        length(min = 2, max = 100, message = "Full name must be 2 to 100 characters"),
        custom(function = "validate_full_name_chars", message = "Full name may only contain letters, spaces and hyphens")
    )]
    pub full_name: String,

    #[validate(email(message = "Email is invalid"), length(max = 254))]
    pub email: Option<String>,

    #[validate(custom(function = "validate_phone", message = "Phone must have 10 or 11 digits and start with 7 or 8"))]
    pub phone: Option<String>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilterUserDto {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub role: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        FilterUserDto {
            id: user.id,
            username: user.username.to_owned(),
            full_name: user.full_name.to_owned(),
            role: user.role.to_str().to_string(),
            email: user.email.to_owned(),
            phone: user.phone.to_owned(),
            created_at: user.created_at,
        }
    }

    pub fn filter_users(users: &[User]) -> Vec<FilterUserDto> {
        users.iter().map(FilterUserDto::filter_user).collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserData {
    pub user: FilterUserDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponseDto {
    pub status: String,
    pub data: UserData,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserListResponseDto {
    pub status: String,
    pub users: Vec<FilterUserDto>,
    pub results: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserLoginResponseDto {
    pub status: String,
    pub token: String,
}

#[derive(Serialize, Deserialize)]
pub struct Response {
    pub status: &'static str,
    pub message: String,
}
