use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::User;
use crate::validation::{Check, Rule, Validate};

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

impl Validate for RegisterRequest {
    const RULES: &'static [Rule] = &[
        Rule::new("name", Check::Required, "Name is required"),
        Rule::new("name", Check::MinLen(2), "Name must be at least 2 characters"),
        Rule::new("email", Check::Email, "Valid email required"),
        Rule::new("phone", Check::Phone, "Valid phone number required (10-15 digits)"),
        Rule::new("password", Check::MinLen(6), "Password must be at least 6 characters"),
    ];
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    const RULES: &'static [Rule] = &[
        Rule::new("email", Check::Email, "Valid email required"),
        Rule::new("password", Check::Required, "Password is required"),
    ];
}

/// Request body for a partial profile update.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
}

impl Validate for UpdateProfileRequest {
    const RULES: &'static [Rule] = &[
        Rule::new("name", Check::MinLen(2), "Name must be at least 2 characters").optional(),
        Rule::new("bio", Check::MaxLen(500), "Bio cannot exceed 500 characters").optional(),
        Rule::new("phone", Check::Phone, "Valid phone number required").optional(),
    ];
}

/// Public part of the user returned to the client. The password hash has no
/// field here, so it cannot leak through any response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            phone: u.phone,
            bio: u.bio,
            profile_image: u.profile_image,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Which user fields a join exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserProjection {
    /// name, email, phone
    Contact,
    /// adds profileImage
    Listing,
    /// adds profileImage and bio
    Detailed,
}

/// Narrowed user attached to skills and requests.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl UserSummary {
    pub fn project(user: &User, projection: UserProjection) -> Self {
        let (profile_image, bio) = match projection {
            UserProjection::Contact => (None, None),
            UserProjection::Listing => (user.profile_image.clone(), None),
            UserProjection::Detailed => (user.profile_image.clone(), user.bio.clone()),
        };
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            profile_image,
            bio,
        }
    }
}

/// Payload returned after login or register.
#[derive(Debug, Serialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct UserPayload {
    pub user: PublicUser,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        let now = OffsetDateTime::now_utc();
        User {
            id: Uuid::new_v4(),
            name: "Ann".into(),
            email: "ann@example.com".into(),
            phone: "1234567890".into(),
            password_hash: "$argon2id$secret".into(),
            bio: Some("guitarist".into()),
            profile_image: Some("ann.png".into()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn public_user_never_contains_password_hash() {
        let json = serde_json::to_string(&PublicUser::from(user())).unwrap();
        assert!(json.contains("ann@example.com"));
        assert!(json.contains("\"_id\""));
        assert!(!json.contains("argon2"));
        assert!(!json.to_lowercase().contains("password"));
    }

    #[test]
    fn projections_widen_progressively() {
        let u = user();
        let contact = serde_json::to_value(UserSummary::project(&u, UserProjection::Contact)).unwrap();
        assert!(contact.get("profileImage").is_none());
        assert!(contact.get("bio").is_none());

        let listing = serde_json::to_value(UserSummary::project(&u, UserProjection::Listing)).unwrap();
        assert_eq!(listing["profileImage"], "ann.png");
        assert!(listing.get("bio").is_none());

        let detailed = serde_json::to_value(UserSummary::project(&u, UserProjection::Detailed)).unwrap();
        assert_eq!(detailed["bio"], "guitarist");
    }
}
