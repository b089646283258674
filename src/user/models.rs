use serde::{Deserialize, Serialize};

/// Two-factor configuration for a user account.
///
/// Closed set of variants; only `Disabled` is reachable today. The
/// tagged representation leaves room for new variants without changing
/// the stored user record shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TwoFactor {
    Disabled,
    Authenticator {
        #[serde(rename = "oneTimePasswordSecret")]
        one_time_password_secret: String,
    },
}

/// Stored user record.
///
/// `password_hash` is persisted by the repositories but the record is
/// never rendered across the HTTP boundary, so the hash stays inside
/// the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub two_factor: TwoFactor,
}

impl User {
    /// Creates a new user record with two-factor disabled
    pub fn new(email: String, name: String, password_hash: String) -> Self {
        Self {
            email,
            name,
            password_hash,
            two_factor: TwoFactor::Disabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_has_two_factor_disabled() {
        let user = User::new(
            "a@x.com".to_string(),
            "Alice".to_string(),
            "$argon2id$fake".to_string(),
        );

        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.two_factor, TwoFactor::Disabled);
    }

    #[test]
    fn test_two_factor_serialization_is_tagged() {
        let disabled = serde_json::to_string(&TwoFactor::Disabled).unwrap();
        assert_eq!(disabled, r#"{"type":"disabled"}"#);

        let authenticator = serde_json::to_string(&TwoFactor::Authenticator {
            one_time_password_secret: "s3cret".to_string(),
        })
        .unwrap();
        assert!(authenticator.contains(r#""type":"authenticator""#));
        assert!(authenticator.contains("s3cret"));
    }

    #[test]
    fn test_user_round_trips_through_storage_format() {
        let user = User::new(
            "a@x.com".to_string(),
            "Alice".to_string(),
            "$argon2id$fake".to_string(),
        );

        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("passwordHash"));

        let decoded: User = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.email, user.email);
        assert_eq!(decoded.password_hash, user.password_hash);
    }
}
