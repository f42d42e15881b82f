use roombook_models::{UserId, UserRole};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Claims carried by an access credential. Everything the HTTP layer needs
/// to authorize a request is here, so no store lookup is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// Subject: the user id
    pub sub: UserId,
    pub email: String,
    pub role: UserRole,
    /// Unique assertion id
    pub jti: String,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_claims_wire_format() {
        let claims = Claims {
            sub: UserId::from_uuid(Uuid::from_u128(7)),
            email: "teacher@example.com".to_string(),
            role: UserRole::Teacher,
            jti: "abc".to_string(),
            iat: 1_000,
            exp: 2_000,
            iss: "roombook".to_string(),
        };
        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains(r#""sub":"00000000-0000-0000-0000-000000000007""#));
        assert!(json.contains(r#""role":"teacher""#));

        let back: Claims = serde_json::from_str(&json).unwrap();
        assert_eq!(back, claims);
    }
}
