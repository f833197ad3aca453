use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use schoolhub_db::entities::user;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (civil id)
    pub sub: String,
    /// Display name
    pub name: String,
    /// Role (admin, content_admin, teacher, student)
    pub role: String,
    /// Taught subject, for staff
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    /// Token type (access, refresh)
    pub token_type: TokenType,
    /// Issued at
    pub iat: i64,
    /// Expiration
    pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Identity baked into a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub civil_id: String,
    pub name: String,
    pub role: String,
    pub subject: Option<String>,
    pub job_title: Option<String>,
}

impl From<&user::Model> for TokenSubject {
    fn from(u: &user::Model) -> Self {
        Self {
            civil_id: u.civil_id.clone(),
            name: u.name.clone(),
            role: u.role.as_str().to_string(),
            subject: u.subject.clone(),
            job_title: u.job_title.clone(),
        }
    }
}

fn claims_for(who: &TokenSubject, token_type: TokenType, ttl: Duration) -> Claims {
    let now = Utc::now();
    Claims {
        sub: who.civil_id.clone(),
        name: who.name.clone(),
        role: who.role.clone(),
        subject: who.subject.clone(),
        job_title: who.job_title.clone(),
        token_type,
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    }
}

/// Generate access + refresh token pair
pub fn generate_token_pair(
    who: &TokenSubject,
    secret: &str,
) -> Result<TokenPair, jsonwebtoken::errors::Error> {
    let key = EncodingKey::from_secret(secret.as_bytes());

    // Access token: 15 minutes
    let access_token = encode(
        &Header::default(),
        &claims_for(who, TokenType::Access, Duration::minutes(15)),
        &key,
    )?;

    // Refresh token: 7 days
    let refresh_token = encode(
        &Header::default(),
        &claims_for(who, TokenType::Refresh, Duration::days(7)),
        &key,
    )?;

    Ok(TokenPair {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: 900,
    })
}

/// Validate a JWT token and return claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}
