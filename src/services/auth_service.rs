use crate::dto::auth_dto::{LoginRequest, LoginResponse, RegisterRequest};
use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::models::profile::{resolve_role, Profile};
use crate::utils::crypto::{hash_password, verify_password};
use jsonwebtoken::{encode, EncodingKey, Header};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AuthService {
    pool: PgPool,
}

impl AuthService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn register(&self, payload: RegisterRequest) -> Result<Profile> {
        let password_hash = hash_password(&payload.password)
            .map_err(|e| Error::Internal(format!("Password hashing failed: {}", e)))?;

        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (email, display_name, password_hash)
            VALUES (LOWER($1), $2, $3)
            RETURNING id, email, display_name, password_hash,
                      is_admin, is_data_input, is_premium, created_at, updated_at
            "#,
        )
        .bind(&payload.email)
        .bind(&payload.display_name)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Error::Conflict("An account with this email already exists".to_string())
            }
            _ => e.into(),
        })?;

        Ok(profile)
    }

    pub async fn login(&self, payload: LoginRequest) -> Result<LoginResponse> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, email, display_name, password_hash,
                   is_admin, is_data_input, is_premium, created_at, updated_at
            FROM profiles
            WHERE email = LOWER($1)
            "#,
        )
        .bind(&payload.email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::Unauthorized("invalid_credentials".to_string()))?;

        let ok = verify_password(&payload.password, &profile.password_hash)
            .map_err(|e| Error::Internal(format!("Password verification failed: {}", e)))?;
        if !ok {
            return Err(Error::Unauthorized("invalid_credentials".to_string()));
        }

        let token = issue_token(&profile)?;
        Ok(LoginResponse {
            token,
            user_id: profile.id,
            email: profile.email,
            role: resolve_role(profile.is_admin, profile.is_data_input),
        })
    }
}

fn issue_token(profile: &Profile) -> Result<String> {
    let config = crate::config::get_config();
    let exp = (chrono::Utc::now() + chrono::Duration::hours(24)).timestamp() as usize;
    let claims = Claims {
        sub: profile.id.to_string(),
        email: profile.email.clone(),
        exp,
        admin: profile.is_admin,
        data_input: profile.is_data_input,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("Token signing failed: {}", e)))
}
