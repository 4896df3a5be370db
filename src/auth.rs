use std::collections::BTreeSet;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    config::{AppConfig, Env},
    error::AppError,
    models::Role,
    repository::RepositoryState,
};

/// Header accepted in `Env::Local` to authenticate as an existing account without a token.
pub const LOCAL_LOGIN_HEADER: &str = "x-user-login";

/// Claims
///
/// Payload expected inside the Bearer JWT. Tokens are issued by the identity provider;
/// this service only validates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the principal's login.
    pub sub: String,
    /// Authorities granted to the principal. Tags this service does not know are dropped.
    #[serde(default, deserialize_with = "known_roles")]
    pub roles: BTreeSet<Role>,
    /// Expiration Time (exp): always validated.
    pub exp: usize,
    /// Issued At (iat).
    pub iat: usize,
}

fn known_roles<'de, D>(deserializer: D) -> Result<BTreeSet<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    let tags = Vec::<String>::deserialize(deserializer)?;
    Ok(tags
        .iter()
        .filter_map(|tag| {
            tag.parse::<Role>()
                .inspect_err(|e| tracing::debug!(error = %e, "ignoring token role"))
                .ok()
        })
        .collect())
}

/// AuthUser
///
/// The authenticated principal of a request: a login plus the authorities it was granted.
/// A principal is not proof that an account exists; handlers that need the account
/// resolve `login` through the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub login: String,
    pub roles: BTreeSet<Role>,
}

impl AuthUser {
    pub fn has_any_role(&self, accepted: &[Role]) -> bool {
        accepted.iter().any(|role| self.roles.contains(role))
    }

    /// require_any_role
    ///
    /// Endpoint guard: passes if the principal holds at least one accepted role.
    pub fn require_any_role(&self, accepted: &[Role]) -> Result<(), AppError> {
        if self.has_any_role(accepted) {
            Ok(())
        } else {
            tracing::warn!(login = %self.login, ?accepted, "access denied");
            Err(AppError::AccessDenied)
        }
    }
}

/// AuthUser Extractor Implementation
///
/// 1. Dependency Resolution: repository and configuration from the application state.
/// 2. Local Bypass: in `Env::Local`, an `x-user-login` header naming an existing account
///    authenticates as that account with its stored roles.
/// 3. Token Validation: Bearer token extraction and HS256 JWT decoding with `exp` checks.
///
/// Rejection: `StatusCode::UNAUTHORIZED` on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        if config.env == Env::Local {
            let local_login = parts
                .headers
                .get(LOCAL_LOGIN_HEADER)
                .and_then(|value| value.to_str().ok());
            if let Some(login) = local_login {
                match repo.find_account_by_login(login).await {
                    Ok(Some(account)) => {
                        return Ok(AuthUser {
                            login: account.login,
                            roles: account.roles,
                        });
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::error!(error = %e, "local login bypass lookup failed");
                        return Err(StatusCode::INTERNAL_SERVER_ERROR);
                    }
                }
            }
        }
        // Production, or the bypass did not resolve: fall through to the JWT flow.

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            StatusCode::UNAUTHORIZED
        })?;

        Ok(AuthUser {
            login: token_data.claims.sub,
            roles: token_data.claims.roles,
        })
    }
}
