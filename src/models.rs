use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, de};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};

// --- Roles ---

/// Role
///
/// Privilege tag assigned to an account. An account holds a *set* of roles; privilege
/// checks are membership tests against that set rather than a role hierarchy.
/// Stored and serialized as the upper-case tag (`"USER"`, `"ADMIN"`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS, ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a stored role tag is not one of the known variants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role tag `{0}`")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// is_administrator
///
/// True iff the role set contains `ADMIN`. Empty sets are never privileged.
pub fn is_administrator(roles: &BTreeSet<Role>) -> bool {
    roles.contains(&Role::Admin)
}

// --- Storage Forms (Mapped to Database) ---

/// AccountEntity
///
/// Stored account: a row of `accounts` joined with its `account_roles` tags.
/// `id` is the surrogate key and stays `None` until the account is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccountEntity {
    pub id: Option<i32>,
    // Unique, externally visible identity key.
    pub login: String,
    pub roles: BTreeSet<Role>,
}

impl AccountEntity {
    pub fn is_administrator(&self) -> bool {
        is_administrator(&self.roles)
    }
}

/// CarEntity
///
/// Stored car advertisement, one row of the `cars` table.
/// `id` is `None` for an advertisement that has not been saved yet.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Default)]
pub struct CarEntity {
    pub id: Option<i32>,
    pub name: String,
    pub year: i32,
    pub price: i32,
    pub description: String,
    // Author's login. A plain back-reference, no cascade.
    pub login: String,
    // false = pending moderation, true = live.
    pub enabled: bool,
}

// --- Wire Forms (Request/Response Bodies) ---

/// CarDto
///
/// Wire form of an advertisement, returned by every car endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CarDto {
    /// Server-assigned identifier. Absent only before the advertisement is saved.
    pub id: Option<i32>,
    #[schema(example = "Civic")]
    pub name: String,
    #[schema(example = 2015)]
    pub year: i32,
    #[schema(example = 9000)]
    pub price: i32,
    pub login: String,
    pub description: String,
    pub enabled: bool,
}

/// CreateCarDto
///
/// Input payload for `POST /api/car/add`. `id`, `login` and `enabled` are computed
/// server-side and therefore absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateCarDto {
    pub name: String,
    pub year: i32,
    pub price: i32,
    pub description: String,
}

/// AccountDto
///
/// Wire form of an account. Also the input payload for account creation by an admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AccountDto {
    #[schema(example = "bob")]
    pub login: String,
    pub roles: BTreeSet<Role>,
}

/// ErrorResponse
///
/// Machine-readable failure category carried in every error envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ErrorResponse {
    ProcessingError,
    AccessDenied,
    Conflict,
    BadRequest,
    InternalError,
}

/// ErrorDto
///
/// Uniform error envelope: `{"errorResponse": "PROCESSING_ERROR", "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ErrorDto {
    pub error_response: ErrorResponse,
    pub message: String,
}

// --- Query Parameters ---

/// CarFilter
///
/// Optional inclusive bounds accepted by `GET /api/car/cars`. An absent bound leaves
/// that side of the range open, and so does a blank one (`?yearFrom=`), which is what
/// a search form submits for an empty field. Bounds are not validated against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CarFilter {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub year_from: Option<i32>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub year_to: Option<i32>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub price_from: Option<i32>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub price_to: Option<i32>,
}

// Query strings carry every value as text; JSON bodies carry numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawBound {
    Number(i32),
    Text(String),
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawBound>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawBound::Number(value)) => Ok(Some(value)),
        Some(RawBound::Text(text)) => match text.trim() {
            "" => Ok(None),
            value => value.parse().map(Some).map_err(de::Error::custom),
        },
    }
}

impl CarFilter {
    /// matches
    ///
    /// Evaluates the four inclusive comparisons against a stored advertisement.
    pub fn matches(&self, car: &CarEntity) -> bool {
        self.year_from.is_none_or(|from| car.year >= from)
            && self.year_to.is_none_or(|to| car.year <= to)
            && self.price_from.is_none_or(|from| car.price >= from)
            && self.price_to.is_none_or(|to| car.price <= to)
    }
}
