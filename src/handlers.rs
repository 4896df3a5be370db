use crate::{
    AppState,
    auth::AuthUser,
    error::AppError,
    models::{AccountDto, CarDto, CarFilter, CreateCarDto, ErrorDto, Role},
    workflow,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

/// ActivateParams
///
/// Query parameters of `GET /api/car/activate`.
#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActivateParams {
    /// Identifier of the advertisement to activate.
    pub id: i32,
}

// --- Handlers ---

/// add_car
///
/// [Authenticated Route] Submits a new car advertisement owned by the caller.
///
/// *Authorization*: the principal must hold `USER` or `ADMIN`. Administrators'
/// advertisements go live immediately, everyone else's wait for activation.
#[utoipa::path(
    post,
    path = "/api/car/add",
    request_body = CreateCarDto,
    responses(
        (status = 200, description = "Created", body = CarDto),
        (status = 403, description = "Missing USER/ADMIN role", body = ErrorDto),
        (status = 417, description = "Caller has no account", body = ErrorDto)
    )
)]
pub async fn add_car(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateCarDto>,
) -> Result<Json<CarDto>, AppError> {
    auth.require_any_role(&[Role::User, Role::Admin])?;

    workflow::create_advertisement(state.repo.as_ref(), &auth.login, payload)
        .await
        .inspect_err(|e| tracing::error!(login = %auth.login, error = %e, "Failed to add car"))
        .map(Json)
}

/// get_cars
///
/// [Public Route] Lists advertisements inside the optional year and price ranges.
/// Bounds are inclusive; pending advertisements are included.
#[utoipa::path(
    get,
    path = "/api/car/cars",
    params(CarFilter),
    responses((status = 200, description = "Matching advertisements", body = [CarDto]))
)]
pub async fn get_cars(
    State(state): State<AppState>,
    Query(filter): Query<CarFilter>,
) -> Result<Json<Vec<CarDto>>, AppError> {
    let cars = workflow::list_advertisements(state.repo.as_ref(), filter).await?;
    Ok(Json(cars))
}

/// get_car
///
/// [Public Route] Retrieves a single advertisement by id.
#[utoipa::path(
    get,
    path = "/api/car/{id}",
    params(("id" = i32, Path, description = "Advertisement ID")),
    responses(
        (status = 200, description = "Found", body = CarDto),
        (status = 417, description = "No such advertisement", body = ErrorDto)
    )
)]
pub async fn get_car(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CarDto>, AppError> {
    workflow::get_advertisement(state.repo.as_ref(), id)
        .await
        .map(Json)
}

/// activate_car
///
/// [Public Route] Moves an advertisement from pending to active. Repeating the call on
/// an active advertisement succeeds without changing it.
#[utoipa::path(
    get,
    path = "/api/car/activate",
    params(ActivateParams),
    responses(
        (status = 200, description = "Activated"),
        (status = 417, description = "No such advertisement", body = ErrorDto)
    )
)]
pub async fn activate_car(
    State(state): State<AppState>,
    Query(ActivateParams { id }): Query<ActivateParams>,
) -> Result<StatusCode, AppError> {
    workflow::activate_advertisement(state.repo.as_ref(), id)
        .await
        .inspect_err(|e| {
            tracing::error!(car_id = id, error = %e, "Failed to activate car advertisement")
        })?;
    Ok(StatusCode::OK)
}

/// get_me
///
/// [Authenticated Route] Returns the caller's own account.
#[utoipa::path(
    get,
    path = "/api/account/me",
    responses(
        (status = 200, description = "Account", body = AccountDto),
        (status = 417, description = "Caller has no account", body = ErrorDto)
    )
)]
pub async fn get_me(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AccountDto>, AppError> {
    workflow::describe_account(state.repo.as_ref(), &auth.login)
        .await
        .map(Json)
}

/// create_account
///
/// [Admin Route] Registers an account with an explicit role set.
///
/// *RBAC*: strict enforcement of the `ADMIN` role before touching the repository.
#[utoipa::path(
    post,
    path = "/api/admin/accounts",
    request_body = AccountDto,
    responses(
        (status = 200, description = "Created", body = AccountDto),
        (status = 400, description = "Blank login", body = ErrorDto),
        (status = 403, description = "Not an administrator", body = ErrorDto),
        (status = 409, description = "Login taken", body = ErrorDto)
    )
)]
pub async fn create_account(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<AccountDto>,
) -> Result<Json<AccountDto>, AppError> {
    auth.require_any_role(&[Role::Admin])?;

    let created = workflow::create_account(state.repo.as_ref(), payload).await?;
    tracing::info!(admin = %auth.login, login = %created.login, "account created");
    Ok(Json(created))
}
