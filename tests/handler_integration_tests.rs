use std::{collections::BTreeSet, sync::Arc};

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use car_market::{
    AppError, AppState, InMemoryRepository,
    auth::AuthUser,
    config::AppConfig,
    handlers::{self, ActivateParams},
    models::{AccountDto, CarDto, CarFilter, CreateCarDto, ErrorDto, ErrorResponse, Role},
    workflow,
};
use tokio::test;

// --- TEST UTILITIES ---

// AppState over an in-memory repository seeded with `bob` (USER) and `root` (ADMIN).
async fn create_test_state() -> AppState {
    let repo = InMemoryRepository::new();
    for (login, role) in [("bob", Role::User), ("root", Role::Admin)] {
        workflow::create_account(
            &repo,
            AccountDto {
                login: login.to_string(),
                roles: BTreeSet::from([role]),
            },
        )
        .await
        .unwrap();
    }
    AppState::new(Arc::new(repo), AppConfig::default())
}

fn principal(login: &str, roles: &[Role]) -> AuthUser {
    AuthUser {
        login: login.to_string(),
        roles: roles.iter().copied().collect(),
    }
}

fn civic() -> CreateCarDto {
    CreateCarDto {
        name: "Civic".to_string(),
        year: 2015,
        price: 9000,
        description: "clean".to_string(),
    }
}

async fn error_body(err: AppError) -> (StatusCode, ErrorDto) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// --- HANDLER TESTS ---

#[test]
async fn test_add_car_as_user_is_pending() {
    let state = create_test_state().await;

    let Json(car) = handlers::add_car(
        principal("bob", &[Role::User]),
        State(state),
        Json(civic()),
    )
    .await
    .unwrap();

    assert_eq!(car.login, "bob");
    assert!(car.id.is_some());
    assert!(!car.enabled);
}

#[test]
async fn test_add_car_as_admin_is_active() {
    let state = create_test_state().await;

    let Json(car) = handlers::add_car(
        principal("root", &[Role::Admin]),
        State(state),
        Json(civic()),
    )
    .await
    .unwrap();

    assert!(car.enabled);
}

#[test]
async fn test_add_car_requires_user_or_admin_role() {
    let state = create_test_state().await;

    let err = handlers::add_car(principal("bob", &[]), State(state.clone()), Json(civic()))
        .await
        .unwrap_err();

    let (status, body) = error_body(err).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body.error_response, ErrorResponse::AccessDenied);

    // Nothing was persisted.
    let Json(cars) = handlers::get_cars(State(state), Query(CarFilter::default()))
        .await
        .unwrap();
    assert!(cars.is_empty());
}

#[test]
async fn test_add_car_for_principal_without_account_is_417() {
    let state = create_test_state().await;

    let err = handlers::add_car(
        principal("ghost", &[Role::User]),
        State(state),
        Json(civic()),
    )
    .await
    .unwrap_err();

    let (status, body) = error_body(err).await;
    assert_eq!(status, StatusCode::EXPECTATION_FAILED);
    assert_eq!(body.error_response, ErrorResponse::ProcessingError);
    assert_eq!(body.message, "Account with login=ghost is not found");
}

#[test]
async fn test_get_cars_filters_by_bounds() {
    let state = create_test_state().await;
    for (login, year, price) in [("bob", 2015, 9000), ("root", 2008, 5000), ("bob", 2019, 20000)] {
        handlers::add_car(
            principal(login, &[Role::User]),
            State(state.clone()),
            Json(CreateCarDto {
                year,
                price,
                ..civic()
            }),
        )
        .await
        .unwrap();
    }

    let Json(cars) = handlers::get_cars(
        State(state),
        Query(CarFilter {
            year_from: Some(2010),
            price_to: Some(10000),
            ..CarFilter::default()
        }),
    )
    .await
    .unwrap();

    assert_eq!(cars.len(), 1);
    assert_eq!((cars[0].year, cars[0].price), (2015, 9000));
}

#[test]
async fn test_activate_car_twice_succeeds() {
    let state = create_test_state().await;
    let Json(CarDto { id, .. }) = handlers::add_car(
        principal("bob", &[Role::User]),
        State(state.clone()),
        Json(civic()),
    )
    .await
    .unwrap();
    let id = id.unwrap();

    for _ in 0..2 {
        let status = handlers::activate_car(State(state.clone()), Query(ActivateParams { id }))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    let Json(car) = handlers::get_car(State(state), Path(id)).await.unwrap();
    assert!(car.enabled);
}

#[test]
async fn test_activate_unknown_car_is_417() {
    let state = create_test_state().await;

    let err = handlers::activate_car(State(state), Query(ActivateParams { id: 99999 }))
        .await
        .unwrap_err();

    let (status, body) = error_body(err).await;
    assert_eq!(status, StatusCode::EXPECTATION_FAILED);
    assert_eq!(body.error_response, ErrorResponse::ProcessingError);
    assert_eq!(body.message, "Car with id=99999 is not found");
}

#[test]
async fn test_get_me_returns_account_roles() {
    let state = create_test_state().await;

    let Json(me) = handlers::get_me(principal("root", &[Role::Admin]), State(state))
        .await
        .unwrap();

    assert_eq!(me.login, "root");
    assert_eq!(me.roles, BTreeSet::from([Role::Admin]));
}

#[test]
async fn test_create_account_requires_admin() {
    let state = create_test_state().await;
    let payload = AccountDto {
        login: "carol".to_string(),
        roles: BTreeSet::from([Role::User]),
    };

    let err = handlers::create_account(
        principal("bob", &[Role::User]),
        State(state.clone()),
        Json(payload.clone()),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

    let Json(created) = handlers::create_account(
        principal("root", &[Role::Admin]),
        State(state.clone()),
        Json(payload.clone()),
    )
    .await
    .unwrap();
    assert_eq!(created, payload);

    let err = handlers::create_account(
        principal("root", &[Role::Admin]),
        State(state),
        Json(payload),
    )
    .await
    .unwrap_err();
    let (status, body) = error_body(err).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body.error_response, ErrorResponse::Conflict);
}

#[test]
async fn test_create_account_with_blank_login_is_400() {
    let state = create_test_state().await;

    let err = handlers::create_account(
        principal("root", &[Role::Admin]),
        State(state),
        Json(AccountDto {
            login: " ".to_string(),
            roles: BTreeSet::from([Role::User]),
        }),
    )
    .await
    .unwrap_err();

    let (status, body) = error_body(err).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.error_response, ErrorResponse::BadRequest);
    assert_eq!(body.message, "Login must not be blank");
}
