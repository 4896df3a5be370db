//! Car advertisement workflow.
//!
//! An advertisement is either pending (`enabled = false`) or active (`enabled = true`).
//! Submissions by an administrator start active, everyone else's start pending, and
//! `activate_advertisement` is the only transition. Every operation takes the caller's
//! identity explicitly; nothing here reads request or session state.

use crate::{
    error::AppError,
    models::{AccountDto, AccountEntity, CarDto, CarEntity, CarFilter, CreateCarDto},
    repository::Repository,
};

/// find_account
///
/// Resolves a login to its stored account, failing with `AccountNotFound` if absent.
pub async fn find_account(repo: &dyn Repository, login: &str) -> Result<AccountEntity, AppError> {
    repo.find_account_by_login(login)
        .await?
        .ok_or_else(|| AppError::AccountNotFound(login.to_string()))
}

/// find_car
///
/// Loads a stored advertisement by id, failing with `CarNotFound` if absent.
pub async fn find_car(repo: &dyn Repository, id: i32) -> Result<CarEntity, AppError> {
    repo.find_car_by_id(id)
        .await?
        .ok_or(AppError::CarNotFound(id))
}

/// create_advertisement
///
/// Builds an advertisement owned by `login` and persists it. The account is resolved
/// first, so an unknown login persists nothing.
pub async fn create_advertisement(
    repo: &dyn Repository,
    login: &str,
    submission: CreateCarDto,
) -> Result<CarDto, AppError> {
    let account = find_account(repo, login).await?;

    let car = CarDto {
        id: None,
        name: submission.name,
        year: submission.year,
        price: submission.price,
        login: account.login.clone(),
        description: submission.description,
        enabled: account.is_administrator(),
    };

    let saved = repo.save_car(CarEntity::from(car)).await?;
    tracing::info!(
        car_id = ?saved.id,
        login = %saved.login,
        enabled = saved.enabled,
        "car advertisement created"
    );
    Ok(CarDto::from(saved))
}

/// list_advertisements
///
/// Every advertisement inside the filter's bounds, pending ones included.
pub async fn list_advertisements(
    repo: &dyn Repository,
    filter: CarFilter,
) -> Result<Vec<CarDto>, AppError> {
    let cars = repo.find_cars(filter).await?;
    Ok(cars.into_iter().map(CarDto::from).collect())
}

pub async fn get_advertisement(repo: &dyn Repository, id: i32) -> Result<CarDto, AppError> {
    find_car(repo, id).await.map(CarDto::from)
}

/// activate_advertisement
///
/// Pending -> active. Already active advertisements are left untouched.
pub async fn activate_advertisement(repo: &dyn Repository, id: i32) -> Result<(), AppError> {
    let car = find_car(repo, id).await?;
    if !car.enabled {
        repo.enable_car(id).await?;
        tracing::info!(car_id = id, "car advertisement activated");
    }
    Ok(())
}

/// describe_account
///
/// Wire form of the caller's own account.
pub async fn describe_account(repo: &dyn Repository, login: &str) -> Result<AccountDto, AppError> {
    find_account(repo, login).await.map(AccountDto::from)
}

/// create_account
///
/// Persists a new account with the submitted role set. Logins are unique and non-blank.
pub async fn create_account(
    repo: &dyn Repository,
    account: AccountDto,
) -> Result<AccountDto, AppError> {
    if account.login.trim().is_empty() {
        return Err(AppError::BlankLogin);
    }
    let login = account.login.clone();
    repo.create_account(AccountEntity::from(account))
        .await?
        .map(AccountDto::from)
        .ok_or(AppError::LoginTaken(login))
}
