use std::{collections::BTreeSet, sync::Arc};

use car_market::{
    AppError,
    models::{AccountDto, CarDto, CarFilter, CreateCarDto, Role},
    repository::{InMemoryRepository, Repository},
    workflow,
};
use tokio::test;

async fn repo_with_accounts() -> InMemoryRepository {
    let repo = InMemoryRepository::new();
    for (login, roles) in [
        ("bob", vec![Role::User]),
        ("root", vec![Role::Admin]),
        ("both", vec![Role::User, Role::Admin]),
        ("nobody-special", vec![]),
    ] {
        workflow::create_account(
            &repo,
            AccountDto {
                login: login.to_string(),
                roles: roles.into_iter().collect(),
            },
        )
        .await
        .unwrap();
    }
    repo
}

fn civic() -> CreateCarDto {
    CreateCarDto {
        name: "Civic".to_string(),
        year: 2015,
        price: 9000,
        description: "clean".to_string(),
    }
}

#[test]
async fn test_regular_user_submission_starts_pending() {
    let repo = repo_with_accounts().await;

    let created = workflow::create_advertisement(&repo, "bob", civic())
        .await
        .unwrap();

    assert_eq!(
        created,
        CarDto {
            id: Some(1),
            name: "Civic".to_string(),
            year: 2015,
            price: 9000,
            login: "bob".to_string(),
            description: "clean".to_string(),
            enabled: false,
        }
    );
}

#[test]
async fn test_enabled_follows_admin_membership() {
    let repo = repo_with_accounts().await;

    for (login, expected) in [
        ("bob", false),
        ("root", true),
        ("both", true),
        ("nobody-special", false),
    ] {
        let created = workflow::create_advertisement(&repo, login, civic())
            .await
            .unwrap();
        assert_eq!(created.enabled, expected, "login {login}");
        assert_eq!(created.login, login);
    }
}

#[test]
async fn test_unknown_login_fails_and_persists_nothing() {
    let repo = repo_with_accounts().await;

    let err = workflow::create_advertisement(&repo, "ghost", civic())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::AccountNotFound(ref login) if login == "ghost"));
    assert!(
        workflow::list_advertisements(&repo, CarFilter::default())
            .await
            .unwrap()
            .is_empty()
    );
}

#[test]
async fn test_activation_is_idempotent() {
    let repo = repo_with_accounts().await;
    let created = workflow::create_advertisement(&repo, "bob", civic())
        .await
        .unwrap();
    let id = created.id.unwrap();

    workflow::activate_advertisement(&repo, id).await.unwrap();
    assert!(workflow::get_advertisement(&repo, id).await.unwrap().enabled);

    workflow::activate_advertisement(&repo, id).await.unwrap();
    assert!(workflow::get_advertisement(&repo, id).await.unwrap().enabled);
}

#[test]
async fn test_activating_unknown_id_fails_without_creating_a_record() {
    let repo = repo_with_accounts().await;

    let err = workflow::activate_advertisement(&repo, 99999)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::CarNotFound(99999)));
    assert_eq!(repo.find_car_by_id(99999).await.unwrap(), None);
}

#[test]
async fn test_list_applies_bounds_regardless_of_state() {
    let repo = repo_with_accounts().await;
    for (login, year, price) in [
        ("bob", 2015, 9000),
        ("root", 2012, 8000),
        ("bob", 2009, 3000),
        ("root", 2018, 15000),
    ] {
        workflow::create_advertisement(
            &repo,
            login,
            CreateCarDto {
                name: format!("car-{year}"),
                year,
                price,
                description: String::new(),
            },
        )
        .await
        .unwrap();
    }

    let listed = workflow::list_advertisements(
        &repo,
        CarFilter {
            year_from: Some(2010),
            price_to: Some(10000),
            ..CarFilter::default()
        },
    )
    .await
    .unwrap();

    let summary: Vec<(i32, bool)> = listed.iter().map(|c| (c.year, c.enabled)).collect();
    assert_eq!(summary, vec![(2015, false), (2012, true)]);
}

#[test]
async fn test_concurrent_activations_all_succeed() {
    let repo = Arc::new(repo_with_accounts().await);
    let id = workflow::create_advertisement(&*repo, "bob", civic())
        .await
        .unwrap()
        .id
        .unwrap();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let repo = Arc::clone(&repo);
            tokio::spawn(async move { workflow::activate_advertisement(&*repo, id).await })
        })
        .collect();

    for task in tasks {
        assert!(task.await.unwrap().is_ok());
    }
    assert!(workflow::get_advertisement(&*repo, id).await.unwrap().enabled);
}

#[test]
async fn test_describe_and_create_account() {
    let repo = repo_with_accounts().await;

    let me = workflow::describe_account(&repo, "both").await.unwrap();
    assert_eq!(me.roles, BTreeSet::from([Role::User, Role::Admin]));

    let missing = workflow::describe_account(&repo, "ghost").await.unwrap_err();
    assert!(matches!(missing, AppError::AccountNotFound(_)));

    let duplicate = workflow::create_account(
        &repo,
        AccountDto {
            login: "bob".to_string(),
            roles: BTreeSet::new(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(duplicate, AppError::LoginTaken(ref login) if login == "bob"));
}

#[test]
async fn test_blank_login_is_rejected_before_storage() {
    let repo = InMemoryRepository::new();

    for login in ["", "   "] {
        let err = workflow::create_account(
            &repo,
            AccountDto {
                login: login.to_string(),
                roles: BTreeSet::from([Role::User]),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BlankLogin));
    }
    assert_eq!(repo.find_account_by_login("").await.unwrap(), None);
}
