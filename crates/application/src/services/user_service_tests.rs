//! 用户服务单元测试

use std::sync::Arc;

use domain::{DomainError, MockUserRepository, RepositoryError, UserId};
use mockall::predicate::eq;
use uuid::Uuid;

use super::test_support::*;
use crate::{
    clock::FixedClock,
    dto::CreateUserRequest,
    error::ApplicationError,
    lookup::UserLookup,
    services::{UserService, UserServiceDependencies},
};

fn service_with(repository: MockUserRepository) -> UserService {
    UserService::new(UserServiceDependencies {
        user_repository: Arc::new(repository),
        password_hasher: Arc::new(PrefixHasher),
        clock: Arc::new(FixedClock(fixed_now())),
    })
}

fn create_request() -> CreateUserRequest {
    CreateUserRequest {
        name: "Alice Liddell".to_string(),
        username: "alice".to_string(),
        email: "alice@example.com".to_string(),
        password: "StrongPass123!".to_string(),
    }
}

#[tokio::test]
async fn test_create_user() {
    let mut repository = MockUserRepository::new();
    repository.expect_find_by_email().returning(|_| Ok(None));
    repository.expect_find_by_username().returning(|_| Ok(None));
    repository
        .expect_create()
        .withf(|user| {
            user.password.as_ref().map(|hash| hash.as_str()) == Some("hashed:StrongPass123!")
        })
        .times(1)
        .returning(Ok);
    let service = service_with(repository);

    let created = service.create_user(create_request()).await.unwrap();

    assert_eq!(created.name, "Alice Liddell");
    assert_eq!(created.username.as_str(), "alice");
    assert_eq!(created.email.as_str(), "alice@example.com");
    assert_eq!(created.created_at, fixed_now());
}

#[tokio::test]
async fn test_create_user_email_conflict() {
    let existing = user("alice");
    let mut repository = MockUserRepository::new();
    repository
        .expect_find_by_email()
        .returning(move |_| Ok(Some(existing.clone())));
    repository.expect_find_by_username().returning(|_| Ok(None));
    repository.expect_create().never();
    let service = service_with(repository);

    let result = service.create_user(create_request()).await;

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::UserAlreadyExists))
    ));
}

#[tokio::test]
async fn test_create_user_username_conflict() {
    let existing = user("alice");
    let mut repository = MockUserRepository::new();
    repository.expect_find_by_email().returning(|_| Ok(None));
    repository
        .expect_find_by_username()
        .returning(move |_| Ok(Some(existing.clone())));
    repository.expect_create().never();
    let service = service_with(repository);

    let result = service.create_user(create_request()).await;

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::UserAlreadyExists))
    ));
}

#[tokio::test]
async fn test_create_user_storage_conflict_is_already_exists() {
    let mut repository = MockUserRepository::new();
    repository.expect_find_by_email().returning(|_| Ok(None));
    repository.expect_find_by_username().returning(|_| Ok(None));
    repository
        .expect_create()
        .times(1)
        .returning(|_| Err(RepositoryError::Conflict));
    let service = service_with(repository);

    let result = service.create_user(create_request()).await;

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::UserAlreadyExists))
    ));
}

#[tokio::test]
async fn test_create_user_invalid_email() {
    let mut repository = MockUserRepository::new();
    repository.expect_create().never();
    let service = service_with(repository);

    let mut request = create_request();
    request.email = "invalid-email".to_string();
    let result = service.create_user(request).await;

    match result {
        Err(ApplicationError::Domain(DomainError::InvalidArgument { field, .. })) => {
            assert_eq!(field, "email")
        }
        other => panic!("Expected InvalidArgument error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_create_user_blank_password() {
    let mut repository = MockUserRepository::new();
    repository.expect_create().never();
    let service = service_with(repository);

    let mut request = create_request();
    request.password = "   ".to_string();

    assert!(matches!(
        service.create_user(request).await,
        Err(ApplicationError::Domain(DomainError::InvalidArgument { .. }))
    ));
}

#[tokio::test]
async fn test_get_user_by_id() {
    let alice = user("alice");
    let id = alice.id;
    let mut repository = MockUserRepository::new();
    repository
        .expect_find_by_id()
        .with(eq(id))
        .returning(move |_| Ok(Some(alice.clone())));
    let service = service_with(repository);

    let found = service.get_user_by_id(id).await.unwrap();

    assert_eq!(found.id, id);
    assert_eq!(found.username.as_str(), "alice");
    assert_eq!(found.deleted_at, None);
}

#[tokio::test]
async fn test_get_missing_or_deleted_user() {
    let mut deleted = user("gone");
    deleted.soft_delete(fixed_now());
    let deleted_id = deleted.id;
    let missing_id = UserId::from(Uuid::new_v4());

    let mut repository = MockUserRepository::new();
    repository
        .expect_find_by_id()
        .returning(move |id| Ok((id == deleted_id).then(|| deleted.clone())));
    let service = service_with(repository);

    for id in [deleted_id, missing_id] {
        let result = UserLookup::get_user_by_id(&service, id).await;
        assert!(matches!(
            result,
            Err(ApplicationError::Domain(DomainError::UserNotFound { id: reported })) if reported == id
        ));
    }
}

#[tokio::test]
async fn test_list_users() {
    let users = vec![user("alice"), user("bob")];
    let expected: Vec<_> = users.iter().map(|user| user.id).collect();
    let mut repository = MockUserRepository::new();
    repository
        .expect_list_active()
        .returning(move || Ok(users.clone()));
    let service = service_with(repository);

    let listed = service.list_users().await.unwrap();

    assert_eq!(
        listed.iter().map(|user| user.id).collect::<Vec<_>>(),
        expected
    );
}

#[tokio::test]
async fn test_delete_user_is_soft() {
    let alice = user("alice");
    let id = alice.id;
    let mut repository = MockUserRepository::new();
    repository
        .expect_find_by_id()
        .returning(move |_| Ok(Some(alice.clone())));
    repository
        .expect_update()
        .withf(|user| user.deleted_at == Some(fixed_now()))
        .times(1)
        .returning(Ok);
    let service = service_with(repository);

    service.delete_user(id).await.unwrap();
}
