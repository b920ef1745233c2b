// libs/shared/utils/tests/jwt_test.rs
use shared_models::auth::Role;
use shared_utils::jwt::validate_token;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

fn secret() -> String {
    TestConfig::default().jwt_secret
}

#[test]
fn test_valid_token_yields_user() {
    let test_user = TestUser::doctor("doc@example.com");
    let token = JwtTestUtils::create_test_token(&test_user, &secret(), Some(24));

    let user = validate_token(&token, &secret()).unwrap();
    assert_eq!(user.id, test_user.id);
    assert_eq!(user.email.as_deref(), Some("doc@example.com"));
    assert_eq!(user.role, Some(Role::Doctor));
}

#[test]
fn test_every_role_round_trips() {
    for test_user in [
        TestUser::patient("p@example.com"),
        TestUser::doctor("d@example.com"),
        TestUser::secretary("s@example.com"),
        TestUser::admin("a@example.com"),
    ] {
        let token = JwtTestUtils::create_test_token(&test_user, &secret(), Some(1));
        let user = validate_token(&token, &secret()).unwrap();
        assert_eq!(user.role, Some(test_user.role));
    }
}

#[test]
fn test_expired_token_rejected() {
    let test_user = TestUser::default();
    let token = JwtTestUtils::create_expired_token(&test_user, &secret());

    let err = validate_token(&token, &secret()).unwrap_err();
    assert!(err.contains("expired"), "unexpected error: {}", err);
}

#[test]
fn test_wrong_signature_rejected() {
    let test_user = TestUser::default();
    let token = JwtTestUtils::create_invalid_signature_token(&test_user);

    let err = validate_token(&token, &secret()).unwrap_err();
    assert!(err.contains("signature"), "unexpected error: {}", err);
}

#[test]
fn test_malformed_token_rejected() {
    let token = JwtTestUtils::create_malformed_token();
    assert!(validate_token(&token, &secret()).is_err());
    assert!(validate_token("", &secret()).is_err());
    assert!(validate_token("only-one-part", &secret()).is_err());
}

#[test]
fn test_unknown_role_rejected() {
    // The role set is closed: a signed token with an unrecognized role
    // string must fail validation, not downgrade to a default role.
    let test_user = TestUser::default();
    let token = JwtTestUtils::create_token_with_raw_role(&test_user, "superuser", &secret());

    let err = validate_token(&token, &secret()).unwrap_err();
    assert!(err.contains("Unknown role"), "unexpected error: {}", err);
}

#[test]
fn test_empty_secret_rejected() {
    let test_user = TestUser::default();
    let token = JwtTestUtils::create_test_token(&test_user, &secret(), Some(1));

    assert!(validate_token(&token, "").is_err());
}
