//! Flow tests for login, lockout, refresh, logout, and the reset and
//! verification grants, run against the in-memory store with a manual
//! clock.

mod support;

use std::sync::atomic::Ordering;

use chrono::Duration;

use gatehouse_core::error::ErrorKind;
use gatehouse_core::traits::Clock;
use gatehouse_core::types::RequestMeta;
use gatehouse_entity::user::Role;
use support::TestApp;

const GOOD_PW: &str = "Str0ng!Pw";
const META: RequestMeta = RequestMeta {
    ip_address: None,
    user_agent: None,
    device_info: None,
};

#[tokio::test]
async fn test_login_issues_token_pair() {
    let app = TestApp::new();
    let user = app.create_user("a@x.com", GOOD_PW, Role::User).await;

    let outcome = app.login("a@x.com", GOOD_PW).await;
    assert_eq!(outcome.user.id, user.id);
    assert_eq!(outcome.tokens.expires_in, 30 * 60);

    let (claims, resolved) = app
        .auth
        .verify_access_token(&outcome.tokens.access_token)
        .await
        .unwrap();
    assert_eq!(resolved.id, user.id);
    assert_eq!(claims.email.as_deref(), Some("a@x.com"));
    assert_eq!(claims.role, Some(Role::User));
    assert!(claims.session_id.is_some());

    let reloaded = app.reload(user.id).await;
    assert!(reloaded.last_login_at.is_some());
}

#[tokio::test]
async fn test_login_is_case_insensitive_on_email() {
    let app = TestApp::new();
    app.create_user("a@x.com", GOOD_PW, Role::User).await;

    assert!(
        app.auth
            .login("A@X.COM", GOOD_PW, false, &META)
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_credential_failures_are_indistinguishable() {
    let app = TestApp::new();
    app.create_user("a@x.com", GOOD_PW, Role::User).await;

    let unknown = app
        .auth
        .login("nobody@x.com", GOOD_PW, false, &META)
        .await
        .unwrap_err();
    let wrong = app
        .auth
        .login("a@x.com", "wrong-password", false, &META)
        .await
        .unwrap_err();

    assert_eq!(unknown.kind, ErrorKind::InvalidCredentials);
    assert_eq!(wrong.kind, ErrorKind::InvalidCredentials);
    assert_eq!(unknown.message, wrong.message);
}

#[tokio::test]
async fn test_lockout_scenario() {
    let app = TestApp::new();
    let user = app.create_user("a@x.com", GOOD_PW, Role::User).await;

    // Five consecutive failures trip the lock.
    for _ in 0..5 {
        let err = app
            .auth
            .login("a@x.com", "wrong-password", false, &META)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidCredentials);
    }

    let locked = app.reload(user.id).await;
    assert!(locked.is_locked);
    assert_eq!(locked.failed_login_attempts, 5);
    assert!(locked.locked_until.is_some());

    // Even the correct password is refused while the lock holds.
    let err = app
        .auth
        .login("a@x.com", GOOD_PW, false, &META)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AccountLocked);

    // Past the lockout window the correct password works and the counter
    // is back to zero.
    app.clock.advance(Duration::minutes(31));
    let outcome = app.login("a@x.com", GOOD_PW).await;
    assert_eq!(outcome.user.id, user.id);

    let reloaded = app.reload(user.id).await;
    assert_eq!(reloaded.failed_login_attempts, 0);
    assert!(!reloaded.is_locked);
    assert!(reloaded.locked_until.is_none());
}

#[tokio::test]
async fn test_successful_login_resets_counter() {
    let app = TestApp::new();
    let user = app.create_user("a@x.com", GOOD_PW, Role::User).await;

    for _ in 0..3 {
        let _ = app.auth.login("a@x.com", "wrong-password", false, &META).await;
    }
    assert_eq!(app.reload(user.id).await.failed_login_attempts, 3);

    app.login("a@x.com", GOOD_PW).await;
    assert_eq!(app.reload(user.id).await.failed_login_attempts, 0);
}

#[tokio::test]
async fn test_inactive_account_cannot_login() {
    use gatehouse_database::stores::UserStore;

    let app = TestApp::new();
    let user = app.create_user("a@x.com", GOOD_PW, Role::User).await;
    app.store.deactivate(user.id, app.clock.now()).await.unwrap();

    let err = app
        .auth
        .login("a@x.com", GOOD_PW, false, &META)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AccountInactive);
}

#[tokio::test]
async fn test_refresh_mints_new_access_token() {
    let app = TestApp::new();
    let user = app.create_user("a@x.com", GOOD_PW, Role::User).await;
    let outcome = app.login("a@x.com", GOOD_PW).await;

    app.clock.advance(Duration::minutes(45));

    let access = app
        .auth
        .refresh_access_token(&outcome.tokens.refresh_token, &META)
        .await
        .unwrap();

    let (claims, resolved) = app.auth.verify_access_token(&access).await.unwrap();
    assert_eq!(resolved.id, user.id);
    assert_eq!(claims.role, Some(Role::User));
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let app = TestApp::new();
    app.create_user("a@x.com", GOOD_PW, Role::User).await;
    let outcome = app.login("a@x.com", GOOD_PW).await;

    // An access token presented as a refresh token is a kind mismatch.
    let err = app
        .auth
        .refresh_access_token(&outcome.tokens.access_token, &META)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidToken);
}

#[tokio::test]
async fn test_revoked_refresh_token_never_works_again() {
    let app = TestApp::new();
    let user = app.create_user("a@x.com", GOOD_PW, Role::User).await;
    let outcome = app.login("a@x.com", GOOD_PW).await;

    app.auth
        .logout(&user, Some(&outcome.tokens.refresh_token), false, &META)
        .await
        .unwrap();

    // The token itself is unexpired, but its session is gone.
    let err = app
        .auth
        .refresh_access_token(&outcome.tokens.refresh_token, &META)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_logout_all_devices() {
    let app = TestApp::new();
    let user = app.create_user("a@x.com", GOOD_PW, Role::User).await;
    let first = app.login("a@x.com", GOOD_PW).await;
    let second = app.login("a@x.com", GOOD_PW).await;

    app.auth.logout(&user, None, true, &META).await.unwrap();

    for tokens in [&first.tokens, &second.tokens] {
        assert!(
            app.auth
                .refresh_access_token(&tokens.refresh_token, &META)
                .await
                .is_err()
        );
    }
}

#[tokio::test]
async fn test_expired_refresh_token_is_rejected() {
    let app = TestApp::new();
    app.create_user("a@x.com", GOOD_PW, Role::User).await;
    let outcome = app.login("a@x.com", GOOD_PW).await;

    // Default refresh TTL is seven days.
    app.clock.advance(Duration::days(8));

    let err = app
        .auth
        .refresh_access_token(&outcome.tokens.refresh_token, &META)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidToken);
}

#[tokio::test]
async fn test_remember_me_doubles_session_lifetime() {
    let app = TestApp::new();
    app.create_user("a@x.com", GOOD_PW, Role::User).await;

    let outcome = app
        .auth
        .login("a@x.com", GOOD_PW, true, &META)
        .await
        .unwrap();

    // Past the plain TTL but inside the doubled one.
    app.clock.advance(Duration::days(10));
    assert!(
        app.auth
            .refresh_access_token(&outcome.tokens.refresh_token, &META)
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_password_reset_is_enumeration_safe() {
    let app = TestApp::new();
    app.create_user("a@x.com", GOOD_PW, Role::User).await;

    assert!(app.auth.request_password_reset("a@x.com", &META).await.is_ok());
    assert!(
        app.auth
            .request_password_reset("nobody@x.com", &META)
            .await
            .is_ok()
    );

    // Only the real account produced a token.
    assert_eq!(app.mailer.reset_tokens.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_mailer_failure_does_not_fail_reset_request() {
    let app = TestApp::new();
    app.create_user("a@x.com", GOOD_PW, Role::User).await;
    app.mailer.failing.store(true, Ordering::SeqCst);

    assert!(app.auth.request_password_reset("a@x.com", &META).await.is_ok());
}

#[tokio::test]
async fn test_password_reset_flow() {
    let app = TestApp::new();
    let user = app.create_user("a@x.com", GOOD_PW, Role::User).await;
    let outcome = app.login("a@x.com", GOOD_PW).await;

    app.auth
        .request_password_reset("a@x.com", &META)
        .await
        .unwrap();
    let token = app.mailer.last_reset_token().unwrap();

    // A weak replacement password is rejected and the grant stays open.
    let err = app
        .auth
        .confirm_password_reset(&token, "weak", &META)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::WeakPassword);

    app.auth
        .confirm_password_reset(&token, "N3w!Secret", &META)
        .await
        .unwrap();

    // Redemption revoked every session.
    assert!(
        app.auth
            .refresh_access_token(&outcome.tokens.refresh_token, &META)
            .await
            .is_err()
    );

    // Old password is gone, new one works.
    assert!(app.auth.login("a@x.com", GOOD_PW, false, &META).await.is_err());
    let relogin = app.login("a@x.com", "N3w!Secret").await;
    assert_eq!(relogin.user.id, user.id);

    // One valid consumption only.
    assert!(
        app.auth
            .confirm_password_reset(&token, "An0ther!Pw", &META)
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_expired_reset_token_is_rejected() {
    let app = TestApp::new();
    app.create_user("a@x.com", GOOD_PW, Role::User).await;

    app.auth
        .request_password_reset("a@x.com", &META)
        .await
        .unwrap();
    let token = app.mailer.last_reset_token().unwrap();

    app.clock.advance(Duration::hours(2));

    let err = app
        .auth
        .confirm_password_reset(&token, "N3w!Secret", &META)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidToken);
}

#[tokio::test]
async fn test_reset_request_for_inactive_account_sends_nothing() {
    use gatehouse_database::stores::UserStore;

    let app = TestApp::new();
    let user = app.create_user("a@x.com", GOOD_PW, Role::User).await;
    app.store.deactivate(user.id, app.clock.now()).await.unwrap();

    assert!(app.auth.request_password_reset("a@x.com", &META).await.is_ok());
    assert!(app.mailer.reset_tokens.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_email_verification_flow() {
    let app = TestApp::new();
    let user = app.create_user("a@x.com", GOOD_PW, Role::User).await;
    assert!(!user.is_verified);

    app.auth
        .send_email_verification(&user, &META)
        .await
        .unwrap();
    let token = app.mailer.last_verification_token().unwrap();

    let verified = app
        .auth
        .confirm_email_verification(&token, &META)
        .await
        .unwrap();
    assert!(verified.is_verified);
    assert!(verified.email_verified_at.is_some());
}

#[tokio::test]
async fn test_verification_token_is_not_a_reset_token() {
    let app = TestApp::new();
    let user = app.create_user("a@x.com", GOOD_PW, Role::User).await;

    app.auth
        .send_email_verification(&user, &META)
        .await
        .unwrap();
    let token = app.mailer.last_verification_token().unwrap();

    let err = app
        .auth
        .confirm_password_reset(&token, "N3w!Secret", &META)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidToken);
}

#[tokio::test]
async fn test_change_password_revokes_sessions() {
    let app = TestApp::new();
    app.create_user("a@x.com", GOOD_PW, Role::User).await;
    let outcome = app.login("a@x.com", GOOD_PW).await;
    let ctx = app.ctx_from_login(&outcome).await;

    let err = app
        .users
        .change_password(&ctx, "wrong-current", "N3w!Secret")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidCredentials);

    app.users
        .change_password(&ctx, GOOD_PW, "N3w!Secret")
        .await
        .unwrap();

    assert!(
        app.auth
            .refresh_access_token(&outcome.tokens.refresh_token, &META)
            .await
            .is_err()
    );
    assert!(app.auth.login("a@x.com", "N3w!Secret", false, &META).await.is_ok());
}

#[tokio::test]
async fn test_revoke_all_is_idempotent() {
    use gatehouse_database::stores::SessionStore;

    let app = TestApp::new();
    let user = app.create_user("a@x.com", GOOD_PW, Role::User).await;
    app.login("a@x.com", GOOD_PW).await;
    app.login("a@x.com", GOOD_PW).await;

    let first = app.store.deactivate_all_for_user(user.id).await.unwrap();
    assert_eq!(first, 2);
    let active: Vec<_> = app.store.find_active_by_user(user.id).await.unwrap();
    assert!(active.is_empty());

    let second = app.store.deactivate_all_for_user(user.id).await.unwrap();
    assert_eq!(second, 0);
    let active: Vec<_> = app.store.find_active_by_user(user.id).await.unwrap();
    assert!(active.is_empty());
}

#[tokio::test]
async fn test_session_listing_and_single_revoke() {
    let app = TestApp::new();
    app.create_user("a@x.com", GOOD_PW, Role::User).await;
    let first = app.login("a@x.com", GOOD_PW).await;
    let _second = app.login("a@x.com", GOOD_PW).await;

    let ctx = app.ctx_from_login(&first).await;
    let sessions = app.users.list_sessions(&ctx).await.unwrap();
    assert_eq!(sessions.len(), 2);

    app.users
        .revoke_session(&ctx, ctx.session_id)
        .await
        .unwrap();
    let sessions = app.users.list_sessions(&ctx).await.unwrap();
    assert_eq!(sessions.len(), 1);

    // Revoking the same session again reports it missing.
    let err = app
        .users
        .revoke_session(&ctx, ctx.session_id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_expired_session_sweep() {
    use gatehouse_database::stores::SessionStore;

    let app = TestApp::new();
    let user = app.create_user("a@x.com", GOOD_PW, Role::User).await;
    app.login("a@x.com", GOOD_PW).await;
    app.login("a@x.com", GOOD_PW).await;

    app.clock.advance(Duration::days(8));

    let swept = app.store.deactivate_expired(app.clock.now()).await.unwrap();
    assert_eq!(swept, 2);

    // Running the sweep again finds nothing; it is idempotent.
    let swept = app.store.deactivate_expired(app.clock.now()).await.unwrap();
    assert_eq!(swept, 0);

    assert!(app.store.find_active_by_user(user.id).await.unwrap().is_empty());
}
