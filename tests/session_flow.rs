//! Route gating end to end: memory oracle, session service, terminal router.

use campus_display::adapters::memory::MemorySessionOracle;
use campus_display::adapters::ui::router::TerminalRouter;
use campus_display::domain::routes::{self, Route};
use campus_display::domain::{Credentials, DomainError, GateRender, PasswordChange, Registration};
use campus_display::ports::Navigator;
use campus_display::usecases::SessionService;
use std::sync::Arc;
use std::time::Duration;

fn setup(must_change: bool) -> (SessionService, Arc<TerminalRouter>) {
    let oracle = Arc::new(MemorySessionOracle::new().with_account(
        "staff@example.edu",
        "initial1",
        must_change,
    ));
    let router = Arc::new(TerminalRouter::new(Route::to(routes::ADMIN)));
    let session = SessionService::new(
        oracle,
        router.clone(),
        routes::DEFAULT_PUBLIC_ROUTES.iter().map(|r| r.to_string()).collect(),
        Duration::from_secs(300),
        6,
    );
    (session, router)
}

fn credentials() -> Credentials {
    Credentials {
        email: "staff@example.edu".into(),
        password: "initial1".into(),
    }
}

#[tokio::test]
async fn test_first_sign_in_walks_through_password_change() {
    let (session, router) = setup(true);
    session.start().await;

    // Signed out on a protected page: sent to login.
    let d = session.evaluate(&router.current()).await;
    assert_eq!(d.render, GateRender::Redirecting);
    assert_eq!(router.current(), Route::to(routes::LOGIN));
    assert_eq!(session.evaluate(&router.current()).await.render, GateRender::Children);

    session.sign_in(&credentials()).await.unwrap();

    // Authenticated on login: bounced home, then held at the password gate.
    session.evaluate(&router.current()).await;
    assert_eq!(router.current(), Route::to(routes::HOME));
    let d = session.evaluate(&router.current()).await;
    assert_eq!(d.render, GateRender::MustChangePassword);
    assert_eq!(router.current(), Route::to(routes::CHANGE_PASSWORD));
    assert_eq!(session.evaluate(&router.current()).await.render, GateRender::Children);

    session
        .change_password(&PasswordChange {
            current_password: "initial1".into(),
            new_password: "better-pass".into(),
            confirm_password: "better-pass".into(),
        })
        .await
        .unwrap();
    assert_eq!(router.current(), Route::to(routes::HOME));
    assert_eq!(session.evaluate(&router.current()).await.render, GateRender::Children);
    assert_eq!(session.evaluate(&Route::to(routes::ADMIN)).await.render, GateRender::Children);
}

#[tokio::test]
async fn test_sign_out_from_admin_stays_on_login() {
    let (session, router) = setup(false);
    session.start().await;
    session.sign_in(&credentials()).await.unwrap();
    assert_eq!(session.evaluate(&router.current()).await.render, GateRender::Children);

    session.sign_out().await.unwrap();
    assert!(router.current().force_logout);
    let d = session.evaluate(&router.current()).await;
    assert_eq!(d.render, GateRender::Children);
    assert!(d.navigate.is_none());
    assert!(router.current().is(routes::LOGIN));
}

#[tokio::test]
async fn test_register_then_sign_in_with_new_account() {
    let (session, router) = setup(false);
    session.start().await;
    router.navigate(Route::to(routes::REGISTER));
    assert_eq!(session.evaluate(&router.current()).await.render, GateRender::Children);

    let taken = Registration {
        name: None,
        email: "Staff@Example.edu".into(),
        password: "another1".into(),
    };
    let err = session.register(&taken).await.unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
    assert_eq!(router.current(), Route::to(routes::REGISTER));

    session
        .register(&Registration {
            name: Some("New Staff".into()),
            email: "new@example.edu".into(),
            password: "another1".into(),
        })
        .await
        .unwrap();
    assert_eq!(router.current(), Route::to(routes::LOGIN));

    session
        .sign_in(&Credentials {
            email: "new@example.edu".into(),
            password: "another1".into(),
        })
        .await
        .unwrap();
    // Signed in: the register page is no longer reachable.
    router.navigate(Route::to(routes::REGISTER));
    let d = session.evaluate(&router.current()).await;
    assert_eq!(d.render, GateRender::Redirecting);
    assert_eq!(router.current(), Route::to(routes::HOME));
}
