//! Identification against users created by blueprints.
//!
//! Covers the observable guarantees of the identification stage: unknown
//! identifiers and wrong passwords are indistinguishable to the caller, and
//! unknown identifiers are only answered after a delay.

use crate::common::fixtures::USER_BLUEPRINT;
use crate::common::{RecordingDispatcher, TestRoot, engine};
use async_trait::async_trait;
use idp_engine::blueprints::{BlueprintInstance, TaskStatus};
use idp_engine::flows::{Flow, FlowDesignation, FlowExecutor, FlowRequest, Signal};
use idp_engine::stages::identification::{
    IdentificationChallengeResponse, IdentificationFailed, IdentificationStage,
    IdentificationStageView,
};
use idp_engine::stages::password::{Authenticator, PasswordStage, PermissionDenied};
use idp_engine::stages::AUTHENTICATION_FAILED;
use idp_engine::storage::InMemoryStorage;
use idp_engine::users::{PendingUser, User, UserDirectory, UserField};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const TENANT: &str = "default";

struct SinglePassword;

#[async_trait]
impl Authenticator for SinglePassword {
    async fn authenticate(
        &self,
        _request: &FlowRequest,
        _backends: &[String],
        username: &str,
        password: &str,
    ) -> Result<Option<User>, PermissionDenied> {
        if password == "correct horse" {
            Ok(Some(User::new(username, "admin@example.com")))
        } else {
            Ok(None)
        }
    }
}

/// Apply the user blueprint and return a directory over the same storage.
async fn bootstrapped_directory() -> UserDirectory<InMemoryStorage> {
    let root = TestRoot::new();
    root.write("system/users.yaml", USER_BLUEPRINT);
    let engine = engine(&root, RecordingDispatcher::new());
    let instance = BlueprintInstance::new("Bootstrap users", "system/users.yaml");
    engine.store().save(TENANT, &instance).await.unwrap();
    assert_eq!(
        engine.apply(TENANT, instance.instance_uuid).await.status,
        TaskStatus::Successful
    );
    UserDirectory::new(engine.store().storage().clone())
}

fn executor() -> FlowExecutor {
    FlowExecutor::new(
        Flow::new("default-authentication-flow", FlowDesignation::Authentication),
        FlowRequest::new("192.0.2.10"),
    )
}

fn password_stage() -> PasswordStage {
    PasswordStage {
        name: "default-password".to_string(),
        backends: vec!["inbuilt".to_string()],
        allow_show_password: false,
    }
}

#[tokio::test]
async fn test_blueprint_users_are_identifiable() {
    let stage = IdentificationStage::new("default-identification")
        .with_user_fields([UserField::Email, UserField::Upn]);
    let view = IdentificationStageView::new(stage, TENANT, bootstrapped_directory().await);

    for identifier in ["ADMIN@example.com", "akadmin@corp.example.com"] {
        let mut executor = executor();
        view.submit(&mut executor, IdentificationChallengeResponse::new(identifier))
            .await
            .unwrap();
        let pending = executor.plan.context.pending_user.unwrap();
        assert_eq!(pending.username(), "akadmin");
        assert_eq!(pending.user().unwrap().name, "Administrator");
    }
}

#[tokio::test]
async fn test_unknown_user_and_wrong_password_look_the_same() {
    let stage = IdentificationStage::new("default-identification")
        .with_user_fields([UserField::Username])
        .with_password_stage(password_stage());
    let failures = Arc::new(AtomicUsize::new(0));
    let signal = Signal::<IdentificationFailed>::new();
    let counter = Arc::clone(&failures);
    signal.connect(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let view = IdentificationStageView::new(stage, TENANT, bootstrapped_directory().await)
        .with_authenticator(Arc::new(SinglePassword))
        .with_failure_signal(signal);

    let started = Instant::now();
    let unknown = view
        .submit(
            &mut executor(),
            IdentificationChallengeResponse::new("nobody").with_password("correct horse"),
        )
        .await
        .unwrap_err();
    assert!(started.elapsed() >= Duration::from_millis(90));

    let wrong = view
        .submit(
            &mut executor(),
            IdentificationChallengeResponse::new("akadmin").with_password("battery staple"),
        )
        .await
        .unwrap_err();

    assert!(unknown.is_validation());
    assert!(wrong.is_validation());
    assert_eq!(unknown.to_string(), AUTHENTICATION_FAILED);
    assert_eq!(wrong.to_string(), unknown.to_string());
    // Only the unknown identifier is reported as a failed identification.
    assert_eq!(failures.load(Ordering::SeqCst), 1);

    let mut executor = executor();
    view.submit(
        &mut executor,
        IdentificationChallengeResponse::new("akadmin").with_password("correct horse"),
    )
    .await
    .unwrap();
    assert_eq!(executor.completed_stages(), 1);
}

#[tokio::test]
async fn test_hidden_matched_user_keeps_identifier_only() {
    let stage = IdentificationStage::new("default-identification")
        .with_user_fields([UserField::Email])
        .with_show_matched_user(false);
    let view = IdentificationStageView::new(stage, TENANT, bootstrapped_directory().await);

    let mut executor = executor();
    view.submit(&mut executor, IdentificationChallengeResponse::new("admin@example.com"))
        .await
        .unwrap();

    let context = &executor.plan.context;
    assert_eq!(
        context.pending_user,
        Some(PendingUser::Placeholder {
            identifier: "admin@example.com".to_string()
        })
    );
    assert_eq!(
        context.pending_user_identifier.as_deref(),
        Some("admin@example.com")
    );
}

#[tokio::test]
async fn test_pretended_user_continues_the_flow() {
    let stage = IdentificationStage::new("default-identification")
        .with_user_fields([UserField::Username]);
    let view = IdentificationStageView::new(stage, TENANT, bootstrapped_directory().await);

    let mut executor = executor();
    view.submit(&mut executor, IdentificationChallengeResponse::new("ghost"))
        .await
        .unwrap();

    let pending = executor.plan.context.pending_user.unwrap();
    assert_eq!(pending.username(), "ghost");
    assert!(pending.user().is_none());
}
