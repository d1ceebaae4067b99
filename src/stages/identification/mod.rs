//! Identification stage.
//!
//! Resolves a submitted identifier to a user, optionally checking a captcha
//! and a password in the same step. Unknown identifiers and wrong passwords
//! produce the same [`AUTHENTICATION_FAILED`] error, and unknown identifiers
//! are answered only after a randomized delay so that response timing does
//! not reveal whether an account exists.
//!
//! # Example Usage
//!
//! ```rust
//! use idp_engine::flows::{Flow, FlowDesignation, FlowExecutor, FlowRequest};
//! use idp_engine::stages::identification::{
//!     IdentificationChallengeResponse, IdentificationStage, IdentificationStageView,
//! };
//! use idp_engine::storage::InMemoryStorage;
//! use idp_engine::users::{User, UserDirectory, UserField};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let directory = UserDirectory::new(InMemoryStorage::new());
//! directory.save("default", &User::new("akadmin", "admin@example.com")).await?;
//!
//! let stage = IdentificationStage::new("default-identification")
//!     .with_user_fields([UserField::Username]);
//! let view = IdentificationStageView::new(stage, "default", directory);
//!
//! let flow = Flow::new("default-authentication-flow", FlowDesignation::Authentication);
//! let mut executor = FlowExecutor::new(flow, FlowRequest::new("127.0.0.1"));
//! view.submit(&mut executor, IdentificationChallengeResponse::new("akadmin")).await?;
//! assert_eq!(executor.plan.context.pending_user.unwrap().username(), "akadmin");
//! # Ok(())
//! # }
//! ```

pub mod challenge;
pub mod models;

pub use challenge::{
    IDENTIFICATION_COMPONENT, IdentificationChallenge, IdentificationChallengeResponse,
    LoginSource,
};
pub use models::IdentificationStage;

use crate::flows::{
    ChallengeRegistry, FlowDesignation, FlowExecutor, Signal, StageResult, flow_url,
};
use crate::sources::Source;
use crate::stages::captcha::{CaptchaChallenge, CaptchaVerifier};
use crate::stages::password::Authenticator;
use crate::stages::{AUTHENTICATION_FAILED, StageError};
use crate::storage::{MatchMode, StorageError, StorageProvider};
use crate::users::{PendingUser, User, UserDirectory};
use log::{debug, info, warn};
use rand::Rng;
use rand::rngs::OsRng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Emitted whenever a submitted identifier matches no user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentificationFailed {
    pub identifier: String,
    pub client_ip: String,
    pub stage: String,
}

/// Delay before answering a lookup that matched nothing: 90 to 210 ms in
/// steps of 30 ms.
pub fn failed_lookup_delay() -> Duration {
    Duration::from_millis(30 * OsRng.gen_range(3..=7))
}

/// Handles challenges and responses of one identification stage.
pub struct IdentificationStageView<S> {
    stage: IdentificationStage,
    tenant_id: String,
    directory: UserDirectory<S>,
    sources: Vec<Source>,
    challenges: Arc<ChallengeRegistry>,
    authenticator: Option<Arc<dyn Authenticator>>,
    captcha: Option<Arc<dyn CaptchaVerifier>>,
    failed: Signal<IdentificationFailed>,
}

impl<S> IdentificationStageView<S>
where
    S: StorageProvider<Error = StorageError>,
{
    pub fn new(stage: IdentificationStage, tenant_id: impl Into<String>, directory: UserDirectory<S>) -> Self {
        Self {
            stage,
            tenant_id: tenant_id.into(),
            directory,
            sources: Vec::new(),
            challenges: Arc::new(ChallengeRegistry::with_defaults()),
            authenticator: None,
            captcha: None,
            failed: Signal::new(),
        }
    }

    pub fn with_sources(mut self, sources: Vec<Source>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_challenge_registry(mut self, registry: Arc<ChallengeRegistry>) -> Self {
        self.challenges = registry;
        self
    }

    pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    pub fn with_captcha_verifier(mut self, verifier: Arc<dyn CaptchaVerifier>) -> Self {
        self.captcha = Some(verifier);
        self
    }

    /// Use `signal` for identification failures instead of a private one.
    pub fn with_failure_signal(mut self, signal: Signal<IdentificationFailed>) -> Self {
        self.failed = signal;
        self
    }

    pub fn stage(&self) -> &IdentificationStage {
        &self.stage
    }

    /// Signal emitted when an identifier matches no user.
    pub fn failure_signal(&self) -> &Signal<IdentificationFailed> {
        &self.failed
    }

    /// Look up the user `identifier` refers to.
    pub async fn get_user(&self, identifier: &str) -> Result<Option<User>, StorageError> {
        let mode = if self.stage.case_insensitive_matching {
            MatchMode::CaseInsensitive
        } else {
            MatchMode::Exact
        };
        self.directory
            .find(&self.tenant_id, &self.stage.user_fields, identifier, mode)
            .await
    }

    /// Label of the form's submit button.
    pub fn primary_action(designation: FlowDesignation) -> &'static str {
        match designation {
            FlowDesignation::Authentication => "Log in",
            _ => "Continue",
        }
    }

    /// Build the challenge rendered for this stage.
    pub fn get_challenge(&self, executor: &FlowExecutor) -> IdentificationChallenge {
        let request = &executor.request;
        let query = request.flow_query();

        let mut sources: Vec<&Source> = self.sources.iter().filter(|source| source.enabled).collect();
        sources.sort_by(|a, b| a.name.cmp(&b.name));

        let buttons = sources
            .into_iter()
            .filter_map(|source| {
                let button = source.ui_login_button(request)?;
                match self.challenges.validate(button.challenge.as_ref()) {
                    Ok(challenge) => Some(LoginSource {
                        name: button.name,
                        icon_url: button.icon_url,
                        challenge,
                    }),
                    Err(error) => {
                        warn!("Invalid login button for source {}: {}", source.slug, error);
                        None
                    }
                }
            })
            .collect();

        IdentificationChallenge {
            component: IDENTIFICATION_COMPONENT,
            user_fields: self.stage.user_fields.clone(),
            password_fields: self.stage.password_stage.is_some(),
            allow_show_password: self
                .stage
                .password_stage
                .as_ref()
                .is_some_and(|stage| stage.allow_show_password),
            captcha_stage: self.stage.captcha_stage.as_ref().map(CaptchaChallenge::from),
            application_pre: request.application_pre(),
            flow_designation: executor.flow.designation,
            primary_action: Self::primary_action(executor.flow.designation),
            enroll_url: self
                .stage
                .enrollment_flow
                .as_deref()
                .map(|slug| flow_url(slug, &query)),
            recovery_url: self
                .stage
                .recovery_flow
                .as_deref()
                .map(|slug| flow_url(slug, &query)),
            passwordless_url: self
                .stage
                .passwordless_flow
                .as_deref()
                .map(|slug| flow_url(slug, &BTreeMap::new())),
            sources: buttons,
            show_source_labels: self.stage.show_source_labels,
            enable_remember_me: self.stage.enable_remember_me,
        }
    }

    /// Validate a submitted response and resolve the pending user.
    ///
    /// On an unknown identifier the flow context receives a placeholder user
    /// before the error is returned.
    pub async fn validate(
        &self,
        executor: &mut FlowExecutor,
        response: &IdentificationChallengeResponse,
    ) -> Result<PendingUser, StageError> {
        let identifier = response.uid_field.as_str();

        let Some(user) = self.get_user(identifier).await? else {
            return self.reject_unknown(executor, identifier).await;
        };

        if let Some(captcha_stage) = &self.stage.captcha_stage {
            let token = response.captcha_token.as_deref().unwrap_or_else(|| {
                warn!("Captcha token not set for identification attempt");
                ""
            });
            let Some(verifier) = &self.captcha else {
                warn!("Captcha stage {} has no verifier", captcha_stage.name);
                return Err(StageError::authentication_failed());
            };
            verifier
                .verify(captcha_stage, token, &executor.request.client_ip)
                .await
                .map_err(|error| StageError::validation(error.message))?;
        }

        let Some(password_stage) = &self.stage.password_stage else {
            return Ok(PendingUser::Existing(user));
        };

        let password = response.password.as_deref().unwrap_or_else(|| {
            warn!("Password not set for ident+auth attempt");
            ""
        });
        let Some(authenticator) = &self.authenticator else {
            warn!("Password stage {} has no authenticator", password_stage.name);
            return Err(StageError::authentication_failed());
        };

        match authenticator
            .authenticate(
                &executor.request,
                &password_stage.backends,
                &user.username,
                password,
            )
            .await
        {
            Ok(Some(authenticated)) => Ok(PendingUser::Existing(authenticated)),
            Ok(None) => Err(StageError::authentication_failed()),
            Err(denied) => {
                info!(
                    "Authentication denied for {}: {}",
                    user.username, denied.message
                );
                Err(StageError::authentication_failed())
            }
        }
    }

    async fn reject_unknown(
        &self,
        executor: &mut FlowExecutor,
        identifier: &str,
    ) -> Result<PendingUser, StageError> {
        tokio::time::sleep(failed_lookup_delay()).await;

        info!(
            "invalid_login identifier={} client_ip={} action=invalid_identifier stage={}",
            identifier, executor.request.client_ip, self.stage.name
        );
        self.failed.send(&IdentificationFailed {
            identifier: identifier.to_string(),
            client_ip: executor.request.client_ip.clone(),
            stage: self.stage.name.clone(),
        });

        let placeholder = PendingUser::Placeholder {
            identifier: identifier.to_string(),
        };
        let context = &mut executor.plan.context;
        context.pending_user = Some(placeholder.clone());
        if !self.stage.show_matched_user {
            context.pending_user_identifier = Some(identifier.to_string());
        }

        if self.stage.pretend_user_exists && self.stage.password_stage.is_none() {
            debug!("Pretending unknown identifier {} exists", identifier);
            return Ok(placeholder);
        }
        Err(StageError::validation(AUTHENTICATION_FAILED))
    }

    /// Store the resolved user for later stages and finish the stage.
    ///
    /// With `show_matched_user` disabled only the submitted identifier is
    /// stored.
    pub fn challenge_valid(
        &self,
        executor: &mut FlowExecutor,
        pending: PendingUser,
        identifier: &str,
    ) -> StageResult {
        let context = &mut executor.plan.context;
        if self.stage.show_matched_user {
            context.pending_user = Some(pending);
        } else {
            context.pending_user = Some(PendingUser::Placeholder {
                identifier: identifier.to_string(),
            });
            context.pending_user_identifier = Some(identifier.to_string());
        }
        executor.stage_ok()
    }

    /// Validate `response` and, on success, finish the stage.
    pub async fn submit(
        &self,
        executor: &mut FlowExecutor,
        response: IdentificationChallengeResponse,
    ) -> Result<StageResult, StageError> {
        let pending = self.validate(executor, &response).await?;
        Ok(self.challenge_valid(executor, pending, &response.uid_field))
    }
}
