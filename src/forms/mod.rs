//! Sign-in and sign-up forms.
//!
//! Both forms run the same flow and differ only in their [`AuthFormConfig`]:
//!
//! ```text
//! Idle ──submit──▶ Submitting ──Success──▶ Succeeded ──(delay)──▶ navigate
//!   ▲                  │
//!   └──── Failed ◀─────┘ Failure / transport error
//! ```
//!
//! Validation runs before the state machine: a submission that violates a
//! field constraint never reaches the auth client and leaves the form state
//! untouched.

pub mod fields;
pub mod navigation;

pub use fields::{FieldKind, FieldSpec, Violation};
pub use navigation::{DeferredNavigation, Navigation, NavigationMode, Navigator};

use crate::auth::{AuthClient, AuthFuture, AuthOutcome, Credentials, Session};
use secrecy::SecretString;
use serde::Serialize;
use std::{collections::BTreeMap, sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;

const EMAIL: FieldSpec = FieldSpec::required("email", FieldKind::Email, "Email");
const PASSWORD: FieldSpec = FieldSpec::required("password", FieldKind::Password, "Password");
const NAME: FieldSpec = FieldSpec::required("name", FieldKind::Text, "Full Name");

const SIGN_IN_FIELDS: &[FieldSpec] = &[EMAIL, PASSWORD];
const SIGN_UP_FIELDS: &[FieldSpec] = &[NAME, EMAIL, PASSWORD.with_min_length(8)];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthOperation {
    SignInEmail,
    SignUpEmail,
}

impl AuthOperation {
    fn call<'a, C: AuthClient + ?Sized>(
        self,
        client: &'a C,
        credentials: &'a Credentials,
    ) -> AuthFuture<'a> {
        match self {
            Self::SignInEmail => client.sign_in_email(credentials),
            Self::SignUpEmail => client.sign_up_email(credentials),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormLabels {
    pub title: &'static str,
    pub description: &'static str,
    pub idle_submit: &'static str,
    pub busy_submit: &'static str,
    /// Link to the other form: (prompt, link text, href).
    pub alternate: (&'static str, &'static str, &'static str),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthFormConfig {
    pub id: &'static str,
    pub fields: &'static [FieldSpec],
    pub operation: AuthOperation,
    pub success_message: &'static str,
    pub failure_fallback: &'static str,
    pub navigation: Navigation,
    pub labels: FormLabels,
}

impl AuthFormConfig {
    #[must_use]
    pub fn sign_in() -> Self {
        Self {
            id: "sign-in",
            fields: SIGN_IN_FIELDS,
            operation: AuthOperation::SignInEmail,
            success_message: "Signed in successfully!",
            failure_fallback: "Failed to sign in",
            navigation: Navigation {
                target: "/".to_string(),
                delay: Duration::from_millis(500),
                mode: NavigationMode::ClientRoute { refresh: true },
            },
            labels: FormLabels {
                title: "Sign In",
                description: "Sign in to your account",
                idle_submit: "Sign In",
                busy_submit: "Signing In...",
                alternate: ("Don't have an account?", "Sign up", "/sign-up"),
            },
        }
    }

    #[must_use]
    pub fn sign_up() -> Self {
        Self {
            id: "sign-up",
            fields: SIGN_UP_FIELDS,
            operation: AuthOperation::SignUpEmail,
            success_message: "Account created successfully! Signing you in...",
            failure_fallback: "Failed to create account",
            navigation: Navigation {
                target: "/".to_string(),
                delay: Duration::from_millis(1000),
                mode: NavigationMode::FullReload,
            },
            labels: FormLabels {
                title: "Sign Up",
                description: "Create a new account to get started",
                idle_submit: "Sign Up",
                busy_submit: "Creating Account...",
                alternate: ("Already have an account?", "Sign in", "/sign-in"),
            },
        }
    }

    fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FormPhase {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

/// Per-instance mutable state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormState {
    pub values: BTreeMap<&'static str, String>,
    pub loading: bool,
    pub message: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("unknown field: {0}")]
    UnknownField(String),
}

/// Why a submission ended in `Failed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureCause {
    /// The auth service answered with a failure.
    Rejected,
    /// The auth call produced no answer.
    Unavailable,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Submission {
    Blocked(Vec<Violation>),
    Failed {
        message: String,
        cause: FailureCause,
    },
    Succeeded {
        session: Session,
        navigation: Navigation,
    },
}

#[derive(Debug)]
pub struct AuthForm {
    config: AuthFormConfig,
    phase: FormPhase,
    state: FormState,
    violations: Vec<Violation>,
    navigation: Option<Navigation>,
}

impl AuthForm {
    #[must_use]
    pub fn new(config: AuthFormConfig) -> Self {
        let values = config
            .fields
            .iter()
            .map(|field| (field.name, String::new()))
            .collect();

        Self {
            config,
            phase: FormPhase::Idle,
            state: FormState {
                values,
                loading: false,
                message: None,
            },
            violations: Vec::new(),
            navigation: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthFormConfig {
        &self.config
    }

    #[must_use]
    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    #[must_use]
    pub fn state(&self) -> &FormState {
        &self.state
    }

    /// # Errors
    /// Returns [`FormError::UnknownField`] if the form has no field called `name`.
    pub fn set_field(&mut self, name: &str, value: &str) -> Result<(), FormError> {
        let field = self
            .config
            .field(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?;

        self.state
            .values
            .insert(field.name, field.kind.sanitize(value));

        Ok(())
    }

    #[must_use]
    pub fn value(&self, name: &str) -> &str {
        self.state.values.get(name).map_or("", String::as_str)
    }

    /// All constraint violations, in field order, at most one per field.
    #[must_use]
    pub fn validate(&self) -> Vec<Violation> {
        self.config
            .fields
            .iter()
            .filter_map(|field| field.check(self.value(field.name)))
            .collect()
    }

    /// Run one submission to completion.
    #[instrument(skip(self, client), fields(form = self.config.id))]
    pub async fn submit<C: AuthClient + ?Sized>(&mut self, client: &C) -> Submission {
        let violations = self.validate();
        if !violations.is_empty() {
            debug!(count = violations.len(), "submission blocked by validation");
            self.violations.clone_from(&violations);
            return Submission::Blocked(violations);
        }

        self.violations.clear();
        self.navigation = None;
        self.phase = FormPhase::Submitting;
        self.state.loading = true;
        self.state.message = None;

        let credentials = self.credentials();
        let result = self.config.operation.call(client, &credentials).await;

        self.state.loading = false;

        match result {
            Ok(AuthOutcome::Success(session)) => {
                info!("auth call succeeded");
                self.phase = FormPhase::Succeeded;
                self.state.message = Some(self.config.success_message.to_string());
                self.navigation = Some(self.config.navigation.clone());

                Submission::Succeeded {
                    session,
                    navigation: self.config.navigation.clone(),
                }
            }
            Ok(AuthOutcome::Failure { message }) => {
                let message = message
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| self.config.failure_fallback.to_string());
                info!(%message, "auth call failed");
                self.fail(message, FailureCause::Rejected)
            }
            Err(err) => {
                error!("auth call did not complete: {}", err);
                self.fail(
                    self.config.failure_fallback.to_string(),
                    FailureCause::Unavailable,
                )
            }
        }
    }

    /// Hand the pending post-success navigation to `navigator`.
    ///
    /// Returns `None` unless the last submission succeeded. The returned
    /// handle owns the timer: dropping it cancels a navigation that has not
    /// fired yet. Requires a tokio runtime.
    #[must_use]
    pub fn schedule_navigation(&self, navigator: Arc<dyn Navigator>) -> Option<DeferredNavigation> {
        let navigation = self.navigation.clone()?;
        Some(DeferredNavigation::schedule(navigation, navigator))
    }

    fn fail(&mut self, message: String, cause: FailureCause) -> Submission {
        self.phase = FormPhase::Failed;
        self.state.message = Some(message.clone());
        Submission::Failed { message, cause }
    }

    fn credentials(&self) -> Credentials {
        let name = self
            .config
            .field(NAME.name)
            .map(|_| self.value(NAME.name).to_string());

        Credentials {
            email: self.value(EMAIL.name).to_string(),
            password: SecretString::from(self.value(PASSWORD.name).to_string()),
            name,
        }
    }

    /// Renderable snapshot. Password values are never echoed back.
    #[must_use]
    pub fn view(&self) -> FormView {
        let labels = &self.config.labels;

        let fields = self
            .config
            .fields
            .iter()
            .map(|field| FieldView {
                name: field.name.to_string(),
                input_type: field.kind.input_type().to_string(),
                placeholder: field.placeholder.to_string(),
                required: field.required,
                min_length: field.min_length,
                value: match field.kind {
                    FieldKind::Password => String::new(),
                    FieldKind::Text | FieldKind::Email => self.value(field.name).to_string(),
                },
            })
            .collect();

        let message = self.state.message.as_ref().map(|text| MessageView {
            text: text.clone(),
            tone: match self.phase {
                FormPhase::Succeeded => Tone::Success,
                FormPhase::Idle | FormPhase::Submitting | FormPhase::Failed => Tone::Error,
            },
        });

        let violations = self
            .violations
            .iter()
            .map(|violation| ViolationView {
                field: violation.field().to_string(),
                message: violation.to_string(),
            })
            .collect();

        FormView {
            id: self.config.id.to_string(),
            title: labels.title.to_string(),
            description: labels.description.to_string(),
            phase: self.phase,
            fields,
            loading: self.state.loading,
            disabled: self.state.loading,
            submit_label: if self.state.loading {
                labels.busy_submit
            } else {
                labels.idle_submit
            }
            .to_string(),
            message,
            violations,
            navigation: self.navigation.as_ref().map(NavigationView::from),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldView {
    pub name: String,
    pub input_type: String,
    pub placeholder: String,
    pub required: bool,
    pub min_length: Option<usize>,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct MessageView {
    pub text: String,
    pub tone: Tone,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct ViolationView {
    pub field: String,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct NavigationView {
    pub target: String,
    pub delay_ms: u64,
    /// `client_route` or `full_reload`.
    pub mode: String,
    pub refresh: bool,
}

impl From<&Navigation> for NavigationView {
    fn from(navigation: &Navigation) -> Self {
        let (mode, refresh) = match navigation.mode {
            NavigationMode::ClientRoute { refresh } => ("client_route", refresh),
            NavigationMode::FullReload => ("full_reload", false),
        };

        Self {
            target: navigation.target.clone(),
            delay_ms: u64::try_from(navigation.delay.as_millis()).unwrap_or(u64::MAX),
            mode: mode.to_string(),
            refresh,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct FormView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub phase: FormPhase,
    pub fields: Vec<FieldView>,
    pub loading: bool,
    pub disabled: bool,
    pub submit_label: String,
    pub message: Option<MessageView>,
    pub violations: Vec<ViolationView>,
    pub navigation: Option<NavigationView>,
}
