use super::form;
use crate::{
    auth::AuthClient,
    forms::{AuthFormConfig, FormView},
};
use axum::{
    extract::{Extension, Form},
    http::HeaderMap,
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(ToSchema, Deserialize, Default)]
#[serde(default)]
pub struct SignUpInput {
    name: String,
    email: String,
    /// At least 8 characters.
    password: String,
}

#[utoipa::path(
    get,
    path= "/sign-up",
    responses (
        (status = 200, description = "Empty sign-up form (HTML, or JSON when preferred by Accept)", body = FormView)
    ),
    tag= "forms"
)]
pub async fn sign_up_form(headers: HeaderMap) -> Response {
    form::show(AuthFormConfig::sign_up(), &headers)
}

#[utoipa::path(
    post,
    path= "/sign-up",
    request_body(content = SignUpInput, content_type = "application/x-www-form-urlencoded"),
    responses (
        (status = 200, description = "Account created; session cookies set and full reload scheduled", body = FormView),
        (status = 400, description = "Authentication service refused the account", body = FormView),
        (status = 422, description = "Input violates field constraints", body = FormView),
        (status = 502, description = "Authentication service unreachable", body = FormView)
    ),
    tag= "forms"
)]
pub async fn sign_up(
    Extension(auth): Extension<Arc<dyn AuthClient>>,
    headers: HeaderMap,
    Form(input): Form<SignUpInput>,
) -> Response {
    form::submit(
        AuthFormConfig::sign_up(),
        auth.as_ref(),
        &headers,
        &[
            ("name", input.name.as_str()),
            ("email", input.email.as_str()),
            ("password", input.password.as_str()),
        ],
    )
    .await
}
