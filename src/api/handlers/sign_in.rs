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
pub struct SignInInput {
    email: String,
    password: String,
}

#[utoipa::path(
    get,
    path= "/sign-in",
    responses (
        (status = 200, description = "Empty sign-in form (HTML, or JSON when preferred by Accept)", body = FormView)
    ),
    tag= "forms"
)]
pub async fn sign_in_form(headers: HeaderMap) -> Response {
    form::show(AuthFormConfig::sign_in(), &headers)
}

#[utoipa::path(
    post,
    path= "/sign-in",
    request_body(content = SignInInput, content_type = "application/x-www-form-urlencoded"),
    responses (
        (status = 200, description = "Signed in; session cookies set and navigation scheduled", body = FormView),
        (status = 400, description = "Authentication service rejected the credentials", body = FormView),
        (status = 422, description = "Input violates field constraints", body = FormView),
        (status = 502, description = "Authentication service unreachable", body = FormView)
    ),
    tag= "forms"
)]
pub async fn sign_in(
    Extension(auth): Extension<Arc<dyn AuthClient>>,
    headers: HeaderMap,
    Form(input): Form<SignInInput>,
) -> Response {
    form::submit(
        AuthFormConfig::sign_in(),
        auth.as_ref(),
        &headers,
        &[
            ("email", input.email.as_str()),
            ("password", input.password.as_str()),
        ],
    )
    .await
}

#[cfg(test)]
mod tests {
    use crate::{
        api::{RouteCount, router},
        auth::{AuthClient, mock::MockAuthClient},
    };
    use anyhow::Result;
    use axum::{
        Router,
        body::{Body, to_bytes},
        extract::Extension,
        http::{
            Request, StatusCode,
            header::{ACCEPT, CONTENT_TYPE, REFRESH, SET_COOKIE},
        },
        response::Response,
    };
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(client: Arc<MockAuthClient>) -> Router {
        let auth: Arc<dyn AuthClient> = client;
        let (router, _openapi) = router().split_for_parts();
        router
            .layer(Extension(auth))
            .layer(Extension(RouteCount(0)))
    }

    fn post(body: &'static str, accept: &'static str) -> Result<Request<Body>> {
        Ok(Request::builder()
            .method("POST")
            .uri("/sign-in")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(ACCEPT, accept)
            .body(Body::from(body))?)
    }

    async fn text(response: Response) -> Result<String> {
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }

    #[tokio::test]
    async fn get_renders_empty_form() -> Result<()> {
        let response = app(Arc::new(MockAuthClient::succeeding(&[])))
            .oneshot(Request::builder().uri("/sign-in").body(Body::empty())?)
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        let html = text(response).await?;
        assert!(html.contains("<title>Sign In</title>"));
        assert!(html.contains("Sign in to your account"));
        assert!(html.contains(">Sign In</button>"));
        Ok(())
    }

    #[tokio::test]
    async fn success_relays_cookies_and_schedules_refresh() -> Result<()> {
        let client = Arc::new(MockAuthClient::succeeding(&[
            "session_token=abc; HttpOnly; Path=/",
            "session_data=xyz; Path=/",
        ]));

        let response = app(client.clone())
            .oneshot(post(
                "email=user%40example.com&password=secret123",
                "text/html",
            )?)
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(REFRESH)
                .and_then(|value| value.to_str().ok()),
            Some("0.5; url=/")
        );
        let cookies: Vec<_> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_string)
            .collect();
        assert_eq!(
            cookies,
            [
                "session_token=abc; HttpOnly; Path=/",
                "session_data=xyz; Path=/"
            ]
        );

        let html = text(response).await?;
        assert!(html.contains("Signed in successfully!"));

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].email, "user@example.com");
        assert_eq!(calls[0].password, "secret123");
        Ok(())
    }

    #[tokio::test]
    async fn success_as_json_carries_navigation() -> Result<()> {
        let response = app(Arc::new(MockAuthClient::succeeding(&[])))
            .oneshot(post(
                "email=user%40example.com&password=secret123",
                "application/json",
            )?)
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(REFRESH).is_none());

        let json: Value = serde_json::from_str(&text(response).await?)?;
        assert_eq!(json["phase"], "succeeded");
        assert_eq!(json["loading"], false);
        assert_eq!(json["message"]["text"], "Signed in successfully!");
        assert_eq!(json["message"]["tone"], "success");
        assert_eq!(json["navigation"]["target"], "/");
        assert_eq!(json["navigation"]["delay_ms"], 500);
        assert_eq!(json["navigation"]["mode"], "client_route");
        assert_eq!(json["navigation"]["refresh"], true);
        Ok(())
    }

    #[tokio::test]
    async fn rejected_credentials_show_service_message() -> Result<()> {
        let response = app(Arc::new(MockAuthClient::failing(Some(
            "Invalid credentials",
        ))))
        .oneshot(post(
            "email=user%40example.com&password=wrong",
            "application/json",
        )?)
        .await?;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(SET_COOKIE).is_none());

        let json: Value = serde_json::from_str(&text(response).await?)?;
        assert_eq!(json["message"]["text"], "Invalid credentials");
        assert_eq!(json["message"]["tone"], "error");
        assert_eq!(json["loading"], false);
        assert_eq!(json["navigation"], Value::Null);
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_auth_service_is_bad_gateway() -> Result<()> {
        let response = app(Arc::new(MockAuthClient::erroring()))
            .oneshot(post(
                "email=user%40example.com&password=secret123",
                "text/html",
            )?)
            .await?;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let html = text(response).await?;
        assert!(html.contains("Failed to sign in"));
        assert!(html.contains(">Sign In</button>"));
        Ok(())
    }

    #[tokio::test]
    async fn malformed_email_is_blocked() -> Result<()> {
        let client = Arc::new(MockAuthClient::succeeding(&[]));

        let response = app(client.clone())
            .oneshot(post("email=not-an-email&password=secret123", "text/html")?)
            .await?;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(client.calls().is_empty());

        let html = text(response).await?;
        assert!(html.contains("Please enter an email address."));
        assert!(html.contains(r#"value="not-an-email""#));
        Ok(())
    }
}
