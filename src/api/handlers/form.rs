//! Rendering and submission shared by the sign-in and sign-up routes.
//!
//! Each request gets its own [`AuthForm`]. Responses are HTML unless the
//! client's `Accept` header prefers `application/json`, in which case the
//! [`FormView`](crate::forms::FormView) snapshot is returned as is.

use crate::{
    auth::AuthClient,
    forms::{AuthForm, AuthFormConfig, FailureCause, Submission},
};
use axum::{
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{ACCEPT, REFRESH, SET_COOKIE, VARY},
    },
    response::{Html, IntoResponse, Json, Response},
};
use minijinja::{Environment, UndefinedBehavior, context};
use tracing::{debug, error, warn};

const FORM_TEMPLATE: &str = include_str!("../templates/form.html");

/// `GET`: a fresh form.
pub fn show(config: AuthFormConfig, headers: &HeaderMap) -> Response {
    let form = AuthForm::new(config);
    respond(&form, StatusCode::OK, headers, HeaderMap::new())
}

/// `POST`: run one submission and render the resulting state.
pub async fn submit(
    config: AuthFormConfig,
    auth: &dyn AuthClient,
    headers: &HeaderMap,
    fields: &[(&str, &str)],
) -> Response {
    let mut form = AuthForm::new(config);
    for (name, value) in fields {
        if let Err(err) = form.set_field(name, value) {
            debug!("Ignoring form input: {}", err);
        }
    }

    let submission = form.submit(auth).await;
    let json = wants_json(headers);

    let mut extra = HeaderMap::new();
    let status = match submission {
        Submission::Blocked(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Submission::Failed {
            cause: FailureCause::Rejected,
            ..
        } => StatusCode::BAD_REQUEST,
        Submission::Failed {
            cause: FailureCause::Unavailable,
            ..
        } => StatusCode::BAD_GATEWAY,
        Submission::Succeeded {
            session,
            navigation,
        } => {
            for cookie in session.set_cookies() {
                match HeaderValue::from_str(cookie) {
                    Ok(value) => {
                        extra.append(SET_COOKIE, value);
                    }
                    Err(err) => warn!("Dropping invalid Set-Cookie value: {}", err),
                }
            }

            if !json {
                match HeaderValue::from_str(&navigation.refresh_header()) {
                    Ok(value) => {
                        extra.insert(REFRESH, value);
                    }
                    Err(err) => error!("Failed to build Refresh header: {}", err),
                }
            }

            StatusCode::OK
        }
    };

    respond(&form, status, headers, extra)
}

fn respond(
    form: &AuthForm,
    status: StatusCode,
    request: &HeaderMap,
    mut extra: HeaderMap,
) -> Response {
    extra.insert(VARY, HeaderValue::from_static("accept"));

    if wants_json(request) {
        return (status, extra, Json(form.view())).into_response();
    }

    match render_html(form) {
        Ok(html) => (status, extra, Html(html)).into_response(),
        Err(err) => {
            error!("Failed to render form: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn render_html(form: &AuthForm) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    // `.html` names get HTML auto-escaping.
    env.add_template("form.html", FORM_TEMPLATE)?;

    let (prompt, label, href) = form.config().labels.alternate;

    env.get_template("form.html")?.render(context! {
        form => form.view(),
        alternate => context! { prompt, label, href },
    })
}

/// True when `application/json` carries a higher quality than `text/html`.
fn wants_json(headers: &HeaderMap) -> bool {
    let Some(accept) = headers.get(ACCEPT).and_then(|value| value.to_str().ok()) else {
        return false;
    };

    let mut json = 0.0_f32;
    let mut html = 0.0_f32;

    for range in accept.split(',') {
        let mut parts = range.split(';');
        let media = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
        let quality = parts
            .filter_map(|param| param.trim().strip_prefix("q="))
            .find_map(|q| q.trim().parse::<f32>().ok())
            .unwrap_or(1.0);

        match media.as_str() {
            "application/json" => json = json.max(quality),
            "text/html" => html = html.max(quality),
            _ => {}
        }
    }

    json > 0.0 && json > html
}
