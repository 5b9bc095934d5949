//! The send-code / verify-code form shared by the subscribe and unsubscribe pages.
//!
//! There is no session: the verify form carries the email address in a hidden field and every
//! action re-submits it, next to the form token checked by [`verify_csrf`].
use crate::domain::Intent;
use crate::routes::csrf::{verify_csrf, CsrfToken};
use crate::telemetry::spawn_blocking_with_tracing;
use crate::utils::e500;
use crate::verification::{VerificationError, VerificationService};
use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use anyhow::Context as _;
use chrono::Utc;
use std::sync::Arc;
use tera::{Context, Tera};

#[derive(serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FlowAction {
    SendCode,
    VerifyCode,
    RequestNewCode,
}

#[derive(serde::Deserialize)]
pub struct FlowForm {
    action: FlowAction,
    #[serde(default)]
    email: String,
    verification_code: Option<String>,
    #[serde(default)]
    csrf_token: String,
}

/// Presentation class of the status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStatus {
    Success,
    Warning,
    Error,
}

impl FlowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStatus::Success => "success",
            FlowStatus::Warning => "warning",
            FlowStatus::Error => "error",
        }
    }
}

/// Static wording of one of the two pages.
pub struct FlowPage {
    pub intent: Intent,
    pub heading: &'static str,
    pub background: &'static str,
    pub action_path: &'static str,
    pub send_label: &'static str,
    pub verify_label: &'static str,
}

pub const SUBSCRIBE_PAGE: FlowPage = FlowPage {
    intent: Intent::Subscribe,
    heading: "📬 GitHub Email Subscription",
    background: "linear-gradient(135deg, #e0f7fa, #e8f5e9)",
    action_path: "/",
    send_label: "📨 Send Verification Code",
    verify_label: "✅ Verify",
};

pub const UNSUBSCRIBE_PAGE: FlowPage = FlowPage {
    intent: Intent::Unsubscribe,
    heading: "🚫 Unsubscribe from GitHub Updates",
    background: "linear-gradient(135deg, #fff1f2, #fef2f2)",
    action_path: "/unsubscribe",
    send_label: "📨 Send Unsubscribe Code",
    verify_label: "✅ Confirm Unsubscribe",
};

/// What the page shows after an action.
#[derive(Debug)]
pub struct FlowReply {
    pub status_code: StatusCode,
    pub status: FlowStatus,
    pub message: String,
    pub show_code_input: bool,
    pub email: String,
}

impl FlowReply {
    /// The page as first served, with the email field optionally prefilled.
    pub fn blank(email: String) -> Self {
        Self {
            status_code: StatusCode::OK,
            status: FlowStatus::Success,
            message: String::new(),
            show_code_input: false,
            email,
        }
    }

    fn success(message: String, email: String, show_code_input: bool) -> Self {
        Self {
            status_code: StatusCode::OK,
            status: FlowStatus::Success,
            message,
            show_code_input,
            email,
        }
    }

    fn from_error(error: VerificationError, intent: Intent, email: String) -> Self {
        let (status, message, show_code_input) = match &error {
            VerificationError::InvalidEmail(_) => {
                (FlowStatus::Error, "❌ Invalid email format.".to_string(), false)
            }
            VerificationError::AlreadySubscribed => (
                FlowStatus::Warning,
                "⚠️ This email is already subscribed.".to_string(),
                false,
            ),
            VerificationError::NotSubscribed => (
                FlowStatus::Warning,
                "⚠️ This email is not subscribed.".to_string(),
                false,
            ),
            VerificationError::RateLimited { wait_seconds } => (
                FlowStatus::Warning,
                format!("⏳ Please wait {wait_seconds}s before requesting a new code."),
                true,
            ),
            VerificationError::NoCodeFound => (
                FlowStatus::Error,
                "❌ No verification code found. Please request one.".to_string(),
                false,
            ),
            VerificationError::IntentMismatch => {
                let message = match intent {
                    Intent::Subscribe => "❌ This code is not valid for subscription.",
                    Intent::Unsubscribe => "❌ This code is not valid for unsubscription.",
                };
                (FlowStatus::Error, message.to_string(), false)
            }
            VerificationError::Expired => (
                FlowStatus::Warning,
                "⏰ Code expired. Please request a new one.".to_string(),
                false,
            ),
            VerificationError::AttemptsExhausted => (
                FlowStatus::Error,
                "❌ Too many failed attempts. Please request a new code.".to_string(),
                false,
            ),
            VerificationError::CodeMismatch { attempts_remaining } => (
                FlowStatus::Error,
                format!("❌ Incorrect code. {attempts_remaining} attempts left."),
                true,
            ),
            VerificationError::StoreIOError(_) | VerificationError::UnexpectedError(_) => {
                tracing::error!(
                    error.cause_chain = ?error,
                    error.message = %error,
                    "Failed to process a verification request"
                );
                (
                    FlowStatus::Error,
                    "❌ Something went wrong. Please try again later.".to_string(),
                    false,
                )
            }
        };

        Self {
            status_code: error.status_code(),
            status,
            message,
            show_code_input,
            email,
        }
    }
}

impl ResponseError for VerificationError {
    fn status_code(&self) -> StatusCode {
        match self {
            VerificationError::InvalidEmail(_)
            | VerificationError::NoCodeFound
            | VerificationError::Expired
            | VerificationError::CodeMismatch { .. } => StatusCode::BAD_REQUEST,
            VerificationError::AlreadySubscribed
            | VerificationError::NotSubscribed
            | VerificationError::IntentMismatch => StatusCode::CONFLICT,
            VerificationError::RateLimited { .. } | VerificationError::AttemptsExhausted => {
                StatusCode::TOO_MANY_REQUESTS
            }
            VerificationError::StoreIOError(_) | VerificationError::UnexpectedError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Store access holds an OS file lock: keep it off the async executor.
async fn run_blocking<T, F>(f: F) -> Result<T, VerificationError>
where
    F: FnOnce() -> Result<T, VerificationError> + Send + 'static,
    T: Send + 'static,
{
    spawn_blocking_with_tracing(f)
        .await
        .context("Failed to run a verification task")?
}

/// Runs one form action of `page`'s flow.
#[tracing::instrument(
    name = "Handle a verification form",
    skip(form, page, service),
    fields(action = ?form.action, intent = %page.intent)
)]
pub async fn handle_flow(
    form: FlowForm,
    page: &FlowPage,
    service: Arc<VerificationService>,
) -> FlowReply {
    let FlowForm {
        action,
        email,
        verification_code,
        ..
    } = form;
    let intent = page.intent;

    match action {
        FlowAction::SendCode => {
            let submitted = email.clone();
            let outcome = run_blocking(move || service.issue(&submitted, intent, Utc::now())).await;
            match outcome {
                Ok(issued) => {
                    let email = issued.email.as_ref().to_string();
                    FlowReply::success(
                        format!("✅ Code sent to {email}. Please enter it below."),
                        email,
                        true,
                    )
                }
                Err(e) => FlowReply::from_error(e, intent, email.trim().to_string()),
            }
        }
        FlowAction::VerifyCode => {
            let code = verification_code.unwrap_or_default();
            if code.trim().is_empty() {
                return FlowReply {
                    status_code: StatusCode::BAD_REQUEST,
                    status: FlowStatus::Error,
                    message: "❌ Please enter the 6-digit code.".to_string(),
                    show_code_input: true,
                    email,
                };
            }
            let submitted = email.clone();
            let outcome =
                run_blocking(move || service.verify(&submitted, &code, intent, Utc::now())).await;
            match outcome {
                Ok(confirmed) => {
                    let message = match confirmed.intent {
                        Intent::Subscribe => "✅ Email verified and subscribed!",
                        Intent::Unsubscribe => "✅ You've been unsubscribed successfully.",
                    };
                    FlowReply::success(message.to_string(), String::new(), false)
                }
                Err(e) => FlowReply::from_error(e, intent, email),
            }
        }
        FlowAction::RequestNewCode => {
            let submitted = email.clone();
            // Starting over must work even when the address on the hidden field is unusable.
            if let Err(e) = run_blocking(move || service.discard(&submitted, intent)).await {
                tracing::warn!(error.message = %e, "Failed to discard a pending code");
            }
            FlowReply {
                status_code: StatusCode::OK,
                status: FlowStatus::Warning,
                message: "🔄 Enter your email again to request a new code.".to_string(),
                show_code_input: false,
                email: email.trim().to_string(),
            }
        }
    }
}

/// Checks the form token before running the action. A forged or stale form gets a 403 and a
/// fresh token, and nothing is issued or verified.
pub async fn handle_guarded_flow(
    request: &HttpRequest,
    form: FlowForm,
    page: &FlowPage,
    service: Arc<VerificationService>,
) -> (FlowReply, CsrfToken) {
    match verify_csrf(request, &form.csrf_token) {
        Ok(token) => (handle_flow(form, page, service).await, token),
        Err(e) => {
            tracing::warn!(error.message = %e, intent = %page.intent, "Rejected a form post");
            let reply = FlowReply {
                status_code: StatusCode::FORBIDDEN,
                status: FlowStatus::Error,
                message: "❌ This form has expired. Please try again.".to_string(),
                show_code_input: false,
                email: form.email.trim().to_string(),
            };
            (reply, CsrfToken::generate())
        }
    }
}

/// Renders `reply` on `page` and hands `token` to the browser. `subscriber_count` is only shown
/// on the landing page.
pub fn render_flow(
    templates: &Tera,
    page: &FlowPage,
    reply: &FlowReply,
    token: &CsrfToken,
    subscriber_count: Option<usize>,
) -> Result<HttpResponse, actix_web::Error> {
    let mut context = Context::new();
    context.insert("heading", page.heading);
    context.insert("background", page.background);
    context.insert("action_path", page.action_path);
    context.insert("send_label", page.send_label);
    context.insert("verify_label", page.verify_label);
    context.insert("message", &reply.message);
    context.insert("status", reply.status.as_str());
    context.insert("show_code_input", &reply.show_code_input);
    context.insert("email", &reply.email);
    context.insert("csrf_token", token.as_ref());
    if let Some(count) = subscriber_count {
        context.insert("subscriber_count", &count);
    }

    let body = templates.render("flow.html", &context).map_err(e500)?;
    Ok(HttpResponse::build(reply.status_code)
        .content_type(ContentType::html())
        .cookie(token.cookie())
        .body(body))
}
