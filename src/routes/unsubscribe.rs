use crate::routes::csrf::CsrfToken;
use crate::routes::flow::{handle_guarded_flow, render_flow, FlowForm, FlowReply, UNSUBSCRIBE_PAGE};
use crate::verification::VerificationService;
use actix_web::{web, HttpRequest, HttpResponse};
use tera::Tera;

#[derive(serde::Deserialize)]
pub struct QueryParams {
    email: Option<String>,
}

/// Digest emails link here with the recipient's address already in the query string.
pub async fn unsubscribe_form(
    request: HttpRequest,
    query: web::Query<QueryParams>,
    templates: web::Data<Tera>,
) -> Result<HttpResponse, actix_web::Error> {
    let email = query.0.email.unwrap_or_default();
    render_flow(
        &templates,
        &UNSUBSCRIBE_PAGE,
        &FlowReply::blank(email.trim().to_string()),
        &CsrfToken::from_request_or_generate(&request),
        None,
    )
}

pub async fn unsubscribe(
    request: HttpRequest,
    form: web::Form<FlowForm>,
    service: web::Data<VerificationService>,
    templates: web::Data<Tera>,
) -> Result<HttpResponse, actix_web::Error> {
    let (reply, token) =
        handle_guarded_flow(&request, form.0, &UNSUBSCRIBE_PAGE, service.into_inner()).await;
    render_flow(&templates, &UNSUBSCRIBE_PAGE, &reply, &token, None)
}
