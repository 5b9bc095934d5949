use crate::routes::csrf::CsrfToken;
use crate::routes::flow::{handle_guarded_flow, render_flow, FlowForm, FlowReply, SUBSCRIBE_PAGE};
use crate::subscriptions::SubscriptionStore;
use crate::telemetry::spawn_blocking_with_tracing;
use crate::utils::e500;
use crate::verification::VerificationService;
use actix_web::{web, HttpRequest, HttpResponse};
use tera::Tera;

#[tracing::instrument(name = "Render the subscribe page", skip(request, templates, subscriptions))]
pub async fn subscribe_form(
    request: HttpRequest,
    templates: web::Data<Tera>,
    subscriptions: web::Data<SubscriptionStore>,
) -> Result<HttpResponse, actix_web::Error> {
    let subscriptions = SubscriptionStore::clone(&subscriptions);
    let count = spawn_blocking_with_tracing(move || subscriptions.count())
        .await
        .map_err(e500)?
        .map_err(e500)?;

    render_flow(
        &templates,
        &SUBSCRIBE_PAGE,
        &FlowReply::blank(String::new()),
        &CsrfToken::from_request_or_generate(&request),
        Some(count),
    )
}

pub async fn subscribe(
    request: HttpRequest,
    form: web::Form<FlowForm>,
    service: web::Data<VerificationService>,
    templates: web::Data<Tera>,
) -> Result<HttpResponse, actix_web::Error> {
    let (reply, token) =
        handle_guarded_flow(&request, form.0, &SUBSCRIBE_PAGE, service.into_inner()).await;
    render_flow(&templates, &SUBSCRIBE_PAGE, &reply, &token, None)
}
