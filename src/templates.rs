use crate::domain::{Intent, SubscriberEmail, VerificationCode};
use crate::notifier::EmailMessage;
use tera::{Context, Tera};

/// Templates are compiled into the binaries so the web server and the broadcast job do not depend
/// on the working directory they are launched from. Names ending in `.html` are auto-escaped.
pub fn build_templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("flow.html", include_str!("../templates/flow.html")),
        (
            "verification_email.html",
            include_str!("../templates/verification_email.html"),
        ),
        (
            "verification_email.txt",
            include_str!("../templates/verification_email.txt"),
        ),
        ("digest_email.html", include_str!("../templates/digest_email.html")),
        ("digest_email.txt", include_str!("../templates/digest_email.txt")),
    ])?;
    Ok(tera)
}

/// The email carrying a freshly issued code.
pub fn verification_email(
    templates: &Tera,
    recipient: &SubscriberEmail,
    code: &VerificationCode,
    intent: Intent,
) -> Result<EmailMessage, tera::Error> {
    let (subject, heading, introduction, code_label, ignore_notice, accent) = match intent {
        Intent::Subscribe => (
            "Your GitHub Updates Verification Code",
            "GitHub Updates Verification",
            "Thank you for subscribing to GitHub timeline updates! Please use the verification code below to complete your subscription:",
            "verification code",
            "If you didn't request this, please ignore this email.",
            "#0a74da",
        ),
        Intent::Unsubscribe => (
            "Confirm Unsubscription - GitHub Updates",
            "Confirm Unsubscription",
            "We received a request to unsubscribe your email from GitHub timeline updates. To confirm this action, please use the code below:",
            "unsubscribe code",
            "If you didn't request this, please ignore this email and your subscription will remain active.",
            "#dc3545",
        ),
    };

    let mut context = Context::new();
    context.insert("heading", heading);
    context.insert("introduction", introduction);
    context.insert("code", code.as_ref());
    context.insert("code_label", code_label);
    context.insert("code_label_upper", &code_label.to_uppercase());
    context.insert("ignore_notice", ignore_notice);
    context.insert("accent", accent);

    Ok(EmailMessage {
        recipient: recipient.clone(),
        subject: subject.to_string(),
        html_body: templates.render("verification_email.html", &context)?,
        text_body: templates.render("verification_email.txt", &context)?,
    })
}
