mod intent;
mod pending_verification;
mod subscriber_email;
mod subscriber_list;
mod verification_code;

pub use intent::Intent;
pub use pending_verification::{
    PendingVerification, PendingVerifications, CODE_TTL_SECONDS, RESEND_COOLDOWN_SECONDS,
};
pub use subscriber_email::SubscriberEmail;
pub use subscriber_list::SubscriberList;
pub use verification_code::VerificationCode;
