mod csrf;
mod flow;
mod health_check;
mod subscribe;
mod unsubscribe;

pub use csrf::{verify_csrf, CsrfError, CsrfToken, CSRF_COOKIE};
pub use flow::{FlowAction, FlowStatus};
pub use health_check::*;
pub use subscribe::*;
pub use unsubscribe::*;
