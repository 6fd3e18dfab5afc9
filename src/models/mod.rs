pub mod notification;

pub use notification::{
    ApprovalStatus,
    Audience,
    NotificationKind,
    NotificationRequest,
    RenderedEmail,
    SendEmailRequest,
    SendEmailResponse,
    TemplateFields,
};
