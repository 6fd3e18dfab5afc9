//! Notification mail rendering.
//!
//! Every supported (audience, kind) pair maps to one render function in
//! [`CATALOG`]. Bodies are askama templates, so interpolated values are HTML
//! escaped. Subjects are plain text and left as-is.

mod templates;

use askama::Template;
use chrono::{DateTime, Utc};

use crate::config::Links;
use crate::error::{AppError, Result};
use crate::models::{ApprovalStatus, Audience, NotificationKind, RenderedEmail, TemplateFields};

use templates::{
    AdminNewBooking, AdminUserRegistration, SelfTest, UserApprovalResult, UserBookingConfirmation,
};

type RenderFn = fn(&Links, &TemplateFields) -> Result<RenderedEmail>;

static CATALOG: [(Audience, NotificationKind, RenderFn); 4] = [
    (Audience::Admin, NotificationKind::UserRegistration, admin_user_registration),
    (Audience::Admin, NotificationKind::NewBooking, admin_new_booking),
    (Audience::User, NotificationKind::ApprovalResult, user_approval_result),
    (Audience::User, NotificationKind::BookingConfirmation, user_booking_confirmation),
];

fn audience_label(audience: Audience) -> &'static str {
    match audience {
        Audience::Admin => "管理員通知",
        Audience::User => "用戶通知",
    }
}

/// Renders notification mails with the configured outbound links
#[derive(Debug, Clone)]
pub struct Renderer {
    links: Links,
    service_name: String,
}

impl Renderer {
    pub fn new(links: Links, service_name: impl Into<String>) -> Self {
        Self {
            links,
            service_name: service_name.into(),
        }
    }

    /// All (audience, kind) pairs that have a template.
    pub fn supported() -> impl Iterator<Item = (Audience, NotificationKind)> {
        CATALOG.iter().map(|(audience, kind, _)| (*audience, *kind))
    }

    pub fn render(
        &self,
        audience: Audience,
        kind: NotificationKind,
        fields: &TemplateFields,
    ) -> Result<RenderedEmail> {
        let render_fn = CATALOG
            .iter()
            .find(|(a, k, _)| *a == audience && *k == kind)
            .map(|(_, _, render_fn)| *render_fn)
            .ok_or_else(|| {
                AppError::Template(format!(
                    "no template for {} notifications of type {}",
                    audience, kind
                ))
            })?;

        render_fn(&self.links, fields)
    }

    /// Mail sent once after the provider first answers, to prove delivery works.
    pub fn render_self_test(&self, sent_at: DateTime<Utc>) -> Result<RenderedEmail> {
        let sent_at = sent_at.format("%Y-%m-%d %H:%M:%S UTC").to_string();
        let body_html = SelfTest {
            service_name: &self.service_name,
            sent_at: &sent_at,
        }
        .render()?;

        Ok(RenderedEmail {
            subject: format!("📧 {}測試", self.service_name),
            body_html,
        })
    }
}

fn admin_user_registration(links: &Links, fields: &TemplateFields) -> Result<RenderedEmail> {
    let real_name = fields.require("real_name")?;
    let student_id = fields.require("student_id")?;
    let user_email = fields.require("user_email")?;
    let phone = fields.require("phone")?;
    let timestamp = fields.require("timestamp")?;

    let body_html = AdminUserRegistration {
        audience_label: audience_label(Audience::Admin),
        link: &links.admin_url,
        real_name: &real_name,
        student_id: &student_id,
        user_email: &user_email,
        phone: &phone,
        timestamp: &timestamp,
    }
    .render()?;

    Ok(RenderedEmail {
        subject: format!("【新用戶註冊】{} 已完成註冊", real_name),
        body_html,
    })
}

fn admin_new_booking(links: &Links, fields: &TemplateFields) -> Result<RenderedEmail> {
    let real_name = fields.require("real_name")?;
    let user_email = fields.require("user_email")?;
    let booking_date = fields.require("booking_date")?;
    let booking_time = fields.require("booking_time")?;
    let booking_type = fields.require("booking_type")?;
    let booking_name = fields.require("booking_name")?;
    let booking_notes = fields.note("booking_notes")?;
    let timestamp = fields.require("timestamp")?;

    let body_html = AdminNewBooking {
        audience_label: audience_label(Audience::Admin),
        link: &links.admin_url,
        real_name: &real_name,
        user_email: &user_email,
        booking_date: &booking_date,
        booking_time: &booking_time,
        booking_type: &booking_type,
        booking_name: &booking_name,
        booking_notes: booking_notes.as_deref(),
        timestamp: &timestamp,
    }
    .render()?;

    Ok(RenderedEmail {
        subject: format!("【新預約通知】{} 預約了練團室", real_name),
        body_html,
    })
}

fn user_approval_result(links: &Links, fields: &TemplateFields) -> Result<RenderedEmail> {
    let real_name = fields.require("real_name")?;
    let student_id = fields.require("student_id")?;
    let status: ApprovalStatus = fields.require("approval_status")?.parse()?;
    let timestamp = fields.require("timestamp")?;

    // Rejection reasons only make sense on a rejection.
    let admin_notes = match status {
        ApprovalStatus::Rejected => fields.get("admin_notes")?,
        ApprovalStatus::Approved => None,
    };

    let body_html = UserApprovalResult {
        audience_label: audience_label(Audience::User),
        link: &links.website_url,
        real_name: &real_name,
        student_id: &student_id,
        approved: status == ApprovalStatus::Approved,
        admin_notes: admin_notes.as_deref(),
        timestamp: &timestamp,
    }
    .render()?;

    Ok(RenderedEmail {
        subject: format!("【帳號審核通知】{} - 北商熱音社", real_name),
        body_html,
    })
}

fn user_booking_confirmation(links: &Links, fields: &TemplateFields) -> Result<RenderedEmail> {
    let real_name = fields.require("real_name")?;
    let booking_date = fields.require("booking_date")?;
    let booking_time = fields.require("booking_time")?;
    let booking_type = fields.require("booking_type")?;
    let booking_name = fields.require("booking_name")?;
    let booking_notes = fields.note("booking_notes")?;
    let booking_id = fields.require("booking_id")?;
    let timestamp = fields.require("timestamp")?;

    let body_html = UserBookingConfirmation {
        audience_label: audience_label(Audience::User),
        link: &links.website_url,
        real_name: &real_name,
        booking_date: &booking_date,
        booking_time: &booking_time,
        booking_type: &booking_type,
        booking_name: &booking_name,
        booking_notes: booking_notes.as_deref(),
        booking_id: &booking_id,
        timestamp: &timestamp,
    }
    .render()?;

    Ok(RenderedEmail {
        subject: format!(
            "【預約成功】{} {} - {}",
            booking_date, booking_time, booking_name
        ),
        body_html,
    })
}
