use askama::Template;

#[derive(Template)]
#[template(path = "admin_user_registration.html")]
pub struct AdminUserRegistration<'a> {
    pub audience_label: &'a str,
    pub link: &'a str,
    pub real_name: &'a str,
    pub student_id: &'a str,
    pub user_email: &'a str,
    pub phone: &'a str,
    pub timestamp: &'a str,
}

#[derive(Template)]
#[template(path = "admin_new_booking.html")]
pub struct AdminNewBooking<'a> {
    pub audience_label: &'a str,
    pub link: &'a str,
    pub real_name: &'a str,
    pub user_email: &'a str,
    pub booking_date: &'a str,
    pub booking_time: &'a str,
    pub booking_type: &'a str,
    pub booking_name: &'a str,
    pub booking_notes: Option<&'a str>,
    pub timestamp: &'a str,
}

#[derive(Template)]
#[template(path = "user_approval_result.html")]
pub struct UserApprovalResult<'a> {
    pub audience_label: &'a str,
    pub link: &'a str,
    pub real_name: &'a str,
    pub student_id: &'a str,
    pub approved: bool,
    pub admin_notes: Option<&'a str>,
    pub timestamp: &'a str,
}

#[derive(Template)]
#[template(path = "user_booking_confirmation.html")]
pub struct UserBookingConfirmation<'a> {
    pub audience_label: &'a str,
    pub link: &'a str,
    pub real_name: &'a str,
    pub booking_date: &'a str,
    pub booking_time: &'a str,
    pub booking_type: &'a str,
    pub booking_name: &'a str,
    pub booking_notes: Option<&'a str>,
    pub booking_id: &'a str,
    pub timestamp: &'a str,
}

#[derive(Template)]
#[template(path = "self_test.html")]
pub struct SelfTest<'a> {
    pub service_name: &'a str,
    pub sent_at: &'a str,
}
