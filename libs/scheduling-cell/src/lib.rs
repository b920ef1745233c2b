// Scheduling Cell - calendar rules, availability, booking and lifecycle
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{
    Appointment, AppointmentSearchQuery, BookAppointmentRequest, Doctor, DoctorSearchQuery,
    FreeSlotsQuery, FreeSlotsResponse, NotificationChannel, NotificationKind, NotifyRequest,
    SchedulingError, Specialty, UpdateStatusRequest,
};
pub use router::scheduling_routes;
pub use services::gateway::SchedulingGateway;
