// Report Cell - visit reports attached to appointments
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{
    AppointmentSnapshot, DeleteReportRequest, ReportDocument, ReportError, ReportSearchQuery,
    UpdateNoteRequest, UploadReportRequest,
};
pub use router::report_routes;
pub use services::report::ReportService;
