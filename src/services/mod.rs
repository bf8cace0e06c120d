pub mod attendance;
pub mod reporting;
pub mod seating;

pub use attendance::AttendanceService;
pub use reporting::{AssignmentRow, ReportingService, TableOverview};
pub use seating::SeatingAssignmentService;
