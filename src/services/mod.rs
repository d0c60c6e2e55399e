pub mod assignment_service;
pub mod attendance_service;
pub mod audit_service;
pub mod auth_service;
pub mod hospital_service;
pub mod qr_service;
pub mod roster_service;
pub mod shift_service;
pub mod user_service;
