pub mod attendance;
pub mod data;
pub mod leave_request;
pub mod office;
pub mod payroll;
