pub mod attendance;
pub mod leave;
pub mod office;
pub mod payroll;
pub mod role;
pub mod user;
