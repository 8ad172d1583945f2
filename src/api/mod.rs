pub mod attendance;
pub mod payroll;
