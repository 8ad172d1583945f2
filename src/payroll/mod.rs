pub mod allowance;
pub mod calculator;
pub mod hours;
pub mod locks;
pub mod payslip;
pub mod service;
