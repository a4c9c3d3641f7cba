pub mod account;
pub mod grading;
pub mod review;
pub mod student;
