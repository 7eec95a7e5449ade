pub mod compare;
pub mod evaluate;
pub mod init;
pub mod triage;
pub mod validate;
