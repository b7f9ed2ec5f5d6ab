pub mod callbacks;
pub mod init;
pub mod report;
pub mod validate;
