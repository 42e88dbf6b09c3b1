pub mod init;
pub mod quote;
pub mod send;
