pub mod backup;
pub mod book;
pub mod cancel;
pub mod config;
pub mod current;
pub mod db;
pub mod decide;
pub mod end;
pub mod export;
pub mod feedback;
pub mod init;
pub mod list;
pub mod log;
pub mod show;
pub mod start;
pub mod sweep;
pub mod token;
