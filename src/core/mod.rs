pub mod backup;
pub mod booking;
pub mod feedback;
pub mod issuer;
pub mod lifecycle;
pub mod log;
pub mod notify;
pub mod window;
