pub mod appointment;
pub mod feedback;
pub mod participant;
pub mod presence_token;
pub mod status;
