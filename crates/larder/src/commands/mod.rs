pub mod analyze;
pub mod feedback;
pub mod init;
pub mod resolve;
pub mod status;
pub mod version;
