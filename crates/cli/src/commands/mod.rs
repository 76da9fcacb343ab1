pub mod context;
pub mod import;
pub mod log;
pub mod onboard;
pub mod personas;
pub mod simulate;
pub mod status;
pub mod workspace;
