//! CLI command implementations

pub mod check;
pub mod init;
pub mod profiles;
pub mod sandbox;
pub mod show;

pub use check::check_command;
pub use init::init_command;
pub use profiles::profiles_command;
pub use sandbox::sandbox_command;
pub use show::show_command;
