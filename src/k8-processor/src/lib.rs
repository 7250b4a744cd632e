mod config;
mod error;
mod loader;
mod profile;

pub use self::config::Named;
pub use self::config::ProcessorConfig;
pub use self::config::UnitConfig;
pub use self::error::ProcessorError;
pub use self::loader::find_profile;
pub use self::loader::lookup;
pub use self::loader::processor_config_for;
pub use self::loader::profiles_from_file;
pub use self::loader::profiles_from_reader;
pub use self::loader::PROFILE_FILENAMES;
pub use self::profile::Profile;
