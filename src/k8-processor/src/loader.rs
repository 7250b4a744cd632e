use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;

use crate::ProcessorConfig;
use crate::ProcessorError;
use crate::Profile;

/// Accepted profile file names inside a resource directory
pub const PROFILE_FILENAMES: &[&str] = &["profiles.yml", "profiles.yaml"];

/// Load a list of profiles from a YAML document
pub fn profiles_from_reader<R: Read>(reader: R) -> Result<Vec<Profile>, ProcessorError> {
    Ok(serde_yaml::from_reader(reader)?)
}

pub fn profiles_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<Profile>, ProcessorError> {
    debug!("reading profiles from {}", path.as_ref().display());
    let file = File::open(path.as_ref())?;
    profiles_from_reader(file)
}

// check for the profile file name variations
fn find_profile_file(dir: &Path) -> Option<PathBuf> {
    PROFILE_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

/// Look up a profile by name in a single directory. Several entries
/// with the same name are layered in their sort order, so the entry
/// with the highest order has the last word.
pub fn lookup(name: &str, dir: &Path) -> Result<Option<Profile>, ProcessorError> {
    let profile_file = match find_profile_file(dir) {
        Some(file) => file,
        None => return Ok(None),
    };

    let mut matching: Vec<Profile> = profiles_from_file(profile_file)?
        .into_iter()
        .filter(|profile| profile.name == name)
        .collect();
    matching.sort();

    merge_all(matching)
}

fn merge_all(profiles: Vec<Profile>) -> Result<Option<Profile>, ProcessorError> {
    let mut result: Option<Profile> = None;
    for profile in profiles {
        result = Some(match result {
            Some(base) => Profile::merge(&base, &profile)?,
            None => profile,
        });
    }
    Ok(result)
}

/// Layered profile lookup across several resource directories. The
/// found profiles are sorted before merging so the layering is
/// deterministic. An unknown profile name is a configuration error.
pub fn find_profile<P: AsRef<Path>>(name: &str, dirs: &[P]) -> Result<Profile, ProcessorError> {
    let mut found = Vec::new();
    for dir in dirs {
        if let Some(profile) = lookup(name, dir.as_ref())? {
            found.push(profile);
        }
    }
    found.sort();

    merge_all(found)?.ok_or_else(|| ProcessorError::MissingProfile(name.to_owned()))
}

/// Fetch the effective configuration of one processor category,
/// possibly via a profile. Without a profile name the configuration
/// is empty, a profile without this category contributes nothing.
pub fn processor_config_for<P: AsRef<Path>>(
    profile: Option<&str>,
    category: &str,
    dirs: &[P],
) -> Result<ProcessorConfig, ProcessorError> {
    match profile {
        Some(name) => {
            let profile = find_profile(name, dirs)?;
            Ok(profile.config(category).cloned().unwrap_or_default())
        }
        None => Ok(ProcessorConfig::default()),
    }
}
