use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::collapsed::{parse_collapsed, stacks_to_tree};
use crate::error::InputError;
use crate::levels::{Flamebearer, Levels, NestedSetRow, ProfileNode, flatten, from_flamebearer, from_nested_set};
use crate::units::SampleUnit;

/// A flattened profile and the identifier of what its samples count.
#[derive(Debug, Clone)]
pub struct Profile {
    pub levels: Levels,
    pub profile_type_id: Option<String>,
}

impl Profile {
    pub fn unit(&self) -> Option<SampleUnit> {
        self.profile_type_id
            .as_deref()
            .and_then(SampleUnit::from_profile_type_id)
    }
}

#[derive(Debug, Deserialize)]
struct ProfileDocument {
    #[serde(default)]
    profile_type_id: Option<String>,
    tree: Option<ProfileNode>,
    rows: Option<Vec<NestedSetRow>>,
    flamebearer: Option<Flamebearer>,
}

/// Parses a JSON profile document, or collapsed stacks for anything that
/// does not look like JSON.
pub fn parse_profile(text: &str) -> Result<Profile, InputError> {
    if !text.trim_start().starts_with('{') {
        let stacks = parse_collapsed(text)?;
        let levels = flatten(&stacks_to_tree(&stacks)?)?;
        return Ok(Profile {
            levels,
            profile_type_id: None,
        });
    }

    let doc: ProfileDocument = serde_json::from_str(text)?;
    let levels = match (doc.tree, doc.rows, doc.flamebearer) {
        (Some(tree), None, None) => flatten(&tree)?,
        (None, Some(rows), None) => from_nested_set(&rows)?,
        (None, None, Some(fb)) => from_flamebearer(&fb)?,
        _ => return Err(InputError::AmbiguousDocument),
    };
    Ok(Profile {
        levels,
        profile_type_id: doc.profile_type_id,
    })
}

pub fn load_profile(path: &Path) -> Result<Profile, InputError> {
    let text = fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let profile = parse_profile(&text)?;
    log::info!(
        "loaded {}: {} levels, {} samples",
        path.display(),
        profile.levels.len(),
        profile.levels.total()
    );
    Ok(profile)
}
