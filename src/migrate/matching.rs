//! Identity rules deciding whether something already exists on the target.

use crate::github::{Release, ReleaseAsset};

/// A target release stands in for a source release when tag, display name
/// and target commitish all agree. A missing name counts as empty.
pub fn is_equivalent(target: &Release, source: &Release) -> bool {
    target.tag_name == source.tag_name
        && target.name.as_deref().unwrap_or_default() == source.name.as_deref().unwrap_or_default()
        && target.target_commitish == source.target_commitish
}

/// An asset counts as transferred when the release already carries one with
/// the same name and byte size. Content is not compared.
pub fn asset_exists(release: &Release, asset: &ReleaseAsset) -> bool {
    release
        .assets
        .iter()
        .any(|existing| existing.name == asset.name && existing.size == asset.size)
}
