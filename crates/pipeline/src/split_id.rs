//! Split id generation.

/// For a master split: `module_name_for_split_id`. For a non-master
/// split: `module_name_for_split_id.config.suffix`. The base module's
/// name-for-split-id is the empty string.
pub fn split_id(module_name: &str, is_master: bool, suffix: &str) -> String {
    let name_for_split_id = if module_name == "base" { "" } else { module_name };
    if is_master {
        name_for_split_id.to_string()
    } else if name_for_split_id.is_empty() {
        format!("config.{suffix}")
    } else {
        format!("{name_for_split_id}.config.{suffix}")
    }
}
