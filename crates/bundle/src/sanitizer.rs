//! Entry-path sanitizers applied while reading a module out of a bundle,
//! before any preprocessor sees its entries.

use aabforge_core::ZipPath;

/// Some bundles carry a known-buggy dex naming where the first dex file
/// is `classes1.dex` instead of `classes.dex`. Only those modules need
/// the rename in [`sanitize_dex_path`]: a module already named the
/// normal way (`classes.dex`, `classes2.dex`, ... with no
/// `classes1.dex`) must be left untouched, or renaming `classes2.dex`
/// to `classes3.dex` opens a gap and produces an invalid APK.
pub fn module_needs_dex_rename<'a>(paths: impl IntoIterator<Item = &'a ZipPath>) -> bool {
    paths.into_iter().any(|p| p.to_string() == "dex/classes1.dex")
}

/// Shifts every numbered dex file up by one slot so a module whose dex
/// set starts at `classes1.dex` gets the naming device-installable
/// APKs expect: `classesN.dex` becomes `classes{N+1}.dex`, and an
/// unnumbered `classes.dex` (none present in the buggy naming) is left
/// alone. Only call this for modules where [`module_needs_dex_rename`]
/// is true — applying it to an already-correctly-numbered module opens
/// a gap in the sequence.
pub fn sanitize_dex_path(path: &ZipPath) -> ZipPath {
    let Some(name) = path.file_name() else {
        return path.clone();
    };
    match renamed_dex_name(name) {
        Some(renamed) => path
            .resolve_sibling(&renamed)
            .expect("renamed dex name is a valid single component"),
        None => path.clone(),
    }
}

fn renamed_dex_name(name: &str) -> Option<String> {
    let stripped = name.strip_prefix("classes")?.strip_suffix(".dex")?;
    if stripped.is_empty() {
        return None;
    }
    let n: u32 = stripped.parse().ok()?;
    Some(format!("classes{}.dex", n + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_dex_is_left_alone() {
        let path = ZipPath::parse("dex/classes.dex").unwrap();
        assert_eq!(sanitize_dex_path(&path).to_string(), "dex/classes.dex");
    }

    #[test]
    fn numbered_dex_files_are_shifted_by_one() {
        let path = ZipPath::parse("dex/classes2.dex").unwrap();
        assert_eq!(sanitize_dex_path(&path).to_string(), "dex/classes3.dex");

        let path = ZipPath::parse("dex/classes9.dex").unwrap();
        assert_eq!(sanitize_dex_path(&path).to_string(), "dex/classes10.dex");
    }

    #[test]
    fn non_dex_paths_are_unaffected() {
        let path = ZipPath::parse("res/drawable/icon.png").unwrap();
        assert_eq!(sanitize_dex_path(&path).to_string(), "res/drawable/icon.png");
    }

    #[test]
    fn needs_rename_only_when_classes1_dex_present() {
        let buggy = vec![ZipPath::parse("dex/classes1.dex").unwrap(), ZipPath::parse("dex/classes2.dex").unwrap()];
        assert!(module_needs_dex_rename(&buggy));

        let normal = vec![ZipPath::parse("dex/classes.dex").unwrap(), ZipPath::parse("dex/classes2.dex").unwrap()];
        assert!(!module_needs_dex_rename(&normal));
    }
}
