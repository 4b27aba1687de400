use reseqr_core::{DirectoryGroup, ReseqrError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use walkdir::WalkDir;

/// List the files present in each immediate subdirectory of `batch_root`.
///
/// The reserved metadata subdirectory is skipped. A filename that already
/// carries `renaming_marker` aborts the whole batch: it means this batch
/// went through renaming before. Empty subdirectories yield an empty set.
pub fn scan_batch(
    batch_root: &Path,
    reserved_subdir: &str,
    renaming_marker: &str,
) -> Result<BTreeMap<String, DirectoryGroup>> {
    if !batch_root.is_dir() {
        return Err(ReseqrError::BatchNotFound(batch_root.to_path_buf()).into());
    }

    let mut groups = BTreeMap::new();
    for entry in WalkDir::new(batch_root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_dir() {
            continue;
        }
        // lossy so a non-UTF-8 name still surfaces in the comparison
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == reserved_subdir {
            continue;
        }

        let mut files = BTreeSet::new();
        for file in WalkDir::new(entry.path())
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !file.file_type().is_file() {
                continue;
            }
            let fname = file.file_name().to_string_lossy().into_owned();
            if fname.starts_with(renaming_marker) {
                return Err(ReseqrError::AlreadyRenamed {
                    group: name.clone(),
                    file: fname,
                }
                .into());
            }
            files.insert(fname);
        }

        groups.insert(
            name.clone(),
            DirectoryGroup { key: name, files },
        );
    }

    Ok(groups)
}
