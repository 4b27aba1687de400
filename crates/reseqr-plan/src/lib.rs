use reseqr_core::{MetadataGroup, RenameOp};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Ordered sequence of rename operations over one batch. Pure data; script
/// emission and actual renaming are external consumers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenamePlan {
    pub ops: Vec<RenameOp>,
}

impl RenamePlan {
    /// The exact inverse plan: same entries, source and destination
    /// swapped, same order.
    pub fn inverse(&self) -> RenamePlan {
        RenamePlan {
            ops: self
                .ops
                .iter()
                .map(|op| RenameOp {
                    source: op.destination.clone(),
                    destination: op.source.clone(),
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Compute the forward rename mapping for every metadata group.
///
/// Groups are visited sorted by key, entries in their native document
/// order, so the plan is deterministic. The destination is fully determined
/// by the entry's ORDER, zero-padded to the digit width of that entry's own
/// sequence number. Paths are relative to the batch root.
pub fn build_plan(
    mets: &BTreeMap<String, MetadataGroup>,
    local_renaming_prefix: &str,
    extension: &str,
) -> RenamePlan {
    let mut ops = Vec::new();
    for (key, group) in mets {
        for item in &group.items {
            let padded = format!("{:0width$}", item.order, width = item.seq.len());
            let dest = format!("{local_renaming_prefix}{key}_{padded}{extension}");
            ops.push(RenameOp {
                source: PathBuf::from(key).join(&item.filename),
                destination: PathBuf::from(key).join(dest),
            });
        }
    }
    RenamePlan { ops }
}
