//! Collect enabled schedule records from a content tree.

use tracing::trace;

use crate::content::ContentNode;
use crate::rules::{RuleSet, ScheduleRecord};

/// Collect every enabled schedule from `blocks`, depth-first in document
/// order: a block's own schedules come before those of its inner blocks.
///
/// Disabled control sets and disabled schedules are skipped. Identical
/// schedules on different blocks are all kept.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use visibility_engine::content::ContentNode;
/// use visibility_engine::extract::extract_schedules;
///
/// let block = ContentNode::new("core/group").with_attrs(json!({
///     "blockVisibility": { "controlSets": [ {
///         "enable": true,
///         "controls": { "dateTime": { "schedules": [ { "enable": true, "start": "2025-12-01" } ] } }
///     } ] }
/// }));
/// assert_eq!(extract_schedules(&[block]).len(), 1);
/// ```
pub fn extract_schedules(blocks: &[ContentNode]) -> Vec<ScheduleRecord> {
    let mut schedules = Vec::new();
    for block in blocks {
        collect(block, &mut schedules);
    }
    schedules
}

fn collect(block: &ContentNode, out: &mut Vec<ScheduleRecord>) {
    if let Some(rules) = RuleSet::from_attrs(&block.attrs) {
        for control_set in rules.control_sets {
            if !control_set.enabled {
                trace!(block = ?block.name, "skipping disabled control set");
                continue;
            }
            out.extend(control_set.schedules.into_iter().filter(|s| s.enabled));
        }
    }

    for child in &block.children {
        collect(child, out);
    }
}
