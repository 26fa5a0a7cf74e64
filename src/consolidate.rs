//! Consolidation of parent, child and header frames into one view per group
//!
//! Every join is a polars left join on a relationship index. A parent row
//! matching N child rows becomes N rows, and successive children multiply:
//! two C170 and three C190 rows under one C100 yield six consolidated rows.
//! Callers that need one row per document should aggregate children before
//! joining.

use crate::error::Result;
use crate::frame::{FrameSet, Placement, drop_columns, has_column, ordered_left_join};
use crate::schema::{ConsolidationGroup, GroupRegistry};
use polars::prelude::DataFrame;
use tracing::debug;

/// Join `children` onto `parent` in order, keyed on `parent_index`.
/// Each child is given with the record code used to prefix its columns.
pub fn consolidate(
    parent: &DataFrame,
    children: &[(&str, &DataFrame)],
    parent_index: &str,
) -> Result<DataFrame> {
    let mut result = parent.clone();
    for (code, child) in children {
        if child.height() == 0 {
            debug!("Skipping {}: no rows", code);
            continue;
        }
        if !has_column(child, parent_index) {
            debug!("Skipping {}: no {} column", code, parent_index);
            continue;
        }
        if !has_column(&result, parent_index) {
            debug!("Skipping {}: parent has no {} column", code, parent_index);
            continue;
        }
        result = ordered_left_join(&result, child, parent_index, code, Placement::Append)?;
    }
    Ok(result)
}

/// Join the columns of the `header_code` frame in front of `df`, keyed on
/// `header_index`
pub fn attach_header(
    df: &DataFrame,
    header_code: &str,
    header: &DataFrame,
    header_index: &str,
) -> Result<DataFrame> {
    if header.height() == 0 {
        debug!("Skipping header {}: no rows", header_code);
        return Ok(df.clone());
    }
    if !has_column(header, header_index) || !has_column(df, header_index) {
        debug!("Skipping header {}: no {} column", header_code, header_index);
        return Ok(df.clone());
    }
    ordered_left_join(df, header, header_index, header_code, Placement::Prepend)
}

/// Build the consolidated frame of one group from a pass's raw frames
pub fn consolidate_group(group: &ConsolidationGroup, frames: &FrameSet) -> Result<DataFrame> {
    let parent = match frames.get(&group.parent) {
        Some(parent) if parent.height() > 0 => parent,
        _ => {
            debug!("Group {}: no {} rows", group.name, group.parent);
            return Ok(DataFrame::empty());
        }
    };

    let children: Vec<(&str, &DataFrame)> = group
        .children
        .iter()
        .filter_map(|code| match frames.get(code) {
            Some(child) => Some((code.as_str(), child)),
            None => {
                debug!("Group {}: no {} table", group.name, code);
                None
            }
        })
        .collect();

    let mut result = consolidate(parent, &children, &group.parent_index)?;

    if group.has_distinct_header() {
        match frames.get(&group.header) {
            Some(header) => {
                result = attach_header(&result, &group.header, header, &group.header_index)?
            }
            None => debug!("Group {}: no {} table", group.name, group.header),
        }
    }

    let index_columns = [group.parent_index.as_str(), group.header_index.as_str()];
    let result = drop_columns(&result, &index_columns)?;
    debug!(
        "Group {}: {} rows, {} columns",
        group.name,
        result.height(),
        result.width()
    );
    Ok(result)
}

/// Consolidate every group, keyed by group name
pub fn consolidate_all(groups: &GroupRegistry, frames: &FrameSet) -> Result<FrameSet> {
    groups
        .iter()
        .map(|group| Ok((group.name.clone(), consolidate_group(group, frames)?)))
        .collect()
}
