//! Collapsed ("folded") stacks: one `frame;frame;frame count` per line, as
//! produced by the stackcollapse scripts.

use std::collections::HashMap;

use crate::error::InputError;
use crate::levels::ProfileNode;

pub const ROOT_LABEL: &str = "total";

/// Parses folded stack lines, summing counts of repeated stacks.
pub fn parse_collapsed(text: &str) -> Result<HashMap<String, u64>, InputError> {
    let mut stacks: HashMap<String, u64> = HashMap::new();

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((stack, count)) = line.rsplit_once(char::is_whitespace) else {
            log::debug!("line {}: no sample count, skipping", line_no + 1);
            continue;
        };
        let Ok(count) = count.parse::<u64>() else {
            log::debug!("line {}: bad sample count {count:?}, skipping", line_no + 1);
            continue;
        };
        let stack = stack.trim();
        if stack.is_empty() {
            continue;
        }
        let sum = stacks.entry(stack.to_string()).or_default();
        *sum = sum.checked_add(count).ok_or_else(|| InputError::CountOverflow {
            stack: stack.to_string(),
        })?;
    }

    if stacks.is_empty() {
        return Err(InputError::EmptyStacks);
    }
    Ok(stacks)
}

/// Builds a call tree under a synthetic root using the flow/merge walk:
/// stacks are visited in sorted order, frames shared with the previous stack
/// stay open, the rest are closed into their parent and new ones opened.
///
/// Fails when a count or the sum of counts does not fit a node value.
pub fn stacks_to_tree(stacks: &HashMap<String, u64>) -> Result<ProfileNode, InputError> {
    let mut sorted: Vec<_> = stacks.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let mut open: Vec<ProfileNode> = vec![ProfileNode::new(ROOT_LABEL)];
    let mut last_stack: Vec<&str> = Vec::new();

    for (stack_str, &count) in sorted {
        let this_stack: Vec<&str> = stack_str.split(';').collect();

        let len_same = last_stack
            .iter()
            .zip(this_stack.iter())
            .take_while(|(a, b)| a == b)
            .count();

        // Close frames no longer in path
        close_frames(&mut open, len_same + 1);

        // Open new frames
        for name in &this_stack[len_same..] {
            open.push(ProfileNode::new(*name));
        }

        let overflow = || InputError::CountOverflow {
            stack: stack_str.clone(),
        };
        let count = i64::try_from(count).map_err(|_| overflow())?;
        for node in open.iter_mut() {
            node.value = node.value.checked_add(count).ok_or_else(overflow)?;
        }
        if let Some(leaf) = open.last_mut() {
            leaf.self_value = leaf.self_value.checked_add(count).ok_or_else(overflow)?;
        }
        last_stack = this_stack;
    }

    close_frames(&mut open, 1);
    Ok(open.pop().unwrap_or_else(|| ProfileNode::new(ROOT_LABEL)))
}

fn close_frames(open: &mut Vec<ProfileNode>, keep: usize) {
    while open.len() > keep {
        if let Some(node) = open.pop() {
            if let Some(parent) = open.last_mut() {
                parent.children.push(node);
            }
        }
    }
}
