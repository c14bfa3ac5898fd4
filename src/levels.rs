//! Flattening of a sampled call tree into per-depth levels.
//!
//! Every frame lands in `levels[depth]` with a cumulative `start` offset in
//! tick units, so that the pixel position of a bar is a pure function of
//! `start / total`. Three encodings of the same tree are accepted: an owned
//! tree of [`ProfileNode`]s, depth-first nested-set rows and the
//! flamebearer per-level arrays.

use serde::Deserialize;

use crate::error::FlattenError;

/// One call-stack frame placed on its level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub label: String,
    pub self_value: u64,
    pub value: u64,
    pub start: u64,
    pub depth: usize,
}

impl Frame {
    pub fn end(&self) -> u64 {
        self.start + self.value
    }
}

pub type Level = Vec<Frame>;

/// The flattened profile. Built once per input and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Levels {
    levels: Vec<Level>,
    total: u64,
}

impl Levels {
    /// Total sample count, the value of the root frame.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level(&self, index: usize) -> Option<&[Frame]> {
        self.levels.get(index).map(Vec::as_slice)
    }

    pub fn frame(&self, level_index: usize, bar_index: usize) -> Option<&Frame> {
        self.levels.get(level_index)?.get(bar_index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &[Frame]> {
        self.levels.iter().map(Vec::as_slice)
    }

    /// Every frame of every level, level by level.
    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.levels.iter().flatten()
    }

    fn from_levels(levels: Vec<Level>) -> Self {
        let total = levels
            .first()
            .and_then(|root| root.first())
            .map_or(0, |root| root.value);
        Levels { levels, total }
    }

    fn push(levels: &mut Vec<Level>, frame: Frame) {
        if levels.len() <= frame.depth {
            levels.resize_with(frame.depth + 1, Vec::new);
        }
        levels[frame.depth].push(frame);
    }
}

/// An owned call tree node, as found in `tree` profile documents.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ProfileNode {
    pub label: String,
    #[serde(rename = "self", default)]
    pub self_value: i64,
    pub value: i64,
    #[serde(default)]
    pub children: Vec<ProfileNode>,
}

impl ProfileNode {
    pub fn new(label: impl Into<String>) -> Self {
        ProfileNode {
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn with_children(
        label: impl Into<String>,
        self_value: i64,
        value: i64,
        children: Vec<ProfileNode>,
    ) -> Self {
        ProfileNode {
            label: label.into(),
            self_value,
            value,
            children,
        }
    }

    pub fn leaf(label: impl Into<String>, value: i64) -> Self {
        Self::with_children(label, value, value, Vec::new())
    }
}

/// One row of a depth-first nested-set data frame.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NestedSetRow {
    pub level: usize,
    pub label: String,
    #[serde(rename = "self", default)]
    pub self_value: i64,
    pub value: i64,
}

/// Flamebearer encoding: per level, 4-tuples of
/// `[offset_delta, total, self, name_index]`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Flamebearer {
    pub names: Vec<String>,
    pub levels: Vec<Vec<i64>>,
}

const STEP_OFFSET: usize = 4;

fn counts(label: &str, self_value: i64, value: i64) -> Result<(u64, u64), FlattenError> {
    for count in [self_value, value] {
        if count < 0 {
            return Err(FlattenError::NegativeCount {
                label: label.to_string(),
                count,
            });
        }
    }
    let (self_value, value) = (self_value as u64, value as u64);
    if self_value > value {
        return Err(FlattenError::SelfExceedsValue {
            label: label.to_string(),
            self_value,
            value,
        });
    }
    Ok((self_value, value))
}

/// Flattens an owned call tree.
///
/// A child starts where its parent starts plus the values of the siblings
/// before it. The walk is iterative so arbitrarily deep stacks are fine.
pub fn flatten(root: &ProfileNode) -> Result<Levels, FlattenError> {
    let (self_value, value) = counts(&root.label, root.self_value, root.value)?;
    let mut levels: Vec<Level> = Vec::new();
    let mut stack = vec![(root, 0usize, 0u64, self_value, value)];

    while let Some((node, depth, start, self_value, value)) = stack.pop() {
        let mut children = Vec::with_capacity(node.children.len());
        let mut child_start = start;
        for child in &node.children {
            let (child_self, child_value) = counts(&child.label, child.self_value, child.value)?;
            children.push((child, depth + 1, child_start, child_self, child_value));
            child_start = child_start.saturating_add(child_value);
        }
        if child_start - start > value {
            return Err(FlattenError::ChildrenExceedParent {
                label: node.label.clone(),
                children: child_start - start,
                value,
            });
        }

        Levels::push(
            &mut levels,
            Frame {
                label: node.label.clone(),
                self_value,
                value,
                start,
                depth,
            },
        );
        // Reversed so the leftmost child is visited first.
        stack.extend(children.into_iter().rev());
    }

    Ok(Levels::from_levels(levels))
}

struct OpenFrame {
    depth: usize,
    index: usize,
    end: u64,
    next_start: u64,
}

/// Flattens depth-first nested-set rows, reconstructing parents with a stack.
pub fn from_nested_set(rows: &[NestedSetRow]) -> Result<Levels, FlattenError> {
    let mut levels: Vec<Level> = Vec::new();
    let mut open: Vec<OpenFrame> = Vec::new();
    let mut prev_level = 0;

    for (row_index, row) in rows.iter().enumerate() {
        let (self_value, value) = counts(&row.label, row.self_value, row.value)?;
        if row_index == 0 && row.level != 0 {
            return Err(FlattenError::MissingRoot(row.level));
        }
        if row_index > 0 && row.level == 0 {
            return Err(FlattenError::MultipleRoots(row_index));
        }
        if row.level > prev_level + 1 {
            return Err(FlattenError::LevelJump {
                row: row_index,
                from: prev_level,
                to: row.level,
            });
        }
        open.truncate(row.level);

        let start = match open.last_mut() {
            Some(parent) => {
                let start = parent.next_start;
                parent.next_start = start.saturating_add(value);
                if parent.next_start > parent.end {
                    let parent_frame = &levels[parent.depth][parent.index];
                    return Err(FlattenError::ChildrenExceedParent {
                        label: parent_frame.label.clone(),
                        children: parent.next_start - parent_frame.start,
                        value: parent_frame.value,
                    });
                }
                start
            }
            None => 0,
        };

        Levels::push(
            &mut levels,
            Frame {
                label: row.label.clone(),
                self_value,
                value,
                start,
                depth: row.level,
            },
        );
        open.push(OpenFrame {
            depth: row.level,
            index: levels[row.level].len() - 1,
            end: start + value,
            next_start: start,
        });
        prev_level = row.level;
    }

    Ok(Levels::from_levels(levels))
}

/// Turns the flamebearer relative offsets into cumulative starts with a
/// prefix sum per level.
pub fn from_flamebearer(fb: &Flamebearer) -> Result<Levels, FlattenError> {
    let mut levels: Vec<Level> = Vec::with_capacity(fb.levels.len());

    for (depth, raw) in fb.levels.iter().enumerate() {
        if raw.len() % STEP_OFFSET != 0 {
            return Err(FlattenError::RaggedLevel {
                level: depth,
                len: raw.len(),
            });
        }
        let mut level = Vec::with_capacity(raw.len() / STEP_OFFSET);
        let mut prev_end = 0u64;
        for bar in raw.chunks_exact(STEP_OFFSET) {
            let (delta, total, self_value, name_index) = (bar[0], bar[1], bar[2], bar[3]);
            let label = usize::try_from(name_index)
                .ok()
                .and_then(|i| fb.names.get(i))
                .ok_or(FlattenError::UnknownName {
                    level: depth,
                    index: name_index,
                })?;
            if delta < 0 {
                return Err(FlattenError::NegativeCount {
                    label: label.clone(),
                    count: delta,
                });
            }
            let (self_value, value) = counts(label, self_value, total)?;
            let overflow = || FlattenError::OffsetOverflow { level: depth };
            let start = prev_end.checked_add(delta as u64).ok_or_else(overflow)?;
            prev_end = start.checked_add(value).ok_or_else(overflow)?;
            level.push(Frame {
                label: label.clone(),
                self_value,
                value,
                start,
                depth,
            });
        }
        if depth == 0 {
            if level.len() > 1 {
                return Err(FlattenError::MultipleRoots(1));
            }
            if let Some(root) = level.first().filter(|root| root.start != 0) {
                return Err(FlattenError::RootOffset(root.start));
            }
        }
        if let Some(parents) = levels.last() {
            check_nesting(parents, &level)?;
        }
        levels.push(level);
    }

    // Trailing empty levels carry no frames.
    while levels.last().is_some_and(Vec::is_empty) {
        levels.pop();
    }
    Ok(Levels::from_levels(levels))
}

/// Every child must lie inside a frame of the level above, and the children
/// of one parent must fit in its value.
fn check_nesting(parents: &[Frame], children: &[Frame]) -> Result<(), FlattenError> {
    let mut p = 0;
    for child in children {
        while p < parents.len() && parents[p].end() < child.end() {
            p += 1;
        }
        match parents.get(p) {
            Some(parent) if parent.start <= child.start => {}
            Some(parent) => {
                return Err(FlattenError::ChildrenExceedParent {
                    label: parent.label.clone(),
                    children: parent.end().saturating_sub(child.start),
                    value: parent.value,
                });
            }
            None => {
                let parent = parents.last().map_or(child, |last| last);
                return Err(FlattenError::ChildrenExceedParent {
                    label: parent.label.clone(),
                    children: child.end().saturating_sub(parent.start),
                    value: parent.value,
                });
            }
        }
    }
    Ok(())
}

/// A deterministic pseudo-random call tree with repeated labels, zero-value
/// leaves and a mix of wide and narrow frames.
#[cfg(test)]
pub(crate) fn bushy_tree(seed: u64, max_depth: usize) -> ProfileNode {
    fn next(rng: &mut u64) -> u64 {
        *rng = rng
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        *rng >> 33
    }

    fn build(rng: &mut u64, label: String, depth: usize, max_depth: usize) -> ProfileNode {
        let self_value = (next(rng) % 50) as i64;
        let fanout = if depth == max_depth { 0 } else { next(rng) % 6 };
        let children: Vec<ProfileNode> = (0..fanout)
            .map(|_| {
                let label = format!("fn_{}", next(rng) % 40);
                build(rng, label, depth + 1, max_depth)
            })
            .collect();
        let value = self_value + children.iter().map(|c| c.value).sum::<i64>();
        ProfileNode::with_children(label, self_value, value, children)
    }

    let mut rng = seed;
    build(&mut rng, "total".to_string(), 0, max_depth)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> ProfileNode {
        ProfileNode::with_children(
            "total",
            0,
            100,
            vec![
                ProfileNode::with_children(
                    "main",
                    10,
                    70,
                    vec![ProfileNode::leaf("foo", 40), ProfileNode::leaf("bar", 20)],
                ),
                ProfileNode::with_children("worker", 5, 30, vec![ProfileNode::leaf("baz", 25)]),
            ],
        )
    }

    fn starts(levels: &Levels, index: usize) -> Vec<(&str, u64, u64)> {
        levels
            .level(index)
            .unwrap()
            .iter()
            .map(|f| (f.label.as_str(), f.start, f.value))
            .collect()
    }

    #[test]
    fn test_flatten_offsets() {
        let levels = flatten(&sample_tree()).unwrap();

        assert_eq!(levels.len(), 3);
        assert_eq!(levels.total(), 100);
        assert_eq!(starts(&levels, 0), vec![("total", 0, 100)]);
        assert_eq!(starts(&levels, 1), vec![("main", 0, 70), ("worker", 70, 30)]);
        assert_eq!(
            starts(&levels, 2),
            vec![("foo", 0, 40), ("bar", 40, 20), ("baz", 70, 25)]
        );
    }

    #[test]
    fn test_levels_sorted_and_non_overlapping() {
        let levels = flatten(&sample_tree()).unwrap();
        for level in levels.iter() {
            for pair in level.windows(2) {
                assert!(pair[0].end() <= pair[1].start);
            }
        }
        let root_children: u64 = levels.level(1).unwrap().iter().map(|f| f.value).sum();
        assert!(root_children <= levels.total());
    }

    #[test]
    fn test_zero_value_keeps_slot() {
        let tree = ProfileNode::with_children(
            "total",
            0,
            10,
            vec![
                ProfileNode::leaf("a", 4),
                ProfileNode::leaf("empty", 0),
                ProfileNode::leaf("b", 6),
            ],
        );
        let levels = flatten(&tree).unwrap();
        assert_eq!(
            starts(&levels, 1),
            vec![("a", 0, 4), ("empty", 4, 0), ("b", 4, 6)]
        );
    }

    #[test]
    fn test_deep_tree_does_not_recurse() {
        let mut node = ProfileNode::leaf("leaf", 1);
        for i in 0..50_000 {
            node = ProfileNode::with_children(format!("f{i}"), 0, 1, vec![node]);
        }
        let levels = flatten(&node).unwrap();
        assert_eq!(levels.len(), 50_001);
        // Drop iteratively; the recursive drop glue would overflow the stack.
        let mut next = Some(node);
        while let Some(mut n) = next {
            next = n.children.pop();
        }
    }

    #[test]
    fn test_flatten_rejects_malformed() {
        let mut bad_self = ProfileNode::leaf("x", 5);
        bad_self.self_value = 6;
        assert!(matches!(
            flatten(&bad_self),
            Err(FlattenError::SelfExceedsValue { .. })
        ));

        let negative = ProfileNode::with_children("x", 0, 5, vec![ProfileNode::leaf("y", -1)]);
        assert!(matches!(
            flatten(&negative),
            Err(FlattenError::NegativeCount { count: -1, .. })
        ));

        let overfull = ProfileNode::with_children(
            "x",
            0,
            5,
            vec![ProfileNode::leaf("y", 3), ProfileNode::leaf("z", 3)],
        );
        assert_eq!(
            flatten(&overfull),
            Err(FlattenError::ChildrenExceedParent {
                label: "x".to_string(),
                children: 6,
                value: 5,
            })
        );
    }

    fn row(level: usize, label: &str, self_value: i64, value: i64) -> NestedSetRow {
        NestedSetRow {
            level,
            label: label.to_string(),
            self_value,
            value,
        }
    }

    #[test]
    fn test_nested_set_matches_tree() {
        let rows = vec![
            row(0, "total", 0, 100),
            row(1, "main", 10, 70),
            row(2, "foo", 40, 40),
            row(2, "bar", 20, 20),
            row(1, "worker", 5, 30),
            row(2, "baz", 25, 25),
        ];
        assert_eq!(
            from_nested_set(&rows).unwrap(),
            flatten(&sample_tree()).unwrap()
        );
    }

    #[test]
    fn test_nested_set_empty() {
        let levels = from_nested_set(&[]).unwrap();
        assert!(levels.is_empty());
        assert_eq!(levels.total(), 0);
    }

    #[test]
    fn test_nested_set_rejects_bad_nesting() {
        let jump = vec![row(0, "total", 0, 10), row(2, "deep", 10, 10)];
        assert_eq!(
            from_nested_set(&jump),
            Err(FlattenError::LevelJump {
                row: 1,
                from: 0,
                to: 2
            })
        );

        let no_root = vec![row(1, "orphan", 1, 1)];
        assert_eq!(from_nested_set(&no_root), Err(FlattenError::MissingRoot(1)));

        let two_roots = vec![row(0, "a", 1, 1), row(0, "b", 1, 1)];
        assert_eq!(
            from_nested_set(&two_roots),
            Err(FlattenError::MultipleRoots(1))
        );

        let overfull = vec![
            row(0, "total", 0, 10),
            row(1, "a", 6, 6),
            row(1, "b", 6, 6),
        ];
        assert!(matches!(
            from_nested_set(&overfull),
            Err(FlattenError::ChildrenExceedParent { .. })
        ));
    }

    fn sample_flamebearer() -> Flamebearer {
        Flamebearer {
            names: ["total", "main", "worker", "foo", "bar", "baz"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            levels: vec![
                vec![0, 100, 0, 0],
                vec![0, 70, 10, 1, 0, 30, 5, 2],
                vec![0, 40, 40, 3, 0, 20, 20, 4, 10, 25, 25, 5],
            ],
        }
    }

    #[test]
    fn test_flamebearer_prefix_sum() {
        assert_eq!(
            from_flamebearer(&sample_flamebearer()).unwrap(),
            flatten(&sample_tree()).unwrap()
        );
    }

    #[test]
    fn test_flamebearer_rejects_malformed() {
        let mut ragged = sample_flamebearer();
        ragged.levels[1].pop();
        assert_eq!(
            from_flamebearer(&ragged),
            Err(FlattenError::RaggedLevel { level: 1, len: 7 })
        );

        let mut unknown = sample_flamebearer();
        unknown.levels[1][3] = 42;
        assert_eq!(
            from_flamebearer(&unknown),
            Err(FlattenError::UnknownName {
                level: 1,
                index: 42
            })
        );

        let mut escaping = sample_flamebearer();
        // "baz" now ends at 105, past the end of "worker".
        escaping.levels[2][8] = 20;
        assert!(matches!(
            from_flamebearer(&escaping),
            Err(FlattenError::ChildrenExceedParent { .. })
        ));
    }

    #[test]
    fn test_flamebearer_offsets_overflow() {
        let max = i64::MAX;
        let fb = Flamebearer {
            names: vec!["total".to_string(), "a".to_string()],
            levels: vec![
                vec![0, max, 0, 0],
                vec![0, max, max, 1, 0, max, max, 1, 0, max, max, 1],
            ],
        };
        assert_eq!(
            from_flamebearer(&fb),
            Err(FlattenError::OffsetOverflow { level: 1 })
        );
    }

    #[test]
    fn test_flamebearer_root_must_start_at_zero() {
        let fb = Flamebearer {
            names: vec!["total".to_string(), "a".to_string()],
            levels: vec![vec![5, 10, 0, 0], vec![5, 10, 10, 1]],
        };
        assert_eq!(from_flamebearer(&fb), Err(FlattenError::RootOffset(5)));
    }
}
