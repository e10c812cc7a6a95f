//! Grouping of normalized records into a role-pair matrix.

use std::collections::{BTreeMap, BTreeSet};

use crate::record::{Messages, NormalizedRecord};

/// `(assistant_role, user_role)`
pub type RolePair = (String, String);

/// Tasks of one role pair, keyed by `original_task`.
pub type TaskIndex = BTreeMap<String, TaskEntry>;

/// What remains of a record once it is filed under its role pair and task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskEntry {
    pub specified_task: String,
    pub messages: Messages,
}

/// Everything loaded from one archive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArchiveResult {
    /// Distinct assistant roles, sorted.
    pub assistant_roles: Vec<String>,
    /// Distinct user roles, sorted.
    pub user_roles: Vec<String>,
    pub matrix: BTreeMap<RolePair, TaskIndex>,
}

impl ArchiveResult {
    pub fn tasks(&self, assistant_role: &str, user_role: &str) -> Option<&TaskIndex> {
        self.matrix
            .get(&(assistant_role.to_string(), user_role.to_string()))
    }

    pub fn pair_count(&self) -> usize {
        self.matrix.len()
    }

    pub fn task_count(&self) -> usize {
        self.matrix.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }
}

/// Incremental builder behind [`assemble`]. A later record with the same
/// role pair and `original_task` replaces the earlier one.
#[derive(Debug, Default)]
pub struct Assembler {
    assistant_roles: BTreeSet<String>,
    user_roles: BTreeSet<String>,
    matrix: BTreeMap<RolePair, TaskIndex>,
    pushed: usize,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: NormalizedRecord) {
        let NormalizedRecord {
            assistant_role,
            user_role,
            original_task,
            specified_task,
            messages,
        } = record;

        self.assistant_roles.insert(assistant_role.clone());
        self.user_roles.insert(user_role.clone());
        self.matrix
            .entry((assistant_role, user_role))
            .or_default()
            .insert(
                original_task,
                TaskEntry {
                    specified_task,
                    messages,
                },
            );
        self.pushed += 1;
    }

    /// Records pushed so far, overwritten ones included.
    pub fn pushed(&self) -> usize {
        self.pushed
    }

    pub fn finish(self) -> ArchiveResult {
        ArchiveResult {
            assistant_roles: self.assistant_roles.into_iter().collect(),
            user_roles: self.user_roles.into_iter().collect(),
            matrix: self.matrix,
        }
    }
}

pub fn assemble<I>(records: I) -> ArchiveResult
where
    I: IntoIterator<Item = NormalizedRecord>,
{
    assemble_with_progress(records, |_| {})
}

/// Like [`assemble`], calling `progress` with the running record count after
/// each record.
pub fn assemble_with_progress<I, F>(records: I, mut progress: F) -> ArchiveResult
where
    I: IntoIterator<Item = NormalizedRecord>,
    F: FnMut(usize),
{
    let mut assembler = Assembler::new();
    for record in records {
        assembler.push(record);
        progress(assembler.pushed());
    }
    assembler.finish()
}
