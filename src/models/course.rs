use serde::{Deserialize, Serialize};

use super::Candidate;

/// A category paired with the keyword its places are searched by
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryQuery {
    pub category: String,
    pub keyword: String,
}

impl CategoryQuery {
    pub fn new(category: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            keyword: keyword.into(),
        }
    }
}

/// One stop of a course
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CourseStep {
    pub category: String,
    pub candidate: Candidate,
    /// 1-based, counting only emitted steps
    pub order: usize,
}

/// An assembled course. Not persisted here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Course {
    pub steps: Vec<CourseStep>,
}

impl Course {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Appends a step, numbering it after the existing ones
    pub fn push_step(&mut self, category: impl Into<String>, candidate: Candidate) {
        let order = self.steps.len() + 1;
        self.steps.push(CourseStep {
            category: category.into(),
            candidate,
            order,
        });
    }
}
