//! Builders for course records.

#![allow(dead_code)]

use coursecat::course::{CategorySource, CourseRecord};

/// Builder for creating `CourseRecord` instances.
pub struct CourseBuilder {
    record: CourseRecord,
}

impl CourseBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            record: CourseRecord::new(id),
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.record.title = Some(title.to_string());
        self
    }

    pub fn original_title(mut self, title: &str) -> Self {
        self.record.original_title = Some(title.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.record.description = Some(description.to_string());
        self
    }

    pub fn course_name(mut self, name: &str) -> Self {
        self.record.course_name = Some(name.to_string());
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.record.category = Some(category.to_string());
        self
    }

    pub fn source(mut self, source: CategorySource) -> Self {
        self.record.category_source = Some(source);
        self
    }

    pub fn build(self) -> CourseRecord {
        self.record
    }
}

/// `count` uncategorized records with ids `{prefix}-0000`, `{prefix}-0001`, ...
pub fn numbered_courses(prefix: &str, count: usize) -> Vec<CourseRecord> {
    (0..count)
        .map(|i| {
            CourseBuilder::new(&format!("{}-{:04}", prefix, i))
                .title(&format!("Course {}", i))
                .build()
        })
        .collect()
}
