//! services/api/src/adapters/course_store.rs
//!
//! An in-process implementation of the `CourseRepository` port. Generated courses
//! are kept in memory for the lifetime of the server so they can be fetched and
//! enhanced; durable storage belongs to the surrounding application.

use async_trait::async_trait;
use course_forge_core::domain::CourseContent;
use course_forge_core::ports::{CourseRepository, PortError, PortResult};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryCourseStore {
    courses: RwLock<HashMap<Uuid, CourseContent>>,
}

impl InMemoryCourseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CourseRepository for InMemoryCourseStore {
    async fn find_course(&self, course_id: Uuid) -> PortResult<CourseContent> {
        self.courses
            .read()
            .await
            .get(&course_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("course {}", course_id)))
    }

    /// Every save gets a fresh id, so an enhanced course never overwrites its source.
    async fn save_course(&self, course: &CourseContent) -> PortResult<Uuid> {
        let id = Uuid::new_v4();
        self.courses.write().await.insert(id, course.clone());
        Ok(id)
    }
}
