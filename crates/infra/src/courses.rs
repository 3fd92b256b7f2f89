//! Course content collaborator.
//!
//! Only the lookup needed behind the ownership gate is modelled here; the
//! catalog itself (creation, reviews, media) lives outside this service.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use elearn_core::CourseId;

#[async_trait]
pub trait CourseCatalog: Send + Sync {
    async fn content(&self, course_id: CourseId) -> Option<JsonValue>;
}

#[derive(Debug, Default)]
pub struct InMemoryCourseCatalog {
    inner: RwLock<HashMap<CourseId, JsonValue>>,
}

impl InMemoryCourseCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, course_id: CourseId, content: JsonValue) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(course_id, content);
        }
    }
}

#[async_trait]
impl CourseCatalog for InMemoryCourseCatalog {
    async fn content(&self, course_id: CourseId) -> Option<JsonValue> {
        let map = self.inner.read().ok()?;
        map.get(&course_id).cloned()
    }
}
