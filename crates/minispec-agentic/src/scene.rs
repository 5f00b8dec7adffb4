//! Scene descriptions for prompt grounding
//!
//! A [`SceneDescription`] is a read-only snapshot of what the detector saw
//! in one frame, fetched fresh before each planning, verification, or query
//! prompt. Its prompt rendering is intentionally compact: object name,
//! center, size, confidence — enough for the model to ground
//! natural-language targets without blowing the token budget.

use serde::{Deserialize, Serialize};

use crate::vision::DetectedObject;

/// Snapshot of detected objects for one frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneDescription {
    pub objects: Vec<DetectedObject>,
}

impl SceneDescription {
    pub fn new(objects: Vec<DetectedObject>) -> Self {
        Self { objects }
    }

    /// Render the object list for prompt inclusion.
    pub fn obj_list(&self) -> String {
        if self.objects.is_empty() {
            return "(no objects detected)".to_string();
        }
        self.objects
            .iter()
            .map(|obj| {
                let (cx, cy) = obj.bbox.center();
                let (w, h) = obj.bbox.size();
                format!(
                    "{} x:{:.2} y:{:.2} width:{:.2} height:{:.2} confidence:{:.2}",
                    obj.name, cx, cy, w, h, obj.confidence
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Does the scene contain an object whose name matches (substring,
    /// case-insensitive)?
    pub fn contains(&self, name: &str) -> bool {
        let needle = name.to_lowercase();
        self.objects
            .iter()
            .any(|o| o.name.to_lowercase().contains(&needle))
    }
}
