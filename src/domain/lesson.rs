//! Lesson content records.
//!
//! These mirror the rows the data layer hands us. Nothing in this crate
//! mutates them; a change in the backend arrives as a whole new
//! [`LessonContent`] snapshot.

use serde::{Deserialize, Serialize};

/// What a resource is attached to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceParent {
    /// Attached to an in-class activity
    Activity(String),

    /// Attached to a homework item
    Homework(String),
}

/// A file or link attached to an activity or homework item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Unique identifier
    pub id: String,

    /// Display title
    pub title: String,

    /// Location of the file or link (may be missing)
    #[serde(default)]
    pub file_url: Option<String>,

    /// Original file name, if uploaded
    #[serde(default)]
    pub file_name: Option<String>,

    /// Whether students may see this resource
    #[serde(default)]
    pub visible_to_students: bool,

    /// Owning activity or homework item
    pub parent: ResourceParent,

    /// Position within the parent
    #[serde(default)]
    pub order_index: i32,
}

impl Resource {
    /// Create a resource attached to an activity
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        file_url: impl Into<String>,
        activity_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            file_url: Some(file_url.into()),
            file_name: None,
            visible_to_students: false,
            parent: ResourceParent::Activity(activity_id.into()),
            order_index: 0,
        }
    }

    /// Mark the resource as visible to students
    pub fn visible(mut self) -> Self {
        self.visible_to_students = true;
        self
    }

    /// Set the original file name
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Set the ordering position
    pub fn with_order(mut self, order_index: i32) -> Self {
        self.order_index = order_index;
        self
    }

    /// The URL as a plain str (empty when missing)
    pub fn url(&self) -> &str {
        self.file_url.as_deref().unwrap_or("")
    }

    /// Whether this resource belongs to the given activity
    pub fn belongs_to_activity(&self, activity_id: &str) -> bool {
        matches!(&self.parent, ResourceParent::Activity(id) if id == activity_id)
    }
}

/// A titled unit of lesson content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Unique identifier
    pub id: String,

    /// Display title
    pub title: String,

    /// Rich-text instructions for the teacher only
    #[serde(default)]
    pub teacher_content: Option<String>,

    /// Rich-text instructions shown to students
    #[serde(default)]
    pub student_content: Option<String>,

    /// Whether student instructions may be shown on the student display
    #[serde(default)]
    pub show_to_students: bool,

    /// Free-form duration label (e.g. "10 min")
    #[serde(default)]
    pub duration: Option<String>,

    /// Position within the lesson
    #[serde(default)]
    pub order_index: i32,
}

impl Activity {
    /// Create an activity with no content
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            teacher_content: None,
            student_content: None,
            show_to_students: false,
            duration: None,
            order_index: 0,
        }
    }

    /// Set student-facing content and make it visible
    pub fn with_student_content(mut self, content: impl Into<String>) -> Self {
        self.student_content = Some(content.into());
        self.show_to_students = true;
        self
    }

    /// Set teacher-only content
    pub fn with_teacher_content(mut self, content: impl Into<String>) -> Self {
        self.teacher_content = Some(content.into());
        self
    }

    /// Set the ordering position
    pub fn with_order(mut self, order_index: i32) -> Self {
        self.order_index = order_index;
        self
    }
}

/// A read-only snapshot of one lesson as delivered by the data layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LessonContent {
    /// Lesson identifier
    #[serde(default)]
    pub id: String,

    /// Lesson title
    #[serde(default)]
    pub title: String,

    /// Activities in presentation order
    #[serde(default)]
    pub activities: Vec<Activity>,

    /// Resources for all activities and homework
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl LessonContent {
    /// Build a snapshot, ordering activities and resources by `order_index`
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        activities: Vec<Activity>,
        resources: Vec<Resource>,
    ) -> Self {
        let mut content = Self {
            id: id.into(),
            title: title.into(),
            activities,
            resources,
        };
        content.sort();
        content
    }

    /// Stable sort of both collections by `order_index`
    pub fn sort(&mut self) {
        self.activities.sort_by_key(|a| a.order_index);
        self.resources.sort_by_key(|r| r.order_index);
    }

    /// Number of activities
    pub fn activity_count(&self) -> usize {
        self.activities.len()
    }

    /// Activity at a given index
    pub fn activity(&self, index: usize) -> Option<&Activity> {
        self.activities.get(index)
    }

    /// All resources attached to an activity, visible or not
    pub fn resources_for<'a>(&'a self, activity: &'a Activity) -> impl Iterator<Item = &'a Resource> + 'a {
        self.resources
            .iter()
            .filter(move |r| r.belongs_to_activity(&activity.id))
    }

    /// Resources of an activity that students may see
    pub fn student_resources<'a>(
        &'a self,
        activity: &'a Activity,
    ) -> impl Iterator<Item = &'a Resource> + 'a {
        self.resources_for(activity).filter(|r| r.visible_to_students)
    }

    /// Look up a resource by id
    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LessonContent {
        LessonContent::new(
            "l1",
            "Fractions",
            vec![
                Activity::new("b", "Second").with_order(2),
                Activity::new("a", "First").with_order(1),
            ],
            vec![
                Resource::new("r2", "Hidden", "https://x/y.pdf", "a").with_order(2),
                Resource::new("r1", "Shown", "https://x/y.png", "a").visible().with_order(1),
                Resource {
                    parent: ResourceParent::Homework("a".to_string()),
                    ..Resource::new("h1", "Homework", "https://x/z.png", "a").visible()
                },
            ],
        )
    }

    #[test]
    fn test_new_orders_by_index() {
        let lesson = sample();
        assert_eq!(lesson.activities[0].id, "a");
        assert_eq!(lesson.activities[1].id, "b");
        assert_eq!(lesson.resources[0].id, "r1");
    }

    #[test]
    fn test_student_resources_filters_hidden_and_homework() {
        let lesson = sample();
        let activity = lesson.activity(0).unwrap();

        let all: Vec<&str> = lesson.resources_for(activity).map(|r| r.id.as_str()).collect();
        assert_eq!(all, vec!["r1", "r2"]);

        let visible: Vec<&str> = lesson
            .student_resources(activity)
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(visible, vec!["r1"]);
    }

    #[test]
    fn test_resource_yaml_parsing() {
        let yaml = r#"
id: r9
title: Worksheet
file_url: https://example.com/sheet.pdf
visible_to_students: true
parent:
  activity: a1
"#;
        let resource: Resource = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(resource.parent, ResourceParent::Activity("a1".to_string()));
        assert!(resource.visible_to_students);
        assert_eq!(resource.order_index, 0);
        assert!(resource.file_name.is_none());
    }
}
