use serde::Deserialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateStatsCardRequest {
    #[validate(length(min = 1, max = 120))]
    pub label: String,
    #[validate(length(min = 1, max = 120))]
    pub value: String,
    pub icon: String,
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatsCardRequest {
    pub label: Option<String>,
    pub value: Option<String>,
    pub icon: Option<String>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSectionRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSectionRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDifferentiatorRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    pub icon: String,
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDifferentiatorRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSubTopicRequest {
    pub section_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSubTopicRequest {
    pub name: Option<String>,
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    pub sub_topic_id: Uuid,
    #[serde(rename = "type")]
    pub question_type: String,
    pub content: JsonValue,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListQuestionsQuery {
    pub sub_topic_id: Option<Uuid>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
