//! Feedback payloads and their validation.

use crate::feedback::error::ApiError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Inclusive bounds of both rating fields.
pub const RATING_RANGE: std::ops::RangeInclusive<i64> = 1..=5;

const REQUIRED_FIELDS: [&str; 4] = ["satisfaction", "clarity", "llm_provider", "questions_answered"];

/// A validated submission, ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFeedback {
    pub satisfaction: i64,
    pub clarity: i64,
    pub llm_provider: String,
    pub questions_answered: String,
    pub improvements: String,
    pub conversation: String,
    pub user_agent: String,
    pub ip_address: Option<String>,
}

/// Request metadata recorded alongside a submission.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub user_agent: String,
    pub ip_address: Option<String>,
}

impl NewFeedback {
    /// Validate a JSON body. Required fields are checked for presence
    /// first, in a fixed order, then the ratings for range.
    pub fn from_json(body: &Value, meta: RequestMeta) -> Result<Self, ApiError> {
        let object = body.as_object().ok_or(ApiError::InvalidBody)?;

        for field in REQUIRED_FIELDS {
            if object.get(field).map_or(true, Value::is_null) {
                return Err(ApiError::MissingField(field));
            }
        }

        let satisfaction = rating(object, "satisfaction")?;
        let clarity = rating(object, "clarity")?;

        Ok(Self {
            satisfaction,
            clarity,
            llm_provider: required_text(object, "llm_provider")?,
            questions_answered: required_text(object, "questions_answered")?,
            improvements: optional_text(object, "improvements")?,
            conversation: optional_text(object, "conversation")?,
            user_agent: meta.user_agent,
            ip_address: meta.ip_address,
        })
    }
}

fn rating(object: &Map<String, Value>, field: &'static str) -> Result<i64, ApiError> {
    let value = match object.get(field) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or(ApiError::InvalidField(field))?;

    if !RATING_RANGE.contains(&value) {
        return Err(ApiError::OutOfRange(field));
    }
    Ok(value)
}

fn required_text(object: &Map<String, Value>, field: &'static str) -> Result<String, ApiError> {
    match object.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(ApiError::InvalidField(field)),
    }
}

fn optional_text(object: &Map<String, Value>, field: &'static str) -> Result<String, ApiError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ApiError::InvalidField(field)),
    }
}

/// A stored feedback row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub id: i64,
    pub timestamp: String,
    pub satisfaction: i64,
    pub clarity: i64,
    pub llm_provider: String,
    pub questions_answered: String,
    pub improvements: Option<String>,
    pub conversation: Option<String>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderCount {
    pub llm_provider: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnsweredCount {
    pub questions_answered: String,
    pub count: i64,
}

/// Aggregate statistics over all feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackStats {
    pub total_responses: i64,
    pub average_satisfaction: f64,
    pub average_clarity: f64,
    pub llm_providers: Vec<ProviderCount>,
    pub questions_answered: Vec<AnsweredCount>,
}
