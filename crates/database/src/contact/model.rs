use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// 联系我们表单
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    pub message: String,
}
