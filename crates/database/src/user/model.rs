use crate::serde_helpers::optional_chrono_datetime_as_bson_datetime;
use chrono::prelude::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ROLE: &str = "user";
pub const ADMIN_ROLE: &str = "admin";

fn default_role() -> String {
    DEFAULT_ROLE.to_string()
}

/// 图床上的图片引用
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Avatar {
    pub public_id: Option<String>,
    pub url: Option<String>,
}

/// 用户的单笔捐款记录(只追加)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    pub fundraiser: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fundraiser_img: Option<String>,
    pub amount: f64,
    #[serde(default, with = "optional_chrono_datetime_as_bson_datetime")]
    pub date: Option<DateTime<Utc>>,
    /// Payment confirmation reference, used to detect a retried donation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
}

/// 用户模型
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// MongoDB文档ID
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: Option<String>,
    pub email: String,
    /// argon2 encoded hash (older accounts: bcrypt), absent for social and donor-only accounts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub amount_donated: f64,
    #[serde(default)]
    pub donations_array: Vec<Donation>,
    pub avatar: Option<Avatar>,
    #[serde(default)]
    pub created_funds: Vec<String>,
    #[serde(default, with = "optional_chrono_datetime_as_bson_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "optional_chrono_datetime_as_bson_datetime")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// 新用户: 零捐款，空列表，时间戳为当前时间
    pub fn new(email: &str, name: Option<String>, password: Option<String>, avatar: Option<Avatar>) -> Self {
        let now = Utc::now();
        User {
            id: None,
            name,
            email: email.to_string(),
            password,
            role: default_role(),
            amount_donated: 0.0,
            donations_array: Vec::new(),
            avatar,
            created_funds: Vec::new(),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// Donor account created on the fly by a donation; named after the
    /// local part of the e-mail address.
    pub fn new_donor(email: &str) -> Self {
        let name = email.split('@').next().unwrap_or(email).to_string();
        Self::new(email, Some(name), None, None)
    }

    pub fn id_hex(&self) -> String {
        self.id.map(|id| id.to_hex()).unwrap_or_default()
    }
}

/// Donation entry as it appears in a serialized user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRecord {
    pub fundraiser: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fundraiser_img: Option<String>,
    pub amount: f64,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
}

impl From<Donation> for DonationRecord {
    fn from(d: Donation) -> Self {
        DonationRecord {
            fundraiser: d.fundraiser,
            fundraiser_img: d.fundraiser_img,
            amount: d.amount,
            date: d.date,
            payment_id: d.payment_id,
        }
    }
}

/// JSON view of a user: hex id, RFC 3339 timestamps, never the password.
/// This is what lives in the session cache and what clients receive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub amount_donated: f64,
    #[serde(default)]
    pub donations_array: Vec<DonationRecord>,
    #[serde(default)]
    pub avatar: Option<Avatar>,
    #[serde(default)]
    pub created_funds: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<User> for UserRecord {
    fn from(user: User) -> Self {
        UserRecord {
            id: user.id_hex(),
            name: user.name,
            email: user.email,
            role: Some(user.role),
            amount_donated: user.amount_donated,
            donations_array: user.donations_array.into_iter().map(DonationRecord::from).collect(),
            avatar: user.avatar,
            created_funds: user.created_funds,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
