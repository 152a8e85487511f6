use crate::{serde_helpers::optional_chrono_datetime_as_bson_datetime, user::model::Avatar};
use chrono::prelude::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// `non-profit` 是一个虚拟分类
pub const NON_PROFIT: &str = "non-profit";

/// 按类型筛选时实际匹配的分类
pub fn categories_for_type(kind: &str) -> Vec<String> {
    if kind == NON_PROFIT {
        vec!["education".to_string(), "others".to_string()]
    } else {
        vec![kind.to_string()]
    }
}

/// Fields matched by the free-text search.
pub const SEARCH_FIELDS: [&str; 7] = [
    "benefitterName",
    "category",
    "fundraiserTitle",
    "benefitterAddress",
    "ailment",
    "createdBy",
    "hospitalLocation",
];

/// 筹款活动模型 (collection `fundraiserequests`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fundraiser {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default)]
    pub verified: bool,
    pub category: String,
    pub fundraiser_title: String,
    pub fundraiser_story: Option<String>,
    pub amount_required: String,
    #[serde(default, with = "optional_chrono_datetime_as_bson_datetime")]
    pub end_date_to_raise: Option<DateTime<Utc>>,
    pub include_tax_benefit: Option<String>,
    pub created_by: String,
    pub creator_mail: String,
    pub benefitter_img: Option<Avatar>,
    pub benefitter_creator_relation: Option<String>,
    pub benefitter_name: Option<String>,
    pub benefitter_age: Option<i32>,
    pub benefitter_gender: Option<String>,
    pub benefitter_address: Option<String>,
    pub benefitter_contact: Option<String>,
    #[serde(default)]
    pub amount_raised: f64,
    /// donor ids, one entry per donation (duplicates allowed)
    #[serde(default)]
    pub donators: Vec<String>,
    #[serde(default)]
    pub number_of_donators: i64,
    pub cover_img: Option<Avatar>,
    pub hospital_name: Option<String>,
    pub hospital_location: Option<String>,
    pub ailment: Option<String>,
    /// 已处理的支付凭证，防止重复记账
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payment_refs: Vec<String>,
    #[serde(default, with = "optional_chrono_datetime_as_bson_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "optional_chrono_datetime_as_bson_datetime")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Fundraiser {
    pub fn id_hex(&self) -> String {
        self.id.map(|id| id.to_hex()).unwrap_or_default()
    }

    pub fn cover_url(&self) -> Option<String> {
        self.cover_img.as_ref().and_then(|img| img.url.clone())
    }

    pub fn cover_public_id(&self) -> Option<String> {
        self.cover_img.as_ref().and_then(|img| img.public_id.clone())
    }
}

/// Serialized fundraiser: hex id and RFC 3339 timestamps. Cached under the
/// fundraiser id and returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundraiserRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub verified: bool,
    pub category: String,
    pub fundraiser_title: String,
    pub fundraiser_story: Option<String>,
    pub amount_required: String,
    pub end_date_to_raise: Option<DateTime<Utc>>,
    pub include_tax_benefit: Option<String>,
    pub created_by: String,
    pub creator_mail: String,
    pub benefitter_img: Option<Avatar>,
    pub benefitter_creator_relation: Option<String>,
    pub benefitter_name: Option<String>,
    pub benefitter_age: Option<i32>,
    pub benefitter_gender: Option<String>,
    pub benefitter_address: Option<String>,
    pub benefitter_contact: Option<String>,
    pub amount_raised: f64,
    pub donators: Vec<String>,
    pub number_of_donators: i64,
    pub cover_img: Option<Avatar>,
    pub hospital_name: Option<String>,
    pub hospital_location: Option<String>,
    pub ailment: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Fundraiser> for FundraiserRecord {
    fn from(f: Fundraiser) -> Self {
        FundraiserRecord {
            id: f.id_hex(),
            verified: f.verified,
            category: f.category,
            fundraiser_title: f.fundraiser_title,
            fundraiser_story: f.fundraiser_story,
            amount_required: f.amount_required,
            end_date_to_raise: f.end_date_to_raise,
            include_tax_benefit: f.include_tax_benefit,
            created_by: f.created_by,
            creator_mail: f.creator_mail,
            benefitter_img: f.benefitter_img,
            benefitter_creator_relation: f.benefitter_creator_relation,
            benefitter_name: f.benefitter_name,
            benefitter_age: f.benefitter_age,
            benefitter_gender: f.benefitter_gender,
            benefitter_address: f.benefitter_address,
            benefitter_contact: f.benefitter_contact,
            amount_raised: f.amount_raised,
            donators: f.donators,
            number_of_donators: f.number_of_donators,
            cover_img: f.cover_img,
            hospital_name: f.hospital_name,
            hospital_location: f.hospital_location,
            ailment: f.ailment,
            created_at: f.created_at,
            updated_at: f.updated_at,
        }
    }
}

/// 编辑时的部分更新, 只有 Some 字段会进入 `$set`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundraiserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fundraiser_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fundraiser_story: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_required: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "optional_chrono_datetime_as_bson_datetime"
    )]
    pub end_date_to_raise: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_tax_benefit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benefitter_img: Option<Avatar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benefitter_creator_relation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benefitter_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benefitter_age: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benefitter_gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benefitter_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benefitter_contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hospital_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hospital_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ailment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_img: Option<Avatar>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "optional_chrono_datetime_as_bson_datetime"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}
