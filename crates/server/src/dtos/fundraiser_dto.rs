use chrono::{DateTime, Utc};
use database::{
    fundraiser::model::{Fundraiser, FundraiserPatch},
    serde_helpers::deserialize_optional_flexible_datetime,
    user::model::Avatar,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// 创建筹款活动的表单, 统计字段(verified/amountRaised/donators)由服务端初始化
#[derive(Clone, Serialize, Deserialize, Debug, Validate, Default)]
#[serde(rename_all = "camelCase")]
pub struct FundraiserDraft {
    #[validate(length(min = 1))]
    pub category: String,
    #[validate(length(min = 1))]
    pub fundraiser_title: String,
    pub fundraiser_story: Option<String>,
    #[validate(length(min = 1))]
    pub amount_required: String,
    #[serde(default, deserialize_with = "deserialize_optional_flexible_datetime")]
    pub end_date_to_raise: Option<DateTime<Utc>>,
    pub include_tax_benefit: Option<String>,
    #[validate(length(min = 1))]
    pub created_by: String,
    #[validate(email)]
    pub creator_mail: String,
    pub benefitter_img: Option<Avatar>,
    pub benefitter_creator_relation: Option<String>,
    pub benefitter_name: Option<String>,
    #[validate(range(min = 0, max = 150))]
    pub benefitter_age: Option<i32>,
    pub benefitter_gender: Option<String>,
    pub benefitter_address: Option<String>,
    pub benefitter_contact: Option<String>,
    pub hospital_name: Option<String>,
    pub hospital_location: Option<String>,
    pub ailment: Option<String>,
    pub cover_img: Option<Avatar>,
}

impl FundraiserDraft {
    pub fn into_fundraiser(self, now: DateTime<Utc>) -> Fundraiser {
        Fundraiser {
            id: None,
            verified: false,
            category: self.category,
            fundraiser_title: self.fundraiser_title,
            fundraiser_story: self.fundraiser_story,
            amount_required: self.amount_required,
            end_date_to_raise: self.end_date_to_raise,
            include_tax_benefit: self.include_tax_benefit,
            created_by: self.created_by,
            creator_mail: self.creator_mail,
            benefitter_img: self.benefitter_img,
            benefitter_creator_relation: self.benefitter_creator_relation,
            benefitter_name: self.benefitter_name,
            benefitter_age: self.benefitter_age,
            benefitter_gender: self.benefitter_gender,
            benefitter_address: self.benefitter_address,
            benefitter_contact: self.benefitter_contact,
            amount_raised: 0.0,
            donators: Vec::new(),
            number_of_donators: 0,
            cover_img: self.cover_img,
            hospital_name: self.hospital_name,
            hospital_location: self.hospital_location,
            ailment: self.ailment,
            payment_refs: Vec::new(),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, Validate, Default)]
pub struct CreateFundraiserDto {
    #[validate]
    pub data: FundraiserDraft,
}

/// 编辑表单: `coverImg` 为新图片数据, 或者以 https 开头的现有地址(保持不变)
#[derive(Clone, Serialize, Deserialize, Debug, Validate, Default)]
#[serde(rename_all = "camelCase")]
pub struct EditFundraiserDto {
    pub verified: Option<bool>,
    #[validate(length(min = 1))]
    pub category: Option<String>,
    #[validate(length(min = 1))]
    pub fundraiser_title: Option<String>,
    pub fundraiser_story: Option<String>,
    pub amount_required: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_flexible_datetime")]
    pub end_date_to_raise: Option<DateTime<Utc>>,
    pub include_tax_benefit: Option<String>,
    pub benefitter_img: Option<Avatar>,
    pub benefitter_creator_relation: Option<String>,
    pub benefitter_name: Option<String>,
    #[validate(range(min = 0, max = 150))]
    pub benefitter_age: Option<i32>,
    pub benefitter_gender: Option<String>,
    pub benefitter_address: Option<String>,
    pub benefitter_contact: Option<String>,
    pub hospital_name: Option<String>,
    pub hospital_location: Option<String>,
    pub ailment: Option<String>,
    pub cover_img: Option<String>,
}

impl EditFundraiserDto {
    /// 拆分为字段补丁和待处理的封面图
    pub fn into_patch(self) -> (FundraiserPatch, Option<String>) {
        let patch = FundraiserPatch {
            verified: self.verified,
            category: self.category,
            fundraiser_title: self.fundraiser_title,
            fundraiser_story: self.fundraiser_story,
            amount_required: self.amount_required,
            end_date_to_raise: self.end_date_to_raise,
            include_tax_benefit: self.include_tax_benefit,
            benefitter_img: self.benefitter_img,
            benefitter_creator_relation: self.benefitter_creator_relation,
            benefitter_name: self.benefitter_name,
            benefitter_age: self.benefitter_age,
            benefitter_gender: self.benefitter_gender,
            benefitter_address: self.benefitter_address,
            benefitter_contact: self.benefitter_contact,
            hospital_name: self.hospital_name,
            hospital_location: self.hospital_location,
            ailment: self.ailment,
            cover_img: None,
            updated_at: None,
        };
        (patch, self.cover_img.filter(|img| !img.is_empty()))
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, Validate, Default)]
pub struct UpdateAmountDto {
    pub amount: i64,
}

#[derive(Clone, Serialize, Deserialize, Debug, Validate, Default)]
pub struct ImageUploadDto {
    #[validate(length(min = 1))]
    pub avatar: String,
}

#[derive(Clone, Serialize, Deserialize, Debug, Validate, Default)]
pub struct ImageDeleteDto {
    #[validate(length(min = 1))]
    pub public_id: String,
}

#[derive(Clone, Serialize, Deserialize, Debug, Validate, Default)]
pub struct TypeWrapper {
    #[serde(rename = "type")]
    #[validate(length(min = 1))]
    pub kind: String,
}

/// 请求体形如 `{"type": {"type": "medical"}}`
#[derive(Clone, Serialize, Deserialize, Debug, Validate, Default)]
pub struct FundraiserByTypeDto {
    #[serde(rename = "type")]
    #[validate]
    pub kind: TypeWrapper,
}

#[derive(Clone, Serialize, Deserialize, Debug, Validate, Default)]
pub struct SearchWrapper {
    pub search: String,
}

/// 请求体形如 `{"search": {"search": "heart"}}`
#[derive(Clone, Serialize, Deserialize, Debug, Validate, Default)]
pub struct FundraiserBySearchDto {
    #[validate]
    pub search: SearchWrapper,
}

/// getUserDonatedFunds 的单项
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DonatedFund {
    pub title: String,
    pub id: String,
    pub cover_img: Option<Avatar>,
    pub amount: f64,
    pub date: Option<DateTime<Utc>>,
}
