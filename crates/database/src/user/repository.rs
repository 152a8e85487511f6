use crate::{
    user::model::{Avatar, Donation, User},
    Database,
};
use async_trait::async_trait;
use chrono::Utc;
use futures::stream::TryStreamExt;
use mongodb::{
    bson::{self, doc, oid::ObjectId, Document},
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument},
};
use std::sync::Arc;
use tracing::{info, warn};
use utils::AppResult;

pub type DynUserRepository = Arc<dyn UserRepositoryTrait + Send + Sync>;

// 主要用于Service中，表示提供了该Trait功能
#[async_trait]
pub trait UserRepositoryTrait {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// 非法的 id 视为不存在
    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>>;

    /// 插入新用户，返回带 id 的文档. 重复 email 由唯一索引拒绝 (Conflict)
    async fn create_user(&self, user: User) -> AppResult<User>;

    async fn update_name(&self, id: &str, name: &str) -> AppResult<Option<User>>;

    async fn update_avatar(&self, id: &str, avatar: Avatar) -> AppResult<Option<User>>;

    /// 集合语义: 已存在的 fund id 不会重复添加
    async fn add_created_fund(&self, id: &str, fund_id: &str) -> AppResult<Option<User>>;

    async fn update_role(&self, id: &str, role: &str) -> AppResult<Option<User>>;

    /// 追加捐款记录并累加 amountDonated (单文档原子更新).
    /// 记录带 paymentId 时，已经持有该 paymentId 的用户不会被再次累加.
    /// 返回更新后的文档，用户不存在时返回 None
    async fn append_donation(&self, id: &ObjectId, donation: Donation) -> AppResult<Option<User>>;

    /// 持有该 paymentId 捐款记录的用户
    async fn find_by_payment_id(&self, payment_id: &str) -> AppResult<Option<User>>;

    /// 所有用户, createdAt 倒序
    async fn list_users(&self) -> AppResult<Vec<User>>;
}

pub fn parse_object_id(id: &str) -> Option<ObjectId> {
    ObjectId::parse_str(id).ok()
}

pub fn donation_filter(id: &ObjectId, payment_id: Option<&str>) -> Document {
    match payment_id {
        Some(reference) => doc! {
            "_id": id,
            "donationsArray.paymentId": { "$ne": reference },
        },
        None => doc! { "_id": id },
    }
}

pub fn donation_update(donation: &Donation) -> AppResult<Document> {
    let entry = bson::to_bson(donation)?;
    Ok(doc! {
        "$push": { "donationsArray": entry },
        "$inc": { "amountDonated": donation.amount },
        "$set": { "updatedAt": bson::DateTime::from_chrono(Utc::now()) },
    })
}

fn return_after() -> FindOneAndUpdateOptions {
    FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build()
}

impl Database {
    async fn update_user(&self, id: &str, update: Document) -> AppResult<Option<User>> {
        let Some(oid) = parse_object_id(id) else {
            return Ok(None);
        };

        let user = self
            .users
            .find_one_and_update(doc! { "_id": oid }, update, return_after())
            .await?;

        Ok(user)
    }
}

#[async_trait]
impl UserRepositoryTrait for Database {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = self.users.find_one(doc! { "email": email }, None).await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let Some(oid) = parse_object_id(id) else {
            return Ok(None);
        };
        let user = self.users.find_one(doc! { "_id": oid }, None).await?;

        Ok(user)
    }

    async fn create_user(&self, mut user: User) -> AppResult<User> {
        let result = self.users.insert_one(&user, None).await?;
        user.id = result.inserted_id.as_object_id();

        info!("👤 user created: {}", user.email);
        Ok(user)
    }

    async fn update_name(&self, id: &str, name: &str) -> AppResult<Option<User>> {
        let now = bson::DateTime::from_chrono(Utc::now());
        self.update_user(id, doc! { "$set": { "name": name, "updatedAt": now } })
            .await
    }

    async fn update_avatar(&self, id: &str, avatar: Avatar) -> AppResult<Option<User>> {
        let now = bson::DateTime::from_chrono(Utc::now());
        let avatar = bson::to_bson(&avatar)?;
        self.update_user(id, doc! { "$set": { "avatar": avatar, "updatedAt": now } })
            .await
    }

    async fn add_created_fund(&self, id: &str, fund_id: &str) -> AppResult<Option<User>> {
        self.update_user(id, doc! { "$addToSet": { "createdFunds": fund_id } })
            .await
    }

    async fn update_role(&self, id: &str, role: &str) -> AppResult<Option<User>> {
        let now = bson::DateTime::from_chrono(Utc::now());
        self.update_user(id, doc! { "$set": { "role": role, "updatedAt": now } })
            .await
    }

    async fn append_donation(&self, id: &ObjectId, donation: Donation) -> AppResult<Option<User>> {
        let filter = donation_filter(id, donation.payment_id.as_deref());
        let update = donation_update(&donation)?;

        let updated = self
            .users
            .find_one_and_update(filter, update, return_after())
            .await?;

        match updated {
            Some(user) => Ok(Some(user)),
            None => {
                // 过滤条件未命中: 用户不存在，或该 paymentId 已经记账
                let current = self.users.find_one(doc! { "_id": id }, None).await?;
                if current.is_some() {
                    warn!(
                        "⚠️ donation {:?} already credited to user {}",
                        donation.payment_id,
                        id.to_hex()
                    );
                }
                Ok(current)
            }
        }
    }

    async fn find_by_payment_id(&self, payment_id: &str) -> AppResult<Option<User>> {
        let user = self
            .users
            .find_one(doc! { "donationsArray.paymentId": payment_id }, None)
            .await?;

        Ok(user)
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let options = FindOptions::builder().sort(doc! { "createdAt": -1 }).build();
        let cursor = self.users.find(None, options).await?;
        let users: Vec<User> = cursor.try_collect().await?;

        Ok(users)
    }
}
