////////////////////////////////////////////////////////////////////////
//
// 1. 每个Domain(Entity)单独一个文件夹
// 2. 每个Domain由两部分组成:
//    - model: 定义Schema
//    - repository: 实际的数据库底层操作
//
//////////////////////////////////////////////////////////////////////

use mongodb::{bson::doc, options::IndexOptions, Client, Collection, IndexModel};
use std::sync::Arc;
use tracing::info;
use utils::{AppConfig, AppResult};

pub mod contact;
pub mod fundraiser;
pub mod serde_helpers;
pub mod user;

pub const USERS_COLLECTION: &str = "users";
pub const FUNDRAISERS_COLLECTION: &str = "fundraiserequests";
pub const CONTACTS_COLLECTION: &str = "contacts";

#[derive(Clone, Debug)]
pub struct Database {
    pub users: Collection<user::model::User>,
    pub fundraisers: Collection<fundraiser::model::Fundraiser>,
    pub contacts: Collection<contact::model::Contact>,
}

impl Database {
    pub async fn new(config: Arc<AppConfig>) -> AppResult<Self> {
        let client = Client::with_uri_str(&config.mongo_uri).await?;
        let db: mongodb::Database = client.database(&config.mongo_db);

        let users = db.collection(USERS_COLLECTION);
        let fundraisers = db.collection(FUNDRAISERS_COLLECTION);
        let contacts = db.collection(CONTACTS_COLLECTION);

        info!("🧱 database({:#}) connected.", &config.mongo_db);

        Ok(Database {
            users,
            fundraisers,
            contacts,
        })
    }

    /// 初始化索引: email 唯一
    pub async fn init_indexes(&self) -> AppResult<()> {
        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.users.create_index(email_index, None).await?;

        let urgency_index = IndexModel::builder()
            .keys(doc! { "verified": 1, "endDateToRaise": 1 })
            .build();
        self.fundraisers.create_index(urgency_index, None).await?;

        // 按支付凭证查重
        let payment_ref_index = IndexModel::builder().keys(doc! { "paymentRefs": 1 }).build();
        self.fundraisers.create_index(payment_ref_index, None).await?;

        let payment_id_index = IndexModel::builder()
            .keys(doc! { "donationsArray.paymentId": 1 })
            .build();
        self.users.create_index(payment_id_index, None).await?;

        info!("✅ database indexes ready");
        Ok(())
    }
}
