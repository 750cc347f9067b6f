use chrono::{DateTime, Utc};
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};

/// Staff login account
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    pub email: String,
    #[sea_orm(column_type = "Text")]
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();
        if insert {
            active_model.created_at = Set(now);
        }
        active_model.updated_at = Set(now);
        Ok(active_model)
    }
}

/// Creates `username`, or resets the password of an existing account and reactivates it.
pub async fn upsert_account<C>(
    db: &C,
    username: &str,
    email: &str,
    password_hash: String,
) -> Result<Model, DbErr>
where
    C: ConnectionTrait,
{
    let existing = Entity::find()
        .filter(Column::Username.eq(username))
        .one(db)
        .await?;

    match existing {
        Some(account) => {
            let mut active: ActiveModel = account.into();
            active.email = Set(email.to_string());
            active.password_hash = Set(password_hash);
            active.is_active = Set(true);
            active.update(db).await
        }
        None => {
            ActiveModel {
                id: Set(Uuid::new_v4()),
                username: Set(username.to_string()),
                email: Set(email.to_string()),
                password_hash: Set(password_hash),
                is_active: Set(true),
                last_login: Set(None),
                ..Default::default()
            }
            .insert(db)
            .await
        }
    }
}
