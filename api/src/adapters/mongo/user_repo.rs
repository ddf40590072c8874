//! MongoDB adapter for UserRepository

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Bson, Document};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{options::ReturnDocument, Collection};
use serde::{Deserialize, Serialize};

use super::MongoConnection;
use crate::domain::entities::{NewUser, User, UserFilter, UserId, UserUpdate};
use crate::domain::ports::UserRepository;
use crate::error::DomainError;

const COLLECTION: &str = "users";

/// Stored shape of a user
#[derive(Debug, Serialize, Deserialize)]
struct UserDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    name: String,
    email: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
}

impl From<UserDocument> for User {
    fn from(doc: UserDocument) -> Self {
        Self {
            id: UserId(doc.id),
            name: doc.name,
            email: doc.email,
            created_at: doc.created_at,
        }
    }
}

/// MongoDB implementation of UserRepository
pub struct MongoUserRepository {
    connection: MongoConnection,
}

impl MongoUserRepository {
    pub fn new(connection: MongoConnection) -> Self {
        Self { connection }
    }

    fn collection(&self) -> Result<Collection<UserDocument>, DomainError> {
        self.connection.collection(COLLECTION)
    }
}

/// Translate a query-string filter into a MongoDB equality filter.
///
/// `_id` values must be valid ObjectIds; every other value is matched as a string.
fn filter_document(filter: &UserFilter) -> Result<Document, DomainError> {
    let mut document = Document::new();
    for (field, value) in &filter.0 {
        let value = if field == "_id" {
            let id: UserId = value.parse()?;
            Bson::ObjectId(id.0)
        } else {
            Bson::String(value.clone())
        };
        document.insert(field.clone(), value);
    }
    Ok(document)
}

fn update_document(update: &UserUpdate) -> Document {
    let mut set = Document::new();
    if let Some(name) = &update.name {
        set.insert("name", name.clone());
    }
    if let Some(email) = &update.email {
        set.insert("email", email.clone());
    }
    doc! { "$set": set }
}

fn db_err(e: mongodb::error::Error) -> DomainError {
    DomainError::Database(e.to_string())
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, DomainError> {
        self.connection
            .query_mode()
            .check_fields(filter.fields(), UserFilter::KNOWN_FIELDS)?;

        let cursor = self
            .collection()?
            .find(filter_document(filter)?)
            .await
            .map_err(db_err)?;

        let documents: Vec<UserDocument> = cursor.try_collect().await.map_err(db_err)?;
        Ok(documents.into_iter().map(User::from).collect())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let result = self
            .collection()?
            .find_one(doc! { "_id": id.0 })
            .await
            .map_err(db_err)?;

        Ok(result.map(User::from))
    }

    async fn create(&self, user: &NewUser) -> Result<User, DomainError> {
        let document = UserDocument {
            id: ObjectId::new(),
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: Utc::now(),
        };

        self.collection()?
            .insert_one(&document)
            .await
            .map_err(db_err)?;

        Ok(document.into())
    }

    async fn update(
        &self,
        id: &UserId,
        update: &UserUpdate,
    ) -> Result<Option<User>, DomainError> {
        if update.is_empty() {
            return self.find_by_id(id).await;
        }

        let result = self
            .collection()?
            .find_one_and_update(doc! { "_id": id.0 }, update_document(update))
            .return_document(ReturnDocument::After)
            .await
            .map_err(db_err)?;

        Ok(result.map(User::from))
    }

    async fn delete(&self, id: &UserId) -> Result<bool, DomainError> {
        let result = self
            .collection()?
            .delete_one(doc! { "_id": id.0 })
            .await
            .map_err(db_err)?;

        Ok(result.deleted_count > 0)
    }
}
