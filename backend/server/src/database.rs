//! # Redis
//!
//! Document store for entries.
//!
//! ## Layout
//!
//! - `entries`: set of every entry id
//! - `entry:{id}`: hash per document with fields dish (**string**), calories (**float**),
//!   fat (**float**), ingredients (**JSON array string**)
//!
//! ## Atomicity
//!
//! - Create and delete run as MULTI/EXEC pipelines so the hash and the id set never disagree
//!   for longer than one command
//! - Partial updates run as a Lua script: existence check, compare, write, all inside Redis
//! - Listing is a set read followed by a pipelined HGETALL per id, ids whose hash vanished in
//!   between are skipped
use std::{collections::HashMap, fmt::Display, time::Duration};

use async_trait::async_trait;
use redis::{
    AsyncCommands, Client, RedisError, Script,
    aio::{ConnectionManager, ConnectionManagerConfig},
    pipe,
};
use tracing::info;

use crate::{
    entry::{Entry, EntryId, FieldUpdate},
    error::AppError,
    store::{EntryStore, UpdateOutcome},
};

pub const ENTRIES_KEY: &str = "entries";
pub const FIELD_DISH: &str = "dish";
pub const FIELD_CALORIES: &str = "calories";
pub const FIELD_FAT: &str = "fat";
pub const FIELD_INGREDIENTS: &str = "ingredients";

// ARGV holds field/value pairs. Returns -1 when the document is missing.
const UPDATE_SCRIPT: &str = r"
if redis.call('EXISTS', KEYS[1]) == 0 then
    return -1
end
local modified = 0
for i = 1, #ARGV, 2 do
    if redis.call('HGET', KEYS[1], ARGV[i]) ~= ARGV[i + 1] then
        redis.call('HSET', KEYS[1], ARGV[i], ARGV[i + 1])
        modified = 1
    end
end
return modified
";

pub async fn init_redis(redis_url: &str) -> Result<ConnectionManager, RedisError> {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(500));

    let client = Client::open(redis_url)?;
    let connection_manager = client.get_connection_manager_with_config(config).await?;

    info!("Connected to Redis at {redis_url}");

    Ok(connection_manager)
}

pub struct RedisStore {
    connection: ConnectionManager,
    update_script: Script,
}

impl RedisStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self {
            connection,
            update_script: Script::new(UPDATE_SCRIPT),
        }
    }
}

#[async_trait]
impl EntryStore for RedisStore {
    async fn insert(&self, entry: &Entry) -> Result<(), AppError> {
        let mut conn = self.connection.clone();
        let fields = encode_entry(entry)?;

        pipe()
            .atomic()
            .hset_multiple(entry_key(entry.id), fields.as_slice())
            .ignore()
            .sadd(ENTRIES_KEY, entry.id.to_string())
            .ignore()
            .query_async::<()>(&mut conn)
            .await?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<Entry>, AppError> {
        let mut conn = self.connection.clone();

        let ids: Vec<String> = conn.smembers(ENTRIES_KEY).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut lookups = pipe();
        for id in &ids {
            lookups.hgetall(entry_key(id));
        }
        let documents: Vec<HashMap<String, String>> = lookups.query_async(&mut conn).await?;

        ids.iter()
            .zip(documents)
            .filter(|(_, fields)| !fields.is_empty())
            .map(|(id, fields)| decode_entry(stored_id(id)?, fields))
            .collect()
    }

    async fn get(&self, id: EntryId) -> Result<Option<Entry>, AppError> {
        let mut conn = self.connection.clone();

        let fields: HashMap<String, String> = conn.hgetall(entry_key(id)).await?;
        if fields.is_empty() {
            return Ok(None);
        }

        decode_entry(id, fields).map(Some)
    }

    async fn update(
        &self,
        id: EntryId,
        changes: &[FieldUpdate],
    ) -> Result<UpdateOutcome, AppError> {
        let mut conn = self.connection.clone();

        let mut invocation = self.update_script.key(entry_key(id));
        for change in changes {
            let (field, value) = encode_field(change)?;
            invocation.arg(field).arg(value);
        }

        let modified: i64 = invocation.invoke_async(&mut conn).await?;

        Ok(match modified {
            n if n < 0 => UpdateOutcome::NoMatch,
            n => UpdateOutcome::Matched {
                modified: n as u64,
            },
        })
    }

    async fn delete(&self, id: EntryId) -> Result<u64, AppError> {
        let mut conn = self.connection.clone();

        let (deleted,): (u64,) = pipe()
            .atomic()
            .del(entry_key(id))
            .srem(ENTRIES_KEY, id.to_string())
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(deleted)
    }
}

pub fn entry_key(id: impl Display) -> String {
    format!("entry:{id}")
}

fn encode_entry(entry: &Entry) -> Result<Vec<(&'static str, String)>, AppError> {
    [
        FieldUpdate::Dish(entry.dish.clone()),
        FieldUpdate::Calories(entry.calories),
        FieldUpdate::Fat(entry.fat),
        FieldUpdate::Ingredients(entry.ingredients.clone()),
    ]
    .iter()
    .map(encode_field)
    .collect()
}

fn encode_field(change: &FieldUpdate) -> Result<(&'static str, String), AppError> {
    let value = match change {
        FieldUpdate::Dish(dish) => dish.clone(),
        FieldUpdate::Calories(amount) | FieldUpdate::Fat(amount) => amount.to_string(),
        FieldUpdate::Ingredients(ingredients) => serde_json::to_string(ingredients)
            .map_err(|e| AppError::StorageUnavailable(e.to_string()))?,
    };

    Ok((change.name(), value))
}

fn stored_id(raw: &str) -> Result<EntryId, AppError> {
    raw.parse()
        .map_err(|_| AppError::StorageUnavailable(format!("corrupt entry id '{raw}'")))
}

fn decode_entry(id: EntryId, fields: HashMap<String, String>) -> Result<Entry, AppError> {
    let corrupt = || AppError::StorageUnavailable(format!("corrupt document {id}"));

    let dish = fields.get(FIELD_DISH).cloned().ok_or_else(corrupt)?;
    let calories = fields
        .get(FIELD_CALORIES)
        .and_then(|v| v.parse().ok())
        .ok_or_else(corrupt)?;
    let fat = fields
        .get(FIELD_FAT)
        .and_then(|v| v.parse().ok())
        .ok_or_else(corrupt)?;
    let ingredients = fields
        .get(FIELD_INGREDIENTS)
        .and_then(|v| serde_json::from_str(v).ok())
        .ok_or_else(corrupt)?;

    Ok(Entry {
        id,
        dish,
        calories,
        fat,
        ingredients,
    })
}
