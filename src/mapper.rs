//! Generic data access for library entities.
//!
//! `Mapper<E>` implements the whole CRUD and query surface once, driven by the
//! metadata on `EntityModel`. Every query it emits is scoped to the owning user; the
//! scope predicate is prepended by `select_user_entities` and callers cannot opt out.

use std::marker::PhantomData;

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use tracing::{debug, error};

use crate::common::{sql_now, substring_like_pattern, Conjunction, MatchMode, SortBy};
use crate::dialect::{Dialect, SQLITE};
use crate::errors::{AriaError, Result};
use crate::entity::{EntityModel, Rateable, Starrable};
use crate::random::Randomizer;
use crate::rules::{RuleOperator, SearchRule};

/// Page of a result set. `limit` without `offset` and vice versa are both valid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Paging {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl Paging {
    pub const NONE: Paging = Paging { limit: None, offset: None };

    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Paging {
        Paging { limit, offset }
    }

    /// LIMIT/OFFSET clause with the counts spliced as integers. An offset without a
    /// limit needs the SQLite "no limit" marker since OFFSET cannot stand alone.
    pub(crate) fn to_sql(self) -> String {
        match (self.limit, self.offset) {
            (None, None) => String::new(),
            (Some(l), None) => format!("LIMIT {l}"),
            (None, Some(o)) => format!("LIMIT -1 OFFSET {o}"),
            (Some(l), Some(o)) => format!("LIMIT {l} OFFSET {o}"),
        }
    }
}

/// Optional half-open bounds on a timestamp column.
#[derive(Debug, Clone, Default)]
pub struct TimeRange {
    pub min: Option<String>,
    pub max: Option<String>,
}

impl TimeRange {
    pub const NONE: TimeRange = TimeRange { min: None, max: None };

    fn conditions(&self, column: &str, conds: &mut Vec<String>, params: &mut Vec<Value>) {
        if let Some(min) = &self.min {
            conds.push(format!("{column} >= ?"));
            params.push(Value::from(min.clone()));
        }
        if let Some(max) = &self.max {
            conds.push(format!("{column} <= ?"));
            params.push(Value::from(max.clone()));
        }
    }
}

pub struct Mapper<'c, E: EntityModel> {
    conn: &'c Connection,
    dialect: &'static dyn Dialect,
    _marker: PhantomData<E>,
}

impl<'c, E: EntityModel> Mapper<'c, E> {
    pub fn new(conn: &'c Connection) -> Mapper<'c, E> {
        Mapper::with_dialect(conn, &SQLITE)
    }

    pub fn with_dialect(conn: &'c Connection, dialect: &'static dyn Dialect) -> Mapper<'c, E> {
        Mapper { conn, dialect, _marker: PhantomData }
    }

    /// Build a SELECT with the mandatory user scope predicate prepended to the given
    /// condition. All reads flow through here.
    pub(crate) fn select_user_entities(&self, condition: &str, extension: &str) -> String {
        let scope = if condition.is_empty() {
            format!("{}.user_id = ?", E::TABLE)
        } else {
            format!("{}.user_id = ? AND ({condition})", E::TABLE)
        };
        E::select_sql(&scope, extension)
    }

    pub(crate) fn connection(&self) -> &Connection {
        self.conn
    }

    pub(crate) fn find_entities(&self, sql: &str, params: Vec<Value>) -> Result<Vec<E>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(params), E::from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<E>>>()?)
    }

    /// Run a query expected to match exactly one row.
    fn find_entity(&self, sql: &str, params: Vec<Value>) -> Result<E> {
        let mut entities = self.find_entities(sql, params)?;
        match entities.len() {
            0 => Err(AriaError::NotFound),
            1 => Ok(entities.remove(0)),
            n => {
                error!("query for a single {} entity matched {n} rows", E::TABLE);
                Err(AriaError::MultipleFound)
            }
        }
    }

    pub fn find(&self, id: i64, user_id: &str) -> Result<E> {
        let sql = self.select_user_entities(&format!("{}.id = ?", E::TABLE), "");
        self.find_entity(&sql, vec![Value::from(user_id.to_string()), Value::Integer(id)])
    }

    /// Entities with the given ids, in id order. Ids belonging to other users are
    /// silently dropped.
    pub fn find_by_id(&self, ids: &[i64], user_id: &str) -> Result<Vec<E>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let cond = format!("{}.id IN ({})", E::TABLE, question_marks(ids.len()));
        let sql = self.select_user_entities(&cond, &format!("ORDER BY {}.id", E::TABLE));
        let mut params = vec![Value::from(user_id.to_string())];
        params.extend(ids.iter().map(|id| Value::Integer(*id)));
        self.find_entities(&sql, params)
    }

    /// Like `find_by_id` but across all users, for maintenance tasks that operate on
    /// the whole library.
    pub fn find_by_id_any_user(&self, ids: &[i64]) -> Result<Vec<E>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let cond = format!("{}.id IN ({})", E::TABLE, question_marks(ids.len()));
        let sql = E::select_sql(&cond, &format!("ORDER BY {}.id", E::TABLE));
        let params: Vec<Value> = ids.iter().map(|id| Value::Integer(*id)).collect();
        self.find_entities(&sql, params)
    }

    pub fn find_all(
        &self,
        user_id: &str,
        sort: SortBy,
        paging: Paging,
        created: &TimeRange,
        updated: &TimeRange,
    ) -> Result<Vec<E>> {
        let mut conds: Vec<String> = Vec::new();
        let mut params = vec![Value::from(user_id.to_string())];
        created.conditions(&format!("{}.created", E::TABLE), &mut conds, &mut params);
        updated.conditions(&format!("{}.updated", E::TABLE), &mut conds, &mut params);
        let condition = conds.join(" AND ");
        let order = E::sorting_clause(sort, false).unwrap_or_default();
        let sql = self.select_user_entities(&condition, &format!("{order} {}", paging.to_sql()));
        self.find_entities(&sql, params)
    }

    /// Entities matching a name. A `None` name matches rows whose name is NULL.
    pub fn find_all_by_name(
        &self,
        user_id: &str,
        name: Option<&str>,
        match_mode: MatchMode,
        paging: Paging,
    ) -> Result<Vec<E>> {
        let col = format!("{}.{}", E::TABLE, E::NAME_COLUMN);
        let mut params = vec![Value::from(user_id.to_string())];
        let condition = match name {
            None => format!("{col} IS NULL"),
            Some(name) => match match_mode {
                MatchMode::Exact => {
                    params.push(Value::from(name.to_string()));
                    format!("LOWER({col}) = LOWER(?)")
                }
                MatchMode::Wildcards => {
                    params.push(Value::from(name.to_string()));
                    format!("LOWER({col}) LIKE LOWER(?)")
                }
                MatchMode::Substring => {
                    params.push(Value::from(substring_like_pattern(name)));
                    format!("LOWER({col}) LIKE LOWER(?)")
                }
            },
        };
        let sql =
            self.select_user_entities(&condition, &format!("ORDER BY LOWER({col}) {}", paging.to_sql()));
        self.find_entities(&sql, params)
    }

    pub fn count(&self, user_id: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE user_id = ?", E::TABLE);
        Ok(self.conn.query_row(&sql, [user_id], |row| row.get(0))?)
    }

    pub fn exists(&self, id: i64, user_id: &str) -> Result<bool> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE id = ? AND user_id = ?", E::TABLE);
        let n: i64 = self
            .conn
            .query_row(&sql, rusqlite::params![id, user_id], |row| row.get(0))?;
        Ok(n > 0)
    }

    /// All ids of the user's entities. With `candidates`, only ids from that set which
    /// actually exist are returned, in id order.
    pub fn find_all_ids(&self, user_id: &str, candidates: Option<&[i64]>) -> Result<Vec<i64>> {
        let mut params = vec![Value::from(user_id.to_string())];
        let sql = match candidates {
            None => format!("SELECT id FROM {} WHERE user_id = ? ORDER BY id", E::TABLE),
            Some(ids) => {
                params.extend(ids.iter().map(|id| Value::Integer(*id)));
                format!(
                    "SELECT id FROM {} WHERE user_id = ? AND id IN ({}) ORDER BY id",
                    E::TABLE,
                    question_marks(ids.len()),
                )
            }
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params), |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<i64>>>()?)
    }

    /// Highest id among the user's entities, if any exist.
    pub fn max_id(&self, user_id: &str) -> Result<Option<i64>> {
        let sql = format!("SELECT MAX(id) FROM {} WHERE user_id = ?", E::TABLE);
        Ok(self.conn.query_row(&sql, [user_id], |row| row.get(0))?)
    }

    /// Timestamp of the most recently inserted row, if any.
    pub fn latest_insert_time(&self, user_id: &str) -> Result<Option<String>> {
        let sql = format!("SELECT MAX(created) FROM {} WHERE user_id = ?", E::TABLE);
        Ok(self.conn.query_row(&sql, [user_id], |row| row.get(0))?)
    }

    pub fn latest_update_time(&self, user_id: &str) -> Result<Option<String>> {
        let sql = format!("SELECT MAX(updated) FROM {} WHERE user_id = ?", E::TABLE);
        Ok(self.conn.query_row(&sql, [user_id], |row| row.get(0))?)
    }

    /// Insert the entity, stamping `created` and `updated`, and store the new row id
    /// back on it. A unique-constraint violation surfaces as `UniqueConflict`.
    pub fn insert(&self, entity: &mut E) -> Result<()> {
        let now = sql_now();
        entity.set_created(now.clone());
        entity.set_updated(now);
        let columns = entity.content_columns();
        let names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
        let mut params: Vec<Value> = columns.into_iter().map(|(_, value)| value).collect();
        params.push(Value::from(entity.created().to_string()));
        params.push(Value::from(entity.updated().to_string()));
        let sql = format!(
            "INSERT INTO {} ({}, created, updated) VALUES ({})",
            E::TABLE,
            names.join(", "),
            question_marks(params.len()),
        );
        match self.conn.execute(&sql, params_from_iter(params)) {
            Ok(_) => {
                entity.set_id(self.conn.last_insert_rowid());
                debug!("inserted {} {}", E::TABLE, entity.id());
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(AriaError::UniqueConflict)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Update the entity's content columns by id, stamping `updated`. Updating a row
    /// that does not exist (or belongs to another user) is `NotFound`.
    pub fn update(&self, entity: &mut E) -> Result<()> {
        entity.set_updated(sql_now());
        let columns = entity.content_columns();
        let assignments: Vec<String> =
            columns.iter().map(|(name, _)| format!("{name} = ?")).collect();
        let mut params: Vec<Value> = columns.into_iter().map(|(_, value)| value).collect();
        params.push(Value::from(entity.updated().to_string()));
        params.push(Value::Integer(entity.id()));
        params.push(Value::from(entity.user_id().to_string()));
        let sql = format!(
            "UPDATE {} SET {}, updated = ? WHERE id = ? AND user_id = ?",
            E::TABLE,
            assignments.join(", "),
        );
        let affected = self.conn.execute(&sql, params_from_iter(params))?;
        if affected == 0 {
            return Err(AriaError::NotFound);
        }
        Ok(())
    }

    /// Insert, or on a unique conflict update the conflicting row in place. The
    /// existing row's id and `created` timestamp are preserved.
    pub fn insert_or_update(&self, entity: &mut E) -> Result<()> {
        match self.insert(entity) {
            Ok(()) => Ok(()),
            Err(AriaError::UniqueConflict) => {
                let existing = self.find_unique(entity)?;
                entity.set_id(existing.id());
                entity.set_created(existing.created().to_string());
                self.update(entity)
            }
            Err(e) => Err(e),
        }
    }

    /// Like `insert_or_update` but probes for the existing row first. Cheaper when
    /// updates dominate, e.g. on a rescan of an unchanged library.
    pub fn update_or_insert(&self, entity: &mut E) -> Result<()> {
        match self.find_unique(entity) {
            Ok(existing) => {
                entity.set_id(existing.id());
                entity.set_created(existing.created().to_string());
                self.update(entity)
            }
            Err(AriaError::NotFound) => self.insert_or_update(entity),
            Err(e) => Err(e),
        }
    }

    /// The already-stored row matching the entity's unique columns.
    fn find_unique(&self, entity: &E) -> Result<E> {
        if E::UNIQUE_COLUMNS.is_empty() {
            return Err(AriaError::Generic(format!(
                "{} has no unique columns to upsert on",
                E::TABLE
            )));
        }
        let values: Vec<(&str, Value)> = entity.content_columns();
        let mut conds: Vec<String> = Vec::new();
        let mut params = vec![Value::from(entity.user_id().to_string())];
        for unique in E::UNIQUE_COLUMNS {
            let (_, value) = values
                .iter()
                .find(|(name, _)| name == unique)
                .ok_or_else(|| {
                    AriaError::Generic(format!("unique column {unique} missing from {}", E::TABLE))
                })?;
            conds.push(format!("{}.{unique} = ?", E::TABLE));
            params.push(value.clone());
        }
        let sql = self.select_user_entities(&conds.join(" AND "), "");
        self.find_entity(&sql, params)
    }

    pub fn delete_by_id(&self, ids: &[i64], user_id: &str) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let sql = format!(
            "DELETE FROM {} WHERE user_id = ? AND id IN ({})",
            E::TABLE,
            question_marks(ids.len()),
        );
        let mut params = vec![Value::from(user_id.to_string())];
        params.extend(ids.iter().map(|id| Value::Integer(*id)));
        Ok(self.conn.execute(&sql, params_from_iter(params))?)
    }

    pub fn delete_all(&self, user_id: &str) -> Result<usize> {
        let sql = format!("DELETE FROM {} WHERE user_id = ?", E::TABLE);
        Ok(self.conn.execute(&sql, [user_id])?)
    }

    /// Compile and run an advanced search: every rule becomes one SQL fragment with
    /// its own bound values, joined by the conjunction inside the user scope.
    pub fn find_all_advanced(
        &self,
        conjunction: Conjunction,
        rules: &[SearchRule],
        user_id: &str,
        sort: SortBy,
        randomizer: Option<&Randomizer>,
        paging: Paging,
    ) -> Result<Vec<E>> {
        let mut conds: Vec<String> = Vec::new();
        let mut params = vec![Value::from(user_id.to_string())];
        for rule in rules {
            let op = RuleOperator::interpret(
                &rule.rule,
                &rule.operator,
                &rule.input,
                user_id,
                self.dialect,
            )?;
            let compiled = E::advanced_rule(&rule.rule, &op, self.dialect)?;
            conds.push(format!("({})", compiled.sql));
            params.extend(compiled.params);
        }
        let condition = conds.join(&format!(" {} ", conjunction.as_sql()));

        if let Some(randomizer) = randomizer {
            // Random order cannot be paged in SQL while staying stable across calls;
            // fetch the whole result and let the randomizer pick the page.
            let order = E::sorting_clause(SortBy::Name, false).unwrap_or_default();
            let sql = self.select_user_entities(&condition, &order);
            debug!("advanced search on {}: {sql}", E::TABLE);
            let entities = self.find_entities(&sql, params)?;
            let indices = randomizer.pick_indices(
                entities.len(),
                paging.offset.unwrap_or(0) as usize,
                paging.limit.map(|l| l as usize),
                user_id,
                &format!("{}_advanced", E::TABLE),
            );
            let mut entities: Vec<Option<E>> = entities.into_iter().map(Some).collect();
            return Ok(indices
                .into_iter()
                .filter_map(|i| entities[i].take())
                .collect());
        }

        let order = E::sorting_clause(sort, false).unwrap_or_default();
        let sql = self.select_user_entities(&condition, &format!("{order} {}", paging.to_sql()));
        debug!("advanced search on {}: {sql}", E::TABLE);
        self.find_entities(&sql, params)
    }
}

impl<'c, E: Starrable> Mapper<'c, E> {
    /// Star or unstar the given entities. Returns the number of rows changed.
    pub fn set_starred_date(
        &self,
        starred: Option<&str>,
        ids: &[i64],
        user_id: &str,
    ) -> Result<usize> {
        let col = E::STARRED_COLUMN
            .ok_or_else(|| AriaError::Generic(format!("{} is not starrable", E::TABLE)))?;
        if ids.is_empty() {
            return Ok(0);
        }
        let sql = format!(
            "UPDATE {} SET {col} = ? WHERE user_id = ? AND id IN ({})",
            E::TABLE,
            question_marks(ids.len()),
        );
        let mut params = vec![
            starred.map(|s| Value::from(s.to_string())).unwrap_or(Value::Null),
            Value::from(user_id.to_string()),
        ];
        params.extend(ids.iter().map(|id| Value::Integer(*id)));
        Ok(self.conn.execute(&sql, params_from_iter(params))?)
    }

    pub fn find_all_starred(&self, user_id: &str, paging: Paging) -> Result<Vec<E>> {
        let col = E::STARRED_COLUMN
            .ok_or_else(|| AriaError::Generic(format!("{} is not starrable", E::TABLE)))?;
        let t = E::TABLE;
        let condition = format!("{t}.{col} IS NOT NULL");
        let extension = format!(
            "ORDER BY LOWER({t}.{}) ASC {}",
            E::NAME_COLUMN,
            paging.to_sql()
        );
        let sql = self.select_user_entities(&condition, &extension);
        self.find_entities(&sql, vec![Value::from(user_id.to_string())])
    }
}

impl<'c, E: Rateable> Mapper<'c, E> {
    /// Set the 0..=5 rating on the given entities. Returns the number of rows changed.
    pub fn set_rating(&self, rating: i64, ids: &[i64], user_id: &str) -> Result<usize> {
        let col = E::RATING_COLUMN
            .ok_or_else(|| AriaError::Generic(format!("{} is not rateable", E::TABLE)))?;
        if ids.is_empty() {
            return Ok(0);
        }
        let rating = rating.clamp(0, 5);
        let sql = format!(
            "UPDATE {} SET {col} = ? WHERE user_id = ? AND id IN ({})",
            E::TABLE,
            question_marks(ids.len()),
        );
        let mut params = vec![Value::Integer(rating), Value::from(user_id.to_string())];
        params.extend(ids.iter().map(|id| Value::Integer(*id)));
        Ok(self.conn.execute(&sql, params_from_iter(params))?)
    }

    /// Rated entities of the user, best first.
    pub fn find_all_rated(&self, user_id: &str, paging: Paging) -> Result<Vec<E>> {
        let col = E::RATING_COLUMN
            .ok_or_else(|| AriaError::Generic(format!("{} is not rateable", E::TABLE)))?;
        let t = E::TABLE;
        let condition = format!("{t}.{col} > 0");
        let extension = format!(
            "ORDER BY {t}.{col} DESC, LOWER({t}.{}) ASC {}",
            E::NAME_COLUMN,
            paging.to_sql()
        );
        let sql = self.select_user_entities(&condition, &extension);
        self.find_entities(&sql, vec![Value::from(user_id.to_string())])
    }
}

pub(crate) fn question_marks(count: usize) -> String {
    vec!["?"; count].join(", ")
}
