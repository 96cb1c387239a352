//! Strategy type queries: a small reference table of named tags.

use tracing::info;
use uuid::Uuid;

use crate::config::{CHARTS_TABLE, DEFAULT_STRATEGIES, STRATEGY_TYPES_TABLE};
use crate::connection::Connection;
use crate::error::{JournalError, Result};
use crate::models::{format_instant, now, StrategyAudit, StrategyType};
use crate::queries::charts::distinct_strategy_values;
use crate::sql_builder::SqlBuilder;

/// Query interface for the `strategy_types` table.
pub struct StrategyTypeQuery<'a> {
    conn: &'a Connection,
}

impl<'a> StrategyTypeQuery<'a> {
    /// Create a new `StrategyTypeQuery` bound to the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn first(&self, qb: &mut SqlBuilder) -> Result<Option<StrategyType>> {
        let (sql, params) = qb.limit(1).build();
        Ok(self
            .conn
            .execute_into::<StrategyType>(&sql, &params)?
            .into_iter()
            .next())
    }

    /// All strategy types ordered by name, ignoring case.
    pub fn list(&self) -> Result<Vec<StrategyType>> {
        let (sql, params) = SqlBuilder::new(STRATEGY_TYPES_TABLE)
            .order_by(&["LOWER(name) ASC", "name ASC"])
            .build();
        self.conn.execute_into(&sql, &params)
    }

    pub fn get(&self, id: &str) -> Result<Option<StrategyType>> {
        self.first(SqlBuilder::new(STRATEGY_TYPES_TABLE).where_eq("id", id))
    }

    /// Case-insensitive exact name lookup.
    pub fn find_by_name(&self, name: &str) -> Result<Option<StrategyType>> {
        self.first(SqlBuilder::new(STRATEGY_TYPES_TABLE).where_eq_ignore_case("name", name.trim()))
    }

    /// Resolve a chart filter input: an id first, then a display name.
    pub fn resolve(&self, input: &str) -> Result<Option<StrategyType>> {
        let input = input.trim();
        match self.get(input)? {
            Some(st) => Ok(Some(st)),
            None => self.find_by_name(input),
        }
    }

    /// Insert a new strategy type. Names are unique ignoring case.
    pub fn create(&self, name: &str) -> Result<StrategyType> {
        let name = name.trim();
        if name.is_empty() {
            return Err(JournalError::InvalidArgument(
                "strategy name is required".into(),
            ));
        }
        if let Some(existing) = self.find_by_name(name)? {
            return Err(JournalError::AlreadyExists(format!(
                "strategy type '{}' already exists",
                existing.name
            )));
        }

        let st = StrategyType {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            created_at: now(),
        };
        self.conn.execute_update(
            &format!(
                "INSERT INTO {} (id, name, createdAt) VALUES (?, ?, ?)",
                STRATEGY_TYPES_TABLE
            ),
            &[&st.id, &st.name, &format_instant(&st.created_at)],
        )?;
        info!("Created strategy type '{}' ({})", st.name, st.id);
        Ok(st)
    }

    /// Number of charts referencing `st` by id or by legacy name.
    pub fn reference_count(&self, st: &StrategyType) -> Result<usize> {
        let (sql, params) = SqlBuilder::new(CHARTS_TABLE)
            .where_or(&[
                ("strategyType = ?", st.id.as_str()),
                ("LOWER(strategyType) = LOWER(?)", st.name.as_str()),
            ])
            .build_count();
        let n = self
            .conn
            .execute_scalar(&sql, &params)?
            .and_then(|v| v.as_i64())
            .unwrap_or(0);
        Ok(n as usize)
    }

    /// Delete an unreferenced strategy type.
    pub fn delete(&self, id: &str) -> Result<()> {
        let st = self
            .get(id)?
            .ok_or_else(|| JournalError::NotFound(format!("strategy type {id}")))?;

        let refs = self.reference_count(&st)?;
        if refs > 0 {
            return Err(JournalError::InUse(format!(
                "strategy type '{}' is used by {} chart(s)",
                st.name, refs
            )));
        }

        let removed = self.conn.execute_update(
            &format!("DELETE FROM {} WHERE id = ?", STRATEGY_TYPES_TABLE),
            &[&st.id],
        )?;
        if removed == 0 {
            return Err(JournalError::NotFound(format!("strategy type {id}")));
        }
        info!("Deleted strategy type '{}' ({})", st.name, st.id);
        Ok(())
    }

    /// Insert the default strategy names that are not present yet.
    ///
    /// With `replace`, unreferenced strategy types are removed first.
    /// Returns the number of strategy types inserted.
    pub fn seed_defaults(&self, replace: bool) -> Result<usize> {
        if replace {
            for st in self.list()? {
                if self.reference_count(&st)? == 0 {
                    self.delete(&st.id)?;
                }
            }
        }

        let mut inserted = 0;
        for name in DEFAULT_STRATEGIES {
            if self.find_by_name(name)?.is_none() {
                self.create(name)?;
                inserted += 1;
            }
        }
        info!("Seeded {} default strategy types", inserted);
        Ok(inserted)
    }

    /// Classify every distinct `strategyType` stored on charts.
    pub fn audit(&self) -> Result<StrategyAudit> {
        let known = self.list()?;
        let mut audit = StrategyAudit::default();
        // Fold case the way SQL LOWER() does in find_by_name and the delete guard.
        let names: Vec<String> = known.iter().map(|st| st.name.to_lowercase()).collect();
        for value in distinct_strategy_values(self.conn)? {
            if known.iter().any(|st| st.id == value) {
                audit.by_id.push(value);
            } else if names.contains(&value.to_lowercase()) {
                audit.by_name.push(value);
            } else {
                audit.unknown.push(value);
            }
        }
        Ok(audit)
    }

    /// Rewrite charts that reference a strategy type by name to use its id.
    ///
    /// Idempotent. Returns the number of charts rewritten.
    pub fn migrate_legacy_names(&self) -> Result<usize> {
        let sql = format!(
            "UPDATE {} SET strategyType = ? \
             WHERE LOWER(strategyType) = LOWER(?) AND strategyType <> ?",
            CHARTS_TABLE
        );
        let mut rewritten = 0;
        for st in self.list()? {
            let n = self
                .conn
                .execute_update(&sql, &[&st.id, &st.name, &st.id])?;
            if n > 0 {
                info!("Migrated {} chart(s) from '{}' to {}", n, st.name, st.id);
            }
            rewritten += n;
        }
        Ok(rewritten)
    }
}
