//! Parameterized query builders for stakeholder listing and partial updates.
//!
//! Both builders emit SQL with numbered placeholders and a matching list of
//! [`QueryParam`]s in placeholder order. No caller-supplied value is ever
//! interpolated into the SQL text.

use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::Postgres;
use uuid::Uuid;

use cerberus_core::defaults;
use cerberus_core::{
    parse_engagement_level, parse_stakeholder_type, Error, Result, StakeholderFilter,
    UpdateStakeholderRequest,
};

/// Columns selected for a full `Stakeholder` row.
pub const STAKEHOLDER_COLUMNS: &str = "stakeholder_id, program_id, person_name, email, role, \
     organization, stakeholder_type, is_internal, engagement_level, department, influence, \
     notes, created_at, updated_at";

/// Type-safe parameter binding for SQL queries.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    /// Single UUID parameter.
    Uuid(Uuid),
    /// Boolean parameter.
    Bool(bool),
    /// 64-bit integer parameter (limits and offsets).
    BigInt(i64),
    /// String parameter.
    String(String),
}

/// Bind parameters in order onto a query.
pub fn bind_params(
    mut q: Query<'_, Postgres, PgArguments>,
    params: Vec<QueryParam>,
) -> Query<'_, Postgres, PgArguments> {
    for param in params {
        q = match param {
            QueryParam::Uuid(id) => q.bind(id),
            QueryParam::Bool(b) => q.bind(b),
            QueryParam::BigInt(n) => q.bind(n),
            QueryParam::String(s) => q.bind(s),
        };
    }
    q
}

// =============================================================================
// LIST
// =============================================================================

/// Builds the stakeholder listing query from a [`StakeholderFilter`].
///
/// # Example
///
/// ```rust,ignore
/// let (sql, params) = StakeholderListQuery::new(&filter).build()?;
/// // sql: "SELECT ... WHERE program_id = $1 AND deleted_at IS NULL
/// //       AND is_internal = $2 ORDER BY person_name ASC LIMIT $3"
/// ```
pub struct StakeholderListQuery<'a> {
    filter: &'a StakeholderFilter,
}

impl<'a> StakeholderListQuery<'a> {
    pub fn new(filter: &'a StakeholderFilter) -> Self {
        Self { filter }
    }

    /// Effective page size: the default when unset, capped at the maximum.
    pub fn effective_limit(&self) -> Result<i64> {
        match self.filter.limit {
            None => Ok(defaults::PAGE_LIMIT),
            Some(n) if n < 1 => Err(Error::InvalidInput("limit must be >= 1".to_string())),
            Some(n) => Ok(n.min(defaults::PAGE_LIMIT_MAX)),
        }
    }

    pub fn build(&self) -> Result<(String, Vec<QueryParam>)> {
        let limit = self.effective_limit()?;
        let offset = self.filter.offset.unwrap_or(0);
        if offset < 0 {
            return Err(Error::InvalidInput("offset must be >= 0".to_string()));
        }

        let mut sql = format!(
            "SELECT {} FROM program_stakeholders WHERE program_id = $1 AND deleted_at IS NULL",
            STAKEHOLDER_COLUMNS
        );
        let mut params = vec![QueryParam::Uuid(self.filter.program_id)];

        if let Some(t) = self.filter.stakeholder_type {
            params.push(QueryParam::String(t.as_str().to_string()));
            sql.push_str(&format!(" AND stakeholder_type = ${}", params.len()));
        }
        if let Some(internal) = self.filter.is_internal {
            params.push(QueryParam::Bool(internal));
            sql.push_str(&format!(" AND is_internal = ${}", params.len()));
        }
        if let Some(level) = self.filter.engagement_level {
            params.push(QueryParam::String(level.as_str().to_string()));
            sql.push_str(&format!(" AND engagement_level = ${}", params.len()));
        }

        sql.push_str(" ORDER BY person_name ASC, stakeholder_id ASC");

        params.push(QueryParam::BigInt(limit));
        sql.push_str(&format!(" LIMIT ${}", params.len()));

        if offset > 0 {
            params.push(QueryParam::BigInt(offset));
            sql.push_str(&format!(" OFFSET ${}", params.len()));
        }

        Ok((sql, params))
    }
}

// =============================================================================
// UPDATE
// =============================================================================

/// Builds a partial `UPDATE` for the fields present in an
/// [`UpdateStakeholderRequest`], validating them on the way.
pub struct StakeholderUpdateQuery<'a> {
    program_id: Uuid,
    stakeholder_id: Uuid,
    req: &'a UpdateStakeholderRequest,
}

impl<'a> StakeholderUpdateQuery<'a> {
    pub fn new(program_id: Uuid, stakeholder_id: Uuid, req: &'a UpdateStakeholderRequest) -> Self {
        Self {
            program_id,
            stakeholder_id,
            req,
        }
    }

    pub fn build(&self) -> Result<(String, Vec<QueryParam>)> {
        if self.req.is_empty() {
            return Err(Error::InvalidInput("no fields to update".to_string()));
        }

        let mut sets: Vec<String> = Vec::new();
        let mut params: Vec<QueryParam> = Vec::new();
        let mut push = |column: &str, param: QueryParam| {
            params.push(param);
            sets.push(format!("{} = ${}", column, params.len()));
        };

        if let Some(name) = &self.req.person_name {
            let name = name.trim();
            if name.is_empty() {
                return Err(Error::InvalidInput("person_name cannot be empty".to_string()));
            }
            push("person_name", QueryParam::String(name.to_string()));
        }
        if let Some(t) = &self.req.stakeholder_type {
            let parsed = parse_stakeholder_type(t)?;
            push("stakeholder_type", QueryParam::String(parsed.as_str().to_string()));
        }
        if let Some(internal) = self.req.is_internal {
            push("is_internal", QueryParam::Bool(internal));
        }
        if let Some(level) = &self.req.engagement_level {
            let parsed = parse_engagement_level(level)?;
            push("engagement_level", QueryParam::String(parsed.as_str().to_string()));
        }
        for (column, value) in [
            ("email", &self.req.email),
            ("role", &self.req.role),
            ("organization", &self.req.organization),
            ("department", &self.req.department),
            ("influence", &self.req.influence),
            ("notes", &self.req.notes),
        ] {
            if let Some(v) = value {
                push(column, QueryParam::String(v.clone()));
            }
        }

        params.push(QueryParam::Uuid(self.stakeholder_id));
        let id_idx = params.len();
        params.push(QueryParam::Uuid(self.program_id));
        let program_idx = params.len();

        let sql = format!(
            "UPDATE program_stakeholders SET {}, updated_at = NOW() \
             WHERE stakeholder_id = ${} AND program_id = ${} AND deleted_at IS NULL \
             RETURNING {}",
            sets.join(", "),
            id_idx,
            program_idx,
            STAKEHOLDER_COLUMNS
        );

        Ok((sql, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cerberus_core::{EngagementLevel, StakeholderType};

    fn program() -> Uuid {
        Uuid::from_u128(7)
    }

    #[test]
    fn test_list_without_filters() {
        let filter = StakeholderFilter {
            program_id: program(),
            ..Default::default()
        };
        let (sql, params) = StakeholderListQuery::new(&filter).build().unwrap();
        assert!(sql.ends_with(
            "WHERE program_id = $1 AND deleted_at IS NULL ORDER BY person_name ASC, stakeholder_id ASC LIMIT $2"
        ));
        assert_eq!(
            params,
            vec![QueryParam::Uuid(program()), QueryParam::BigInt(50)]
        );
    }

    #[test]
    fn test_list_with_all_filters_and_offset() {
        let filter = StakeholderFilter {
            program_id: program(),
            stakeholder_type: Some(StakeholderType::Vendor),
            is_internal: Some(false),
            engagement_level: Some(EngagementLevel::Key),
            limit: Some(10),
            offset: Some(20),
        };
        let (sql, params) = StakeholderListQuery::new(&filter).build().unwrap();
        assert!(sql.contains(
            "AND stakeholder_type = $2 AND is_internal = $3 AND engagement_level = $4 ORDER BY"
        ));
        assert!(sql.ends_with("LIMIT $5 OFFSET $6"));
        assert_eq!(params.len(), 6);
        assert_eq!(params[1], QueryParam::String("vendor".into()));
        assert_eq!(params[2], QueryParam::Bool(false));
        assert_eq!(params[3], QueryParam::String("key".into()));
        assert_eq!(params[4], QueryParam::BigInt(10));
        assert_eq!(params[5], QueryParam::BigInt(20));
    }

    #[test]
    fn test_list_placeholders_follow_present_filters() {
        let filter = StakeholderFilter {
            program_id: program(),
            engagement_level: Some(EngagementLevel::Observer),
            ..Default::default()
        };
        let (sql, params) = StakeholderListQuery::new(&filter).build().unwrap();
        assert!(sql.contains("AND engagement_level = $2"));
        assert!(sql.ends_with("LIMIT $3"));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_list_limit_is_capped() {
        let filter = StakeholderFilter {
            program_id: program(),
            limit: Some(10_000),
            ..Default::default()
        };
        let q = StakeholderListQuery::new(&filter);
        assert_eq!(q.effective_limit().unwrap(), defaults::PAGE_LIMIT_MAX);
    }

    #[test]
    fn test_list_rejects_bad_pagination() {
        let zero = StakeholderFilter {
            program_id: program(),
            limit: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            StakeholderListQuery::new(&zero).build(),
            Err(Error::InvalidInput(_))
        ));

        let negative = StakeholderFilter {
            program_id: program(),
            offset: Some(-1),
            ..Default::default()
        };
        assert!(matches!(
            StakeholderListQuery::new(&negative).build(),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_update_requires_fields() {
        let req = UpdateStakeholderRequest::default();
        let err = StakeholderUpdateQuery::new(program(), Uuid::nil(), &req)
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: no fields to update");
    }

    #[test]
    fn test_update_builds_set_clause_in_order() {
        let req = UpdateStakeholderRequest {
            person_name: Some(" Jon Smith ".into()),
            is_internal: Some(true),
            notes: Some("prefers email".into()),
            ..Default::default()
        };
        let id = Uuid::from_u128(99);
        let (sql, params) = StakeholderUpdateQuery::new(program(), id, &req)
            .build()
            .unwrap();
        assert!(sql.starts_with(
            "UPDATE program_stakeholders SET person_name = $1, is_internal = $2, notes = $3, updated_at = NOW() WHERE stakeholder_id = $4 AND program_id = $5 AND deleted_at IS NULL RETURNING "
        ));
        assert_eq!(params[0], QueryParam::String("Jon Smith".into()));
        assert_eq!(params[3], QueryParam::Uuid(id));
        assert_eq!(params[4], QueryParam::Uuid(program()));
    }

    #[test]
    fn test_update_validates_enums() {
        let req = UpdateStakeholderRequest {
            stakeholder_type: Some("rival".into()),
            ..Default::default()
        };
        assert!(StakeholderUpdateQuery::new(program(), Uuid::nil(), &req)
            .build()
            .is_err());

        let req = UpdateStakeholderRequest {
            engagement_level: Some("PRIMARY".into()),
            ..Default::default()
        };
        let (_, params) = StakeholderUpdateQuery::new(program(), Uuid::nil(), &req)
            .build()
            .unwrap();
        assert_eq!(params[0], QueryParam::String("primary".into()));
    }

    #[test]
    fn test_update_rejects_blank_name() {
        let req = UpdateStakeholderRequest {
            person_name: Some("   ".into()),
            ..Default::default()
        };
        assert!(StakeholderUpdateQuery::new(program(), Uuid::nil(), &req)
            .build()
            .is_err());
    }
}
