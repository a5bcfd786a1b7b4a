//! Translate caller-supplied [`FilterCriteria`] into a sea-orm predicate.
//!
//! Every entity declares a [`FilterSpec`] naming the columns each criterion
//! maps to. Criteria the entity does not support are rejected instead of
//! ignored, and malformed dates fail with the offending field name.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use sea_orm::{
    sea_query::{DynIden, Expr, Func, IntoIden, LikeExpr, SimpleExpr},
    ColumnTrait, Condition, EntityName, EntityTrait, JoinType, QueryFilter, QuerySelect, RelationDef, Select,
};
use serde::Deserialize;

use crate::errors::ServiceError;

/// The one filter shape every list operation accepts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(alias = "assignedTo")]
    pub owner_id: Option<i32>,
    /// `true` for records with an assignee, `false` for unassigned ones.
    pub assigned: Option<bool>,
    pub related_id: Option<i32>,
    /// Single day, `YYYY-MM-DD` (or an RFC 3339 instant whose UTC day is used).
    pub date: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    /// `true` keeps records dated from now on, `false` those before now.
    pub upcoming: Option<bool>,
    pub search: Option<String>,
}

impl FilterCriteria {
    pub fn search(term: impl Into<String>) -> Self {
        Self { search: Some(term.into()), ..Default::default() }
    }

    pub fn status(status: impl Into<String>) -> Self {
        Self { status: Some(status.into()), ..Default::default() }
    }
}

/// A text column reached through a one-hop relation, searched alongside the
/// entity's own columns.
#[derive(Clone)]
pub struct RelatedSearch {
    relation: fn() -> RelationDef,
    table: DynIden,
    column: DynIden,
}

impl RelatedSearch {
    pub fn new<R: EntityTrait>(relation: fn() -> RelationDef, column: R::Column) -> Self {
        Self { relation, table: R::default().into_iden(), column: column.into_iden() }
    }
}

/// Which criteria an entity supports and the columns they bind to.
#[derive(Clone)]
pub struct FilterSpec<E: EntityTrait> {
    status: Option<E::Column>,
    kind: Option<E::Column>,
    owner: Option<E::Column>,
    assignee: Option<E::Column>,
    related: Option<E::Column>,
    date: Option<E::Column>,
    upcoming: bool,
    search: Vec<E::Column>,
    related_search: Option<RelatedSearch>,
}

impl<E: EntityTrait> Default for FilterSpec<E> {
    fn default() -> Self {
        Self {
            status: None,
            kind: None,
            owner: None,
            assignee: None,
            related: None,
            date: None,
            upcoming: false,
            search: Vec::new(),
            related_search: None,
        }
    }
}

/// Compiled filter: a condition plus the joins it needs.
#[derive(Clone, Debug)]
pub struct Predicate {
    condition: Condition,
    joins: Vec<fn() -> RelationDef>,
}

impl Predicate {
    pub fn apply<E: EntityTrait>(&self, select: Select<E>) -> Select<E> {
        let mut select = select;
        for rel in &self.joins {
            select = select.join(JoinType::LeftJoin, rel());
        }
        select.filter(self.condition.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.condition.is_empty() && self.joins.is_empty()
    }
}

enum Bound {
    Day(NaiveDate),
    Instant(DateTime<FixedOffset>),
}

impl<E: EntityTrait> FilterSpec<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, col: E::Column) -> Self {
        self.status = Some(col);
        self
    }

    pub fn kind(mut self, col: E::Column) -> Self {
        self.kind = Some(col);
        self
    }

    pub fn owner(mut self, col: E::Column) -> Self {
        self.owner = Some(col);
        self
    }

    /// Nullable column checked by `assigned`.
    pub fn assignee(mut self, col: E::Column) -> Self {
        self.assignee = Some(col);
        self
    }

    pub fn related(mut self, col: E::Column) -> Self {
        self.related = Some(col);
        self
    }

    pub fn date(mut self, col: E::Column) -> Self {
        self.date = Some(col);
        self
    }

    /// Allow `upcoming` against the date column.
    pub fn upcoming(mut self) -> Self {
        self.upcoming = true;
        self
    }

    pub fn search(mut self, cols: impl IntoIterator<Item = E::Column>) -> Self {
        self.search.extend(cols);
        self
    }

    pub fn related_search(mut self, related: RelatedSearch) -> Self {
        self.related_search = Some(related);
        self
    }

    pub fn compile(&self, criteria: &FilterCriteria) -> Result<Predicate, ServiceError> {
        let mut cond = Condition::all();
        let mut joins = Vec::new();

        if let Some(status) = &criteria.status {
            cond = cond.add(self.require(self.status, "status")?.eq(status.clone()));
        }
        if let Some(kind) = &criteria.kind {
            cond = cond.add(self.require(self.kind, "type")?.eq(kind.clone()));
        }
        if let Some(owner) = criteria.owner_id {
            cond = cond.add(self.require(self.owner, "ownerId")?.eq(owner));
        }
        if let Some(assigned) = criteria.assigned {
            let col = self.require(self.assignee, "assigned")?;
            cond = cond.add(if assigned { col.is_not_null() } else { col.is_null() });
        }
        if let Some(related) = criteria.related_id {
            cond = cond.add(self.require(self.related, "relatedId")?.eq(related));
        }

        if let Some(dates) = self.date_condition(criteria)? {
            cond = cond.add(dates);
        }
        if let Some(upcoming) = criteria.upcoming {
            if !self.upcoming {
                return Err(self.unsupported("upcoming"));
            }
            let col = self.require(self.date, "upcoming")?;
            let now: DateTime<FixedOffset> = Utc::now().into();
            cond = cond.add(if upcoming { col.gte(now) } else { col.lt(now) });
        }

        if let Some(term) = criteria.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            if self.search.is_empty() && self.related_search.is_none() {
                return Err(self.unsupported("search"));
            }
            let pattern = like_pattern(term);
            let mut any = Condition::any();
            for col in &self.search {
                any = any.add(lower_like(Expr::col((E::default(), *col)).into(), &pattern));
            }
            if let Some(rs) = &self.related_search {
                any = any.add(lower_like(Expr::col((rs.table.clone(), rs.column.clone())).into(), &pattern));
                joins.push(rs.relation);
            }
            cond = cond.add(any);
        }

        Ok(Predicate { condition: cond, joins })
    }

    fn date_condition(&self, criteria: &FilterCriteria) -> Result<Option<Condition>, ServiceError> {
        let single = criteria.date.as_deref();
        let from = criteria.date_from.as_deref();
        let to = criteria.date_to.as_deref();
        if single.is_none() && from.is_none() && to.is_none() {
            return Ok(None);
        }

        if let Some(raw) = single {
            let col = self.require(self.date, "date")?;
            if from.is_some() || to.is_some() {
                return Err(ServiceError::validation("date cannot be combined with dateFrom/dateTo"));
            }
            let day = match parse_bound("date", raw)? {
                Bound::Day(d) => d,
                Bound::Instant(t) => t.with_timezone(&Utc).date_naive(),
            };
            let start = start_of(day);
            let end = start_of(next_day("date", day)?);
            return Ok(Some(Condition::all().add(col.gte(start)).add(col.lt(end))));
        }

        let field = if from.is_some() { "dateFrom" } else { "dateTo" };
        let col = self.require(self.date, field)?;
        let mut cond = Condition::all();

        let lower = match from {
            Some(raw) => Some(match parse_bound("dateFrom", raw)? {
                Bound::Day(d) => start_of(d),
                Bound::Instant(t) => to_utc(t),
            }),
            None => None,
        };
        // (bound, inclusive)
        let upper = match to {
            Some(raw) => Some(match parse_bound("dateTo", raw)? {
                Bound::Day(d) => (start_of(next_day("dateTo", d)?), false),
                Bound::Instant(t) => (to_utc(t), true),
            }),
            None => None,
        };

        if let (Some(lo), Some((hi, inclusive))) = (lower, upper) {
            if (inclusive && lo > hi) || (!inclusive && lo >= hi) {
                return Err(ServiceError::validation("dateFrom must not be later than dateTo"));
            }
        }
        if let Some(lo) = lower {
            cond = cond.add(col.gte(lo));
        }
        if let Some((hi, inclusive)) = upper {
            cond = cond.add(if inclusive { col.lte(hi) } else { col.lt(hi) });
        }
        Ok(Some(cond))
    }

    fn require(&self, col: Option<E::Column>, field: &str) -> Result<E::Column, ServiceError> {
        col.ok_or_else(|| self.unsupported(field))
    }

    fn unsupported(&self, field: &str) -> ServiceError {
        ServiceError::validation(format!("{} does not support filtering by {field}", E::default().table_name()))
    }
}

fn parse_bound(field: &str, raw: &str) -> Result<Bound, ServiceError> {
    let raw = raw.trim();
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Bound::Day(day));
    }
    DateTime::parse_from_rfc3339(raw)
        .map(Bound::Instant)
        .map_err(|_| ServiceError::validation(format!("{field}: invalid date '{raw}', expected YYYY-MM-DD or RFC 3339")))
}

fn start_of(day: NaiveDate) -> DateTime<FixedOffset> {
    day.and_time(NaiveTime::MIN).and_utc().into()
}

fn next_day(field: &str, day: NaiveDate) -> Result<NaiveDate, ServiceError> {
    day.succ_opt().ok_or_else(|| ServiceError::validation(format!("{field}: date out of range")))
}

// Stored timestamps are UTC; keep bounds in the same offset so text-typed
// backends compare them correctly.
fn to_utc(t: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    t.with_timezone(&Utc).into()
}

fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn lower_like(col: SimpleExpr, pattern: &str) -> SimpleExpr {
    Expr::expr(Func::lower(col)).like(LikeExpr::new(pattern).escape('\\'))
}
