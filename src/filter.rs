//! Chart listing filters.
//!
//! [`ChartListParams`] is raw query-string input. [`ChartFilter::from_params`]
//! validates it into a [`ChartFilter`] with one optional field per dimension,
//! rejecting bad dates and enum values before anything touches the database.
//! [`ChartFilter::apply`] then writes the conditions onto a [`SqlBuilder`].

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{JournalError, Result};
use crate::models::{format_instant, parse_instant, DayBound, MarketCap, StrategyType};
use crate::sql_builder::SqlBuilder;

/// Sentinel accepted by `strategyType` and `marketCap` meaning "no constraint".
pub const ALL: &str = "all";

// ---------------------------------------------------------------------------
// ChartListParams
// ---------------------------------------------------------------------------

/// Unvalidated listing parameters, as they arrive in a query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartListParams {
    pub start: Option<String>,
    pub end: Option<String>,
    pub executed: Option<String>,
    pub strategy_type: Option<String>,
    pub stock_name: Option<String>,
    pub market_cap: Option<String>,
}

// ---------------------------------------------------------------------------
// ChartFilter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutedFilter {
    Executed,
    NotExecuted,
    /// Only records that never recorded the field.
    Unrecorded,
}

/// Inclusive range over `Chart::date`. Either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartFilter {
    pub executed: Option<ExecutedFilter>,
    /// Strategy id or display name; resolved against strategy types at query time.
    pub strategy_type: Option<String>,
    pub stock_name: Option<String>,
    pub market_cap: Option<MarketCap>,
    pub date_range: Option<DateRange>,
}

/// Trimmed, non-empty value or `None`.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl ChartFilter {
    /// A filter that matches every chart.
    pub fn all() -> Self {
        Self::default()
    }

    /// Validate raw listing parameters.
    pub fn from_params(params: &ChartListParams) -> Result<Self> {
        let executed = match present(&params.executed) {
            None => None,
            Some(v) => Some(match v.to_ascii_lowercase().as_str() {
                "true" => ExecutedFilter::Executed,
                "false" => ExecutedFilter::NotExecuted,
                "unrecorded" => ExecutedFilter::Unrecorded,
                other => {
                    return Err(JournalError::InvalidArgument(format!(
                        "executed must be 'true', 'false' or 'unrecorded', got '{other}'"
                    )))
                }
            }),
        };

        let strategy_type = present(&params.strategy_type)
            .filter(|s| !s.eq_ignore_ascii_case(ALL))
            .map(str::to_string);

        let stock_name = present(&params.stock_name).map(str::to_string);

        let market_cap = match present(&params.market_cap) {
            Some(v) if !v.eq_ignore_ascii_case(ALL) => Some(v.parse::<MarketCap>()?),
            _ => None,
        };

        let start = present(&params.start)
            .map(|s| parse_instant(s, DayBound::Start))
            .transpose()?;
        let end = present(&params.end)
            .map(|s| parse_instant(s, DayBound::End))
            .transpose()?;
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(JournalError::InvalidArgument(format!(
                    "start ({}) is after end ({})",
                    format_instant(&s),
                    format_instant(&e)
                )));
            }
        }
        let date_range = if start.is_some() || end.is_some() {
            Some(DateRange { start, end })
        } else {
            None
        };

        Ok(Self {
            executed,
            strategy_type,
            stock_name,
            market_cap,
            date_range,
        })
    }

    pub fn executed(mut self, executed: bool) -> Self {
        self.executed = Some(if executed {
            ExecutedFilter::Executed
        } else {
            ExecutedFilter::NotExecuted
        });
        self
    }

    pub fn strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy_type = Some(strategy.into());
        self
    }

    /// Write this filter's conditions onto `qb`.
    ///
    /// `resolved` is the strategy type matched by `strategy_type`, if any. When
    /// present, charts referencing it by id or by (legacy) name both match;
    /// otherwise the input is compared literally. The date range is written
    /// last.
    pub fn apply(&self, qb: &mut SqlBuilder, resolved: Option<&StrategyType>) {
        match self.executed {
            Some(ExecutedFilter::Executed) => {
                qb.where_clause("executed = TRUE", &[]);
            }
            Some(ExecutedFilter::NotExecuted) => {
                qb.where_clause("executed = FALSE", &[]);
            }
            Some(ExecutedFilter::Unrecorded) => {
                qb.where_null("executed");
            }
            None => {}
        }

        if let Some(input) = &self.strategy_type {
            match resolved {
                Some(st) => {
                    qb.where_or(&[
                        ("strategyType = ?", st.id.as_str()),
                        ("LOWER(strategyType) = LOWER(?)", st.name.as_str()),
                    ]);
                }
                None => {
                    qb.where_eq("strategyType", input);
                }
            }
        }

        if let Some(name) = &self.stock_name {
            qb.where_contains("stockName", name);
        }

        if let Some(cap) = self.market_cap {
            qb.where_eq("marketCap", cap.as_str());
        }

        if let Some(range) = &self.date_range {
            if let Some(start) = &range.start {
                qb.where_gte("date", &format_instant(start));
            }
            if let Some(end) = &range.end {
                qb.where_lte("date", &format_instant(end));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ChartListParams {
        ChartListParams::default()
    }

    #[test]
    fn empty_params_match_everything() {
        let f = ChartFilter::from_params(&params()).unwrap();
        assert_eq!(f, ChartFilter::all());

        let mut qb = SqlBuilder::new("charts");
        f.apply(&mut qb, None);
        let (sql, p) = qb.build();
        assert!(!sql.contains("WHERE"));
        assert!(p.is_empty());
    }

    #[test]
    fn all_sentinels_and_blanks_are_unconstrained() {
        let p = ChartListParams {
            strategy_type: Some("ALL".into()),
            market_cap: Some("all".into()),
            stock_name: Some("   ".into()),
            executed: Some("".into()),
            ..params()
        };
        assert_eq!(ChartFilter::from_params(&p).unwrap(), ChartFilter::all());
    }

    #[test]
    fn executed_is_tri_state() {
        let parse = |v: &str| {
            ChartFilter::from_params(&ChartListParams {
                executed: Some(v.into()),
                ..params()
            })
        };
        assert_eq!(parse("true").unwrap().executed, Some(ExecutedFilter::Executed));
        assert_eq!(parse("FALSE").unwrap().executed, Some(ExecutedFilter::NotExecuted));
        assert_eq!(parse("unrecorded").unwrap().executed, Some(ExecutedFilter::Unrecorded));
        assert!(matches!(parse("yes"), Err(JournalError::InvalidArgument(_))));
    }

    #[test]
    fn bad_market_cap_is_rejected() {
        let p = ChartListParams {
            market_cap: Some("mid".into()),
            ..params()
        };
        assert!(matches!(
            ChartFilter::from_params(&p),
            Err(JournalError::InvalidArgument(_))
        ));
    }

    #[test]
    fn unparseable_dates_are_rejected() {
        let p = ChartListParams {
            start: Some("not-a-date".into()),
            end: Some("2024-03-01".into()),
            ..params()
        };
        assert!(matches!(
            ChartFilter::from_params(&p),
            Err(JournalError::InvalidArgument(_))
        ));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let p = ChartListParams {
            start: Some("2024-03-02".into()),
            end: Some("2024-03-01".into()),
            ..params()
        };
        assert!(ChartFilter::from_params(&p).is_err());
    }

    #[test]
    fn date_range_is_written_last() {
        let p = ChartListParams {
            start: Some("2024-03-01".into()),
            end: Some("2024-03-01".into()),
            executed: Some("true".into()),
            strategy_type: Some("Gap Trading".into()),
            stock_name: Some("aapl".into()),
            market_cap: Some("Large".into()),
        };
        let f = ChartFilter::from_params(&p).unwrap();
        let mut qb = SqlBuilder::new("charts");
        f.apply(&mut qb, None);
        let (sql, params) = qb.build();

        assert!(sql.contains("executed = TRUE"));
        assert!(sql.ends_with("date >= ? AND date <= ?"));
        assert_eq!(
            params,
            vec![
                "Gap Trading",
                "aapl",
                "large",
                "2024-03-01T00:00:00.000Z",
                "2024-03-01T23:59:59.999Z",
            ]
        );
    }

    #[test]
    fn resolved_strategy_matches_id_or_legacy_name() {
        let f = ChartFilter::all().strategy("breakout trading");
        let st = StrategyType {
            id: "st-1".into(),
            name: "Breakout Trading".into(),
            created_at: Utc::now(),
        };
        let mut qb = SqlBuilder::new("charts");
        f.apply(&mut qb, Some(&st));
        let (sql, params) = qb.build();
        assert!(sql.contains("(strategyType = ? OR LOWER(strategyType) = LOWER(?))"));
        assert_eq!(params, vec!["st-1", "Breakout Trading"]);
    }

    #[test]
    fn open_ended_range() {
        let p = ChartListParams {
            end: Some("2024-01-31".into()),
            ..params()
        };
        let f = ChartFilter::from_params(&p).unwrap();
        let range = f.date_range.unwrap();
        assert!(range.start.is_none());
        assert!(range.end.is_some());
    }
}
