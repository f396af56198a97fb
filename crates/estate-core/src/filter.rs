//! Dashboard filters.
//!
//! [`DashboardQuery`] is the raw query string; [`DashboardQuery::parse`]
//! turns it into typed [`UserFilter`] and [`PropertyFilter`] values.
//!
//! Date bounds are inclusive. A bare calendar date (`YYYY-MM-DD`) used as a
//! `...From` bound means the start of that day, and used as a `...To` bound
//! means the last millisecond of that day (23:59:59.999 UTC). This applies to
//! users and properties alike. A full RFC 3339 timestamp is taken as given,
//! snapped inward to whole milliseconds, the precision times are stored at.

use chrono::{DateTime, NaiveDate, NaiveTime, SubsecRound as _, TimeDelta, Utc};
use serde::Deserialize;

use crate::{
  Error, Result,
  property::{Property, PropertyStatus},
  user::{Role, User},
};

// ─── Typed filters ───────────────────────────────────────────────────────────

/// An inclusive creation-time window. Either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
  pub from: Option<DateTime<Utc>>,
  pub to:   Option<DateTime<Utc>>,
}

impl DateRange {
  pub fn contains(&self, at: DateTime<Utc>) -> bool {
    self.from.is_none_or(|from| at >= from) && self.to.is_none_or(|to| at <= to)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
  pub created: DateRange,
  pub role:    Option<Role>,
}

impl UserFilter {
  pub fn matches(&self, user: &User) -> bool {
    self.created.contains(user.created_at) && self.role.is_none_or(|r| r == user.role)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyFilter {
  pub created: DateRange,
  pub status:  Option<PropertyStatus>,
}

impl PropertyFilter {
  pub fn matches(&self, property: &Property) -> bool {
    self.created.contains(property.created_at)
      && self.status.is_none_or(|s| s == property.status)
  }
}

/// Both halves of a dashboard request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardFilter {
  pub users:      UserFilter,
  pub properties: PropertyFilter,
}

// ─── Raw query ───────────────────────────────────────────────────────────────

/// `GET /admin/dashboard` query parameters, as received.
///
/// Empty strings are treated the same as absent parameters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
  pub user_date_from:     Option<String>,
  pub user_date_to:       Option<String>,
  pub property_date_from: Option<String>,
  pub property_date_to:   Option<String>,
  pub property_status:    Option<String>,
  pub user_role:          Option<String>,
}

impl DashboardQuery {
  pub fn parse(&self) -> Result<DashboardFilter> {
    let users = UserFilter {
      created: DateRange {
        from: bound("userDateFrom", &self.user_date_from, Edge::Start)?,
        to:   bound("userDateTo", &self.user_date_to, Edge::End)?,
      },
      role:    present(&self.user_role).map(Role::parse).transpose()?,
    };
    let properties = PropertyFilter {
      created: DateRange {
        from: bound("propertyDateFrom", &self.property_date_from, Edge::Start)?,
        to:   bound("propertyDateTo", &self.property_date_to, Edge::End)?,
      },
      status:  present(&self.property_status)
        .map(PropertyStatus::parse)
        .transpose()?,
    };
    Ok(DashboardFilter { users, properties })
  }
}

#[derive(Debug, Clone, Copy)]
enum Edge {
  Start,
  End,
}

fn present(value: &Option<String>) -> Option<&str> {
  value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn bound(
  field: &'static str,
  value: &Option<String>,
  edge: Edge,
) -> Result<Option<DateTime<Utc>>> {
  let Some(raw) = present(value) else {
    return Ok(None);
  };

  if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
    let time = match edge {
      Edge::Start => NaiveTime::MIN,
      Edge::End => NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
        .ok_or_else(|| invalid(field, raw))?,
    };
    return Ok(Some(date.and_time(time).and_utc()));
  }

  let exact = DateTime::parse_from_rfc3339(raw)
    .map_err(|_| invalid(field, raw))?
    .with_timezone(&Utc);
  let floor = exact.trunc_subsecs(3);
  match edge {
    Edge::Start if floor < exact => floor
      .checked_add_signed(TimeDelta::milliseconds(1))
      .map(Some)
      .ok_or_else(|| invalid(field, raw)),
    _ => Ok(Some(floor)),
  }
}

fn invalid(field: &'static str, raw: &str) -> Error {
  Error::InvalidDate { field, value: raw.to_owned() }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn query() -> DashboardQuery { DashboardQuery::default() }

  #[test]
  fn absent_parameters_impose_no_constraint() {
    let filter = query().parse().unwrap();
    assert_eq!(filter, DashboardFilter::default());
  }

  #[test]
  fn empty_strings_count_as_absent() {
    let q = DashboardQuery {
      user_role: Some(String::new()),
      property_date_to: Some("  ".into()),
      ..query()
    };
    assert_eq!(q.parse().unwrap(), DashboardFilter::default());
  }

  #[test]
  fn bare_to_dates_extend_to_end_of_day_for_both_dimensions() {
    let q = DashboardQuery {
      user_date_to: Some("2024-03-10".into()),
      property_date_to: Some("2024-03-10".into()),
      ..query()
    };
    let f = q.parse().unwrap();
    let eod = Utc.with_ymd_and_hms(2024, 3, 10, 23, 59, 59).unwrap()
      + chrono::Duration::milliseconds(999);
    assert_eq!(f.users.created.to, Some(eod));
    assert_eq!(f.properties.created.to, Some(eod));
  }

  #[test]
  fn bare_from_dates_start_at_midnight() {
    let q = DashboardQuery {
      user_date_from: Some("2024-03-10".into()),
      ..query()
    };
    let f = q.parse().unwrap();
    assert_eq!(
      f.users.created.from,
      Some(Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap())
    );
  }

  #[test]
  fn full_timestamps_are_used_as_given() {
    let q = DashboardQuery {
      property_date_to: Some("2024-03-10T12:00:00+02:00".into()),
      ..query()
    };
    let f = q.parse().unwrap();
    assert_eq!(
      f.properties.created.to,
      Some(Utc.with_ymd_and_hms(2024, 3, 10, 10, 0, 0).unwrap())
    );
  }

  #[test]
  fn sub_millisecond_bounds_snap_inward() {
    let q = DashboardQuery {
      user_date_from: Some("2024-03-10T12:00:00.0009Z".into()),
      user_date_to: Some("2024-03-10T12:00:00.0029Z".into()),
      ..query()
    };
    let f = q.parse().unwrap();
    let noon = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
    let ms = chrono::Duration::milliseconds;
    assert_eq!(f.users.created.from, Some(noon + ms(1)));
    assert_eq!(f.users.created.to, Some(noon + ms(2)));
    assert!(!f.users.created.contains(noon));
  }

  #[test]
  fn malformed_values_are_errors() {
    let bad_date = DashboardQuery {
      user_date_from: Some("last tuesday".into()),
      ..query()
    };
    assert!(matches!(
      bad_date.parse(),
      Err(Error::InvalidDate { field: "userDateFrom", .. })
    ));

    let bad_status = DashboardQuery {
      property_status: Some("rented".into()),
      ..query()
    };
    assert!(matches!(bad_status.parse(), Err(Error::UnknownPropertyStatus(_))));

    let bad_role = DashboardQuery { user_role: Some("owner".into()), ..query() };
    assert!(matches!(bad_role.parse(), Err(Error::UnknownRole(_))));
  }

  #[test]
  fn range_is_inclusive_on_both_ends() {
    let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
    let range = DateRange { from: Some(from), to: Some(to) };
    assert!(range.contains(from));
    assert!(range.contains(to));
    assert!(!range.contains(to + chrono::Duration::milliseconds(1)));
    assert!(!range.contains(from - chrono::Duration::milliseconds(1)));
  }
}
