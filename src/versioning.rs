//! Assessment versioning service.
//!
//! A new `(year, major_version)` is minted when tracked reference data
//! changes, at most once per calendar day. The trigger is an explicit diff
//! over named fields and the date comes from an injected clock, so the
//! whole policy is testable without touching storage or wall time.

use chrono::{Datelike, NaiveDate};

use crate::models::{AssessmentVersion, Attribute, Organization};

/// Source of "today" for the version service.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Wall-clock implementation used outside tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Utc::now().date_naive()
    }
}

/// True when an attribute edit should mint a new assessment version.
pub fn attribute_changed(old: &Attribute, new: &Attribute) -> bool {
    old.name != new.name
        || old.required != new.required
        || old.order != new.order
        || old.description != new.description
}

pub fn organization_changed(old: &Organization, new: &Organization) -> bool {
    old.name != new.name
}

#[derive(Debug)]
pub struct VersionService<C: Clock> {
    clock: C,
}

impl<C: Clock> VersionService<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    /// The `(year, major_version)` to mint given the current latest
    /// version, or `None` when a version was already minted today.
    ///
    /// Same calendar year bumps the major version; a later year rolls over
    /// to `(year, 1)`, keeping `(year, major_version)` monotonic.
    pub fn next_version(&self, current: Option<&AssessmentVersion>) -> Option<(i16, i16)> {
        let today = self.clock.today();
        match current {
            None => Some((today.year() as i16, 1)),
            Some(current) => {
                let last = current.updated_on.date_naive();
                if today <= last {
                    return None;
                }
                if i32::from(current.year) == today.year() {
                    Some((current.year, current.major_version + 1))
                } else {
                    Some((today.year() as i16, 1))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    struct FixedClock(NaiveDate);

    impl Clock for FixedClock {
        fn today(&self) -> NaiveDate {
            self.0
        }
    }

    fn version(year: i16, major: i16, updated: NaiveDate) -> AssessmentVersion {
        let updated_on = Utc
            .with_ymd_and_hms(updated.year(), updated.month(), updated.day(), 12, 0, 0)
            .unwrap();
        AssessmentVersion {
            id: Uuid::new_v4(),
            year,
            major_version: major,
            text: String::new(),
            created_on: updated_on,
            updated_on,
        }
    }

    #[test]
    fn tracked_field_diffs() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let attribute = Attribute {
            id: Uuid::new_v4(),
            name: "Rights".to_string(),
            required: false,
            order: 1,
            description: String::new(),
            created_on: now,
            updated_on: now,
        };
        let mut renamed = attribute.clone();
        renamed.name = "Rights and access".to_string();
        assert!(attribute_changed(&attribute, &renamed));

        let mut touched = attribute.clone();
        touched.updated_on = Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap();
        // timestamps alone are not tracked fields
        assert!(!attribute_changed(&attribute, &touched));

        let org = Organization {
            id: Uuid::new_v4(),
            name: "Reef trust".to_string(),
            created_on: now,
            updated_on: now,
        };
        let mut renamed_org = org.clone();
        renamed_org.name = "Reef alliance".to_string();
        assert!(organization_changed(&org, &renamed_org));
        assert!(!organization_changed(&org, &org.clone()));
    }

    #[test]
    fn first_version_uses_current_year() {
        let service = VersionService::new(FixedClock(
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        ));
        assert_eq!(service.next_version(None), Some((2024, 1)));
    }

    #[test]
    fn at_most_one_bump_per_day() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let service = VersionService::new(FixedClock(today));
        let current = version(2024, 3, today);
        assert_eq!(service.next_version(Some(&current)), None);
    }

    #[test]
    fn same_year_bumps_major() {
        let service = VersionService::new(FixedClock(
            NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(),
        ));
        let current = version(2024, 3, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(service.next_version(Some(&current)), Some((2024, 4)));
    }

    #[test]
    fn year_rollover_resets_major() {
        let service = VersionService::new(FixedClock(
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
        ));
        let current = version(2024, 7, NaiveDate::from_ymd_opt(2024, 12, 30).unwrap());
        assert_eq!(service.next_version(Some(&current)), Some((2025, 1)));
    }
}
