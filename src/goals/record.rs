// src/goals/record.rs
// Goal record, its seven stored fields, and timestamp helpers

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use super::codec::{self, GoalName};

/// Timestamp layout used for `Created At` / `Completed At`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Lifecycle of a goal. Only Pending -> Completed happens through the model-facing tools.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum GoalStatus {
    Pending,
    Completed,
}

/// The seven columns of the goal table, in stored order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
pub enum GoalField {
    #[strum(serialize = "Goal")]
    Goal,
    #[strum(serialize = "Status")]
    Status,
    #[strum(serialize = "Created At")]
    CreatedAt,
    #[strum(serialize = "Completed At")]
    CompletedAt,
    #[strum(serialize = "Duration")]
    Duration,
    #[strum(serialize = "Expected Duration")]
    ExpectedDuration,
    #[strum(serialize = "Notes")]
    Notes,
}

impl GoalField {
    pub const COUNT: usize = 7;

    /// Header names in column order
    pub fn headers() -> Vec<String> {
        Self::iter().map(|f| f.as_ref().to_string()).collect()
    }

    /// Fields the update operation may write. The rest carry identity or
    /// lifecycle state and change only through their dedicated operations.
    pub fn is_editable(self) -> bool {
        matches!(self, GoalField::ExpectedDuration | GoalField::Notes)
    }

    /// Zero-based column position
    pub fn column(self) -> usize {
        self as usize
    }
}

/// One row of the goal table.
///
/// Field names map one-to-one onto the header row, so the same struct is used
/// for CSV (de)serialization and for sheet rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalRecord {
    #[serde(rename = "Goal")]
    pub goal: String,
    #[serde(rename = "Status")]
    pub status: GoalStatus,
    #[serde(rename = "Created At")]
    pub created_at: String,
    #[serde(rename = "Completed At", default)]
    pub completed_at: String,
    #[serde(rename = "Duration", default)]
    pub duration: String,
    #[serde(rename = "Expected Duration", default)]
    pub expected_duration: String,
    #[serde(rename = "Notes", default)]
    pub notes: String,
}

impl GoalRecord {
    /// A fresh Pending record created now.
    pub fn new_pending(name: &GoalName) -> Self {
        Self {
            goal: name.key().as_str().to_string(),
            status: GoalStatus::Pending,
            created_at: now_timestamp(),
            completed_at: String::new(),
            duration: String::new(),
            expected_duration: String::new(),
            notes: String::new(),
        }
    }

    pub fn display_name(&self) -> &str {
        codec::display_from_stored(&self.goal)
    }

    pub fn is_pending(&self) -> bool {
        self.status == GoalStatus::Pending
    }

    /// Pending -> Completed, stamping completion time and elapsed duration.
    ///
    /// `Created At` is read back in the completion's time zone, so the
    /// duration is measured between instants rather than wall-clock readings.
    /// A creation time inside a repeated (fall-back) hour resolves to its
    /// earliest instant.
    pub fn complete_at<Tz: TimeZone>(&mut self, completed_at: DateTime<Tz>) {
        let zone = completed_at.timezone();
        self.status = GoalStatus::Completed;
        self.completed_at = completed_at
            .naive_local()
            .format(TIMESTAMP_FORMAT)
            .to_string();
        let created = parse_timestamp(&self.created_at)
            .and_then(|naive| zone.from_local_datetime(&naive).earliest());
        self.duration = match created {
            Some(created) => format_elapsed(completed_at.signed_duration_since(created)),
            None => {
                tracing::warn!(
                    goal = %self.goal,
                    created_at = %self.created_at,
                    "Unparseable creation time, leaving duration empty"
                );
                String::new()
            }
        };
    }

    /// Completed -> Pending, clearing completion data.
    pub fn reopen(&mut self) {
        self.status = GoalStatus::Pending;
        self.completed_at.clear();
        self.duration.clear();
    }

    pub fn get(&self, field: GoalField) -> &str {
        match field {
            GoalField::Goal => &self.goal,
            GoalField::Status => self.status.as_ref(),
            GoalField::CreatedAt => &self.created_at,
            GoalField::CompletedAt => &self.completed_at,
            GoalField::Duration => &self.duration,
            GoalField::ExpectedDuration => &self.expected_duration,
            GoalField::Notes => &self.notes,
        }
    }

    /// Write an editable field. Returns false (and changes nothing) for the
    /// read-only ones.
    pub fn set(&mut self, field: GoalField, value: String) -> bool {
        match field {
            GoalField::ExpectedDuration => self.expected_duration = value,
            GoalField::Notes => self.notes = value,
            _ => return false,
        }
        true
    }

    /// Cells in column order
    pub fn to_cells(&self) -> Vec<String> {
        GoalField::iter().map(|f| self.get(f).to_string()).collect()
    }

    /// Build from a row of cells. Sheets omit trailing empty cells, so short
    /// rows are padded; an unknown status is rejected.
    pub fn from_cells(cells: &[String]) -> Option<Self> {
        let cell = |i: usize| cells.get(i).cloned().unwrap_or_default();
        let status = cell(GoalField::Status.column()).parse().ok()?;
        Some(Self {
            goal: cell(GoalField::Goal.column()),
            status,
            created_at: cell(GoalField::CreatedAt.column()),
            completed_at: cell(GoalField::CompletedAt.column()),
            duration: cell(GoalField::Duration.column()),
            expected_duration: cell(GoalField::ExpectedDuration.column()),
            notes: cell(GoalField::Notes.column()),
        })
    }
}

pub fn now() -> DateTime<Local> {
    Local::now()
}

pub fn now_timestamp() -> String {
    now().format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT).ok()
}

/// Render elapsed time as `H:MM:SS`, or `N day(s), H:MM:SS` past a day.
pub fn format_elapsed(elapsed: chrono::Duration) -> String {
    let total = elapsed.num_seconds().max(0);
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    let clock = format!("{hours}:{minutes:02}:{seconds:02}");
    match days {
        0 => clock,
        1 => format!("1 day, {clock}"),
        n => format!("{n} days, {clock}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset, MappedLocalTime, NaiveDate, Offset};

    fn ts(s: &str) -> NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    fn utc_clock(s: &str) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .from_local_datetime(&ts(s))
            .unwrap()
    }

    /// UTC-4 until 2025-11-02 06:00 UTC, then UTC-5: local 01:00-02:00 on
    /// that day happens twice.
    #[derive(Debug, Clone, Copy)]
    struct FallBackZone;

    impl FallBackZone {
        fn summer() -> FixedOffset {
            FixedOffset::west_opt(4 * 3600).unwrap()
        }

        fn winter() -> FixedOffset {
            FixedOffset::west_opt(5 * 3600).unwrap()
        }
    }

    impl TimeZone for FallBackZone {
        type Offset = FixedOffset;

        fn from_offset(_offset: &FixedOffset) -> Self {
            FallBackZone
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> MappedLocalTime<FixedOffset> {
            self.offset_from_local_datetime(&local.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_local_datetime(
            &self,
            local: &NaiveDateTime,
        ) -> MappedLocalTime<FixedOffset> {
            if *local < ts("2025-11-02 01:00:00") {
                MappedLocalTime::Single(Self::summer())
            } else if *local < ts("2025-11-02 02:00:00") {
                MappedLocalTime::Ambiguous(Self::summer(), Self::winter())
            } else {
                MappedLocalTime::Single(Self::winter())
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            if *utc < ts("2025-11-02 06:00:00") {
                Self::summer()
            } else {
                Self::winter()
            }
        }
    }

    #[test]
    fn test_headers_in_order() {
        assert_eq!(
            GoalField::headers(),
            vec![
                "Goal",
                "Status",
                "Created At",
                "Completed At",
                "Duration",
                "Expected Duration",
                "Notes"
            ]
        );
        assert_eq!(GoalField::headers().len(), GoalField::COUNT);
    }

    #[test]
    fn test_field_parse_by_header_name() {
        assert_eq!("Notes".parse::<GoalField>().unwrap(), GoalField::Notes);
        assert_eq!(
            "Expected Duration".parse::<GoalField>().unwrap(),
            GoalField::ExpectedDuration
        );
        assert!("notes".parse::<GoalField>().is_err());
        assert!("Priority".parse::<GoalField>().is_err());
    }

    #[test]
    fn test_only_expected_duration_and_notes_editable() {
        let editable: Vec<_> = GoalField::iter().filter(|f| f.is_editable()).collect();
        assert_eq!(editable, vec![GoalField::ExpectedDuration, GoalField::Notes]);
    }

    #[test]
    fn test_new_pending_record() {
        let name = GoalName::parse(" Read a book ").unwrap();
        let record = GoalRecord::new_pending(&name);
        assert_eq!(record.goal, "'Read a book'");
        assert_eq!(record.display_name(), "Read a book");
        assert!(record.is_pending());
        assert!(parse_timestamp(&record.created_at).is_some());
        assert!(record.completed_at.is_empty());
        assert!(record.duration.is_empty());
    }

    #[test]
    fn test_complete_sets_duration() {
        let name = GoalName::parse("Run").unwrap();
        let mut record = GoalRecord::new_pending(&name);
        record.created_at = "2025-01-01 08:00:00".into();
        record.complete_at(utc_clock("2025-01-02 09:30:15"));

        assert_eq!(record.status, GoalStatus::Completed);
        assert_eq!(record.completed_at, "2025-01-02 09:30:15");
        assert_eq!(record.duration, "1 day, 1:30:15");
    }

    #[test]
    fn test_duration_spans_clock_fall_back() {
        let name = GoalName::parse("Run").unwrap();
        let mut record = GoalRecord::new_pending(&name);
        // 01:40 in the first pass through the repeated hour (05:40 UTC)
        record.created_at = "2025-11-02 01:40:00".into();

        // 06:10 UTC reads 01:10 on the wall clock after falling back
        let completed = FallBackZone.from_utc_datetime(&ts("2025-11-02 06:10:00"));
        assert_eq!(completed.offset().fix(), FallBackZone::winter());
        record.complete_at(completed);

        assert_eq!(record.completed_at, "2025-11-02 01:10:00");
        assert_eq!(record.duration, "0:30:00");
    }

    #[test]
    fn test_duration_across_whole_days_in_local_zone() {
        let name = GoalName::parse("Run").unwrap();
        let mut record = GoalRecord::new_pending(&name);
        record.created_at = "2025-11-01 12:00:00".into();
        record.complete_at(FallBackZone.from_utc_datetime(&ts("2025-11-02 17:00:00")));

        // Wall clock shows 12:00 -> 12:00, but 25 hours passed
        assert_eq!(record.completed_at, "2025-11-02 12:00:00");
        assert_eq!(record.duration, "1 day, 1:00:00");
    }

    #[test]
    fn test_reopen_clears_completion() {
        let name = GoalName::parse("Run").unwrap();
        let mut record = GoalRecord::new_pending(&name);
        record.complete_at(now());
        record.reopen();
        assert!(record.is_pending());
        assert!(record.completed_at.is_empty());
        assert!(record.duration.is_empty());
    }

    #[test]
    fn test_set_refuses_read_only_fields() {
        let name = GoalName::parse("Run").unwrap();
        let mut record = GoalRecord::new_pending(&name);
        let before = record.clone();
        assert!(!record.set(GoalField::Status, "Completed".into()));
        assert!(!record.set(GoalField::Goal, "'Walk'".into()));
        assert_eq!(record, before);
        assert!(record.set(GoalField::Notes, "daily".into()));
        assert_eq!(record.notes, "daily");
    }

    #[test]
    fn test_cells_round_trip_with_short_row() {
        let cells = vec![
            "'Run'".to_string(),
            "Pending".to_string(),
            "2025-01-01 08:00:00".to_string(),
        ];
        let record = GoalRecord::from_cells(&cells).unwrap();
        assert!(record.notes.is_empty());
        assert_eq!(record.to_cells().len(), GoalField::COUNT);
        assert_eq!(record.to_cells()[..3], cells[..]);
    }

    #[test]
    fn test_from_cells_rejects_unknown_status() {
        let cells = vec!["'Run'".to_string(), "Done".to_string()];
        assert!(GoalRecord::from_cells(&cells).is_none());
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::seconds(0)), "0:00:00");
        assert_eq!(format_elapsed(Duration::seconds(3_725)), "1:02:05");
        assert_eq!(format_elapsed(Duration::days(2) + Duration::minutes(1)), "2 days, 0:01:00");
        assert_eq!(format_elapsed(Duration::seconds(-30)), "0:00:00");
    }
}
