//! # Day Grouping
//!
//! Turns a flat collection of entries into a [`Snapshot`]: day buckets ordered
//! newest day first, each holding that day's entries in the configured
//! [`IntraDayOrder`].
//!
//! The calendar day of an entry depends on the [`DisplayZone`]: an entry stored
//! at `2024-01-02T23:30Z` belongs to `2024-01-03` for a reader at `+02:00`.
//! The grouper is the single owner of that rule; [`crate::store::EntryStore`]
//! asks it for day keys and orderings instead of deriving them itself.
//!
//! [`DateGrouper::group`] is pure: the same set of entries, in any input order,
//! always produces the same snapshot.

use crate::model::{Entry, EntryId};
use chrono::{
    DateTime, Duration, FixedOffset, Local, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Timezone used to derive calendar days and to read naive timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DisplayZone {
    #[default]
    Local,
    Utc,
    Fixed(FixedOffset),
}

impl DisplayZone {
    pub fn day_of(&self, ts: &DateTime<Utc>) -> NaiveDate {
        match self {
            DisplayZone::Local => ts.with_timezone(&Local).date_naive(),
            DisplayZone::Utc => ts.date_naive(),
            DisplayZone::Fixed(offset) => ts.with_timezone(offset).date_naive(),
        }
    }

    /// Reads a wall-clock time in this zone. Ambiguous local times resolve to the earlier
    /// instant; times skipped by a DST jump resolve to the first instant after the gap.
    pub fn localize(&self, naive: &NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            DisplayZone::Local => resolve_wall_clock(naive, |n| {
                Local
                    .from_local_datetime(n)
                    .map(|dt| dt.with_timezone(&Utc))
            }),
            DisplayZone::Utc => Some(Utc.from_utc_datetime(naive)),
            DisplayZone::Fixed(offset) => resolve_wall_clock(naive, |n| {
                offset
                    .from_local_datetime(n)
                    .map(|dt| dt.with_timezone(&Utc))
            }),
        }
    }

    pub fn format(&self, ts: &DateTime<Utc>, fmt: &str) -> String {
        match self {
            DisplayZone::Local => ts.with_timezone(&Local).format(fmt).to_string(),
            DisplayZone::Utc => ts.format(fmt).to_string(),
            DisplayZone::Fixed(offset) => ts.with_timezone(offset).format(fmt).to_string(),
        }
    }
}

impl fmt::Display for DisplayZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayZone::Local => write!(f, "local"),
            DisplayZone::Utc => write!(f, "utc"),
            DisplayZone::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

impl FromStr for DisplayZone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "local" => return Ok(DisplayZone::Local),
            "utc" | "z" => return Ok(DisplayZone::Utc),
            _ => {}
        }
        parse_offset(s)
            .map(DisplayZone::Fixed)
            .ok_or_else(|| format!("Invalid timezone: {} (expected local, utc or ±HH:MM)", s))
    }
}

impl TryFrom<String> for DisplayZone {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DisplayZone> for String {
    fn from(zone: DisplayZone) -> Self {
        zone.to_string()
    }
}

/// Parses `+HH:MM`, `-HHMM` or `+HH`.
fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Order of entries inside one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntraDayOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

impl fmt::Display for IntraDayOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntraDayOrder::NewestFirst => write!(f, "newest_first"),
            IntraDayOrder::OldestFirst => write!(f, "oldest_first"),
        }
    }
}

impl FromStr for IntraDayOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "newest_first" | "newest" | "desc" => Ok(IntraDayOrder::NewestFirst),
            "oldest_first" | "oldest" | "asc" => Ok(IntraDayOrder::OldestFirst),
            other => Err(format!(
                "Invalid order: {} (expected newest_first or oldest_first)",
                other
            )),
        }
    }
}

/// Quarter-hour steps searched past a wall-clock time that falls in a DST gap.
const GAP_STEPS: i64 = 12;

/// Resolves `naive` through `lookup`, stepping forward in quarter hours while the
/// wall-clock time does not exist. Real transitions land on quarter-hour
/// boundaries, so the first hit is the instant the clocks jumped to.
fn resolve_wall_clock<F>(naive: &NaiveDateTime, lookup: F) -> Option<DateTime<Utc>>
where
    F: Fn(&NaiveDateTime) -> LocalResult<DateTime<Utc>>,
{
    (0..=GAP_STEPS).find_map(|step| {
        let shifted = naive.checked_add_signed(Duration::minutes(15 * step))?;
        lookup(&shifted).earliest()
    })
}

/// Calendar day of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayKey(NaiveDate);

impl DayKey {
    /// Long form used as a bucket heading, e.g. `Tue Jan 02 2024`.
    pub fn label(&self) -> String {
        self.0.format("%a %b %d %Y").to_string()
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DayKey {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").map(DayKey)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayBucket {
    pub day: DayKey,
    pub entries: Vec<Entry>,
}

impl DayBucket {
    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Immutable view of every bucket at one point in time, newest day first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    buckets: Vec<DayBucket>,
}

impl Snapshot {
    pub(crate) fn from_buckets(buckets: Vec<DayBucket>) -> Self {
        Self { buckets }
    }

    pub fn buckets(&self) -> &[DayBucket] {
        &self.buckets
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DayBucket> {
        self.buckets.iter()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn entry_count(&self) -> usize {
        self.buckets.iter().map(DayBucket::len).sum()
    }

    pub fn find(&self, id: &EntryId) -> Option<(DayKey, &Entry)> {
        self.buckets.iter().find_map(|bucket| {
            bucket
                .entries
                .iter()
                .find(|e| &e.id == id)
                .map(|e| (bucket.day, e))
        })
    }

    /// `(day, ids)` pairs, handy for comparing against expected layouts.
    pub fn layout(&self) -> Vec<(String, Vec<&str>)> {
        self.buckets
            .iter()
            .map(|b| (b.day.to_string(), b.ids()))
            .collect()
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a DayBucket;
    type IntoIter = std::slice::Iter<'a, DayBucket>;

    fn into_iter(self) -> Self::IntoIter {
        self.buckets.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateGrouper {
    zone: DisplayZone,
    order: IntraDayOrder,
}

impl DateGrouper {
    pub fn new(zone: DisplayZone) -> Self {
        Self {
            zone,
            order: IntraDayOrder::default(),
        }
    }

    pub fn with_order(mut self, order: IntraDayOrder) -> Self {
        self.order = order;
        self
    }

    pub fn zone(&self) -> DisplayZone {
        self.zone
    }

    pub fn order(&self) -> IntraDayOrder {
        self.order
    }

    pub fn day_key(&self, ts: &DateTime<Utc>) -> DayKey {
        DayKey(self.zone.day_of(ts))
    }

    /// Display order of two entries of the same day. Equal timestamps fall back to the id.
    pub fn compare(&self, a: &Entry, b: &Entry) -> Ordering {
        let ascending = a
            .created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id));
        match self.order {
            IntraDayOrder::NewestFirst => ascending.reverse(),
            IntraDayOrder::OldestFirst => ascending,
        }
    }

    pub fn group<'a, I>(&self, entries: I) -> Snapshot
    where
        I: IntoIterator<Item = &'a Entry>,
    {
        let mut days: BTreeMap<DayKey, Vec<Entry>> = BTreeMap::new();
        for entry in entries {
            days.entry(self.day_key(&entry.created_at))
                .or_default()
                .push(entry.clone());
        }

        let buckets = days
            .into_iter()
            .rev()
            .map(|(day, mut entries)| {
                entries.sort_by(|a, b| self.compare(a, b));
                DayBucket { day, entries }
            })
            .collect();

        Snapshot::from_buckets(buckets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, y: i32, m: u32, d: u32, h: u32) -> Entry {
        Entry::new(
            id.into(),
            format!("entry {}", id),
            None,
            Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap(),
        )
    }

    fn utc_grouper() -> DateGrouper {
        DateGrouper::new(DisplayZone::Utc)
    }

    /// A zone at UTC+1 that skips 02:00 to 03:00 on 2024-03-31.
    fn zone_with_gap(naive: &NaiveDateTime) -> LocalResult<DateTime<Utc>> {
        let gap_start = NaiveDate::from_ymd_opt(2024, 3, 31)
            .unwrap()
            .and_hms_opt(2, 0, 0)
            .unwrap();
        if *naive >= gap_start && *naive < gap_start + Duration::hours(1) {
            return LocalResult::None;
        }
        let offset = if *naive < gap_start { 1 } else { 2 };
        LocalResult::Single(Utc.from_utc_datetime(&(*naive - Duration::hours(offset))))
    }

    fn wall(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 31)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn skipped_wall_clock_time_moves_past_the_gap() {
        let resolved = resolve_wall_clock(&wall(2, 30), zone_with_gap).unwrap();
        assert_eq!(resolved, Utc.with_ymd_and_hms(2024, 3, 31, 1, 0, 0).unwrap());

        let before = resolve_wall_clock(&wall(1, 45), zone_with_gap).unwrap();
        assert_eq!(before, Utc.with_ymd_and_hms(2024, 3, 31, 0, 45, 0).unwrap());
    }

    #[test]
    fn fixed_zone_localizes_directly() {
        let zone: DisplayZone = "+02:00".parse().unwrap();
        assert_eq!(
            zone.localize(&wall(2, 30)),
            Some(Utc.with_ymd_and_hms(2024, 3, 31, 0, 30, 0).unwrap())
        );
    }

    #[test]
    fn groups_by_day_newest_first() {
        let entries = vec![
            entry("1", 2024, 1, 2, 10),
            entry("2", 2024, 1, 2, 18),
            entry("3", 2024, 1, 1, 9),
        ];

        let snapshot = utc_grouper().group(&entries);

        assert_eq!(
            snapshot.layout(),
            vec![
                ("2024-01-02".to_string(), vec!["2", "1"]),
                ("2024-01-01".to_string(), vec!["3"]),
            ]
        );
    }

    #[test]
    fn grouping_ignores_input_order() {
        let entries = vec![
            entry("a", 2024, 3, 1, 8),
            entry("b", 2024, 3, 1, 8),
            entry("c", 2024, 2, 28, 23),
            entry("d", 2024, 3, 2, 0),
        ];
        let mut shuffled = entries.clone();
        shuffled.reverse();
        shuffled.swap(0, 2);

        let grouper = utc_grouper();
        assert_eq!(grouper.group(&entries), grouper.group(&shuffled));
    }

    #[test]
    fn identical_timestamps_break_ties_by_id() {
        let entries = vec![entry("a", 2024, 3, 1, 8), entry("b", 2024, 3, 1, 8)];
        let snapshot = utc_grouper().group(&entries);
        assert_eq!(snapshot.buckets()[0].ids(), vec!["b", "a"]);
    }

    #[test]
    fn oldest_first_reverses_within_day_only() {
        let entries = vec![
            entry("1", 2024, 1, 2, 10),
            entry("2", 2024, 1, 2, 18),
            entry("3", 2024, 1, 1, 9),
        ];

        let snapshot = utc_grouper()
            .with_order(IntraDayOrder::OldestFirst)
            .group(&entries);

        assert_eq!(
            snapshot.layout(),
            vec![
                ("2024-01-02".to_string(), vec!["1", "2"]),
                ("2024-01-01".to_string(), vec!["3"]),
            ]
        );
    }

    #[test]
    fn zone_decides_the_calendar_day() {
        let late = entry("late", 2024, 1, 2, 23);
        let plus_two: DisplayZone = "+02:00".parse().unwrap();

        let utc = utc_grouper().group([&late]);
        let shifted = DateGrouper::new(plus_two).group([&late]);

        assert_eq!(utc.buckets()[0].day.to_string(), "2024-01-02");
        assert_eq!(shifted.buckets()[0].day.to_string(), "2024-01-03");
    }

    #[test]
    fn empty_input_gives_empty_snapshot() {
        let snapshot = utc_grouper().group(std::iter::empty());
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.entry_count(), 0);
    }

    #[test]
    fn day_label_matches_long_date_form() {
        let day: DayKey = "2024-01-02".parse().unwrap();
        assert_eq!(day.label(), "Tue Jan 02 2024");
    }

    #[test]
    fn parses_zones() {
        assert_eq!("local".parse::<DisplayZone>(), Ok(DisplayZone::Local));
        assert_eq!("UTC".parse::<DisplayZone>(), Ok(DisplayZone::Utc));
        assert_eq!(
            "-05:30".parse::<DisplayZone>(),
            Ok(DisplayZone::Fixed(FixedOffset::west_opt(5 * 3600 + 1800).unwrap()))
        );
        assert_eq!(
            "+0100".parse::<DisplayZone>(),
            Ok(DisplayZone::Fixed(FixedOffset::east_opt(3600).unwrap()))
        );
        assert!("mars".parse::<DisplayZone>().is_err());
        assert!("+25:00".parse::<DisplayZone>().is_err());
    }

    #[test]
    fn zone_display_round_trips_through_parse() {
        for zone in ["local", "utc", "+02:00", "-03:30"] {
            let parsed: DisplayZone = zone.parse().unwrap();
            assert_eq!(parsed.to_string(), zone);
        }
    }

    #[test]
    fn parses_orders() {
        assert_eq!(
            "oldest-first".parse::<IntraDayOrder>(),
            Ok(IntraDayOrder::OldestFirst)
        );
        assert_eq!(
            "newest_first".parse::<IntraDayOrder>(),
            Ok(IntraDayOrder::NewestFirst)
        );
        assert!("sideways".parse::<IntraDayOrder>().is_err());
    }
}
