use std::collections::{BTreeSet, HashSet};
use std::fmt;

use crate::error::{Error, Result};

/// A surgical operation with a fixed time interval.
///
/// Times are minutes from midnight. The interval is half-open, so an
/// operation ending at 10:00 does not overlap one starting at 10:00.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub id: String,
    pub start: u32,
    pub end: u32,
    pub specialty: String,
    /// Cost of performing this operation in each room, indexed like
    /// `SchedulingInstance::rooms`. Empty when costs are not modeled.
    pub room_costs: Vec<f64>,
}

impl Operation {
    pub fn new(id: impl Into<String>, start: u32, end: u32) -> Self {
        Self {
            id: id.into(),
            start,
            end,
            specialty: String::new(),
            room_costs: Vec::new(),
        }
    }

    /// Builds an operation from `HH:MM` clock strings.
    ///
    /// # Examples
    /// ```
    /// use room_colgen::Operation;
    ///
    /// let op = Operation::from_clock("op-1", "09:30", "10:45").unwrap();
    /// assert_eq!((op.start, op.end), (570, 645));
    /// ```
    pub fn from_clock(id: impl Into<String>, start: &str, end: &str) -> Result<Self> {
        Ok(Self::new(id, parse_clock(start)?, parse_clock(end)?))
    }

    pub fn with_specialty(mut self, specialty: impl Into<String>) -> Self {
        self.specialty = specialty.into();
        self
    }

    pub fn with_room_costs(mut self, room_costs: Vec<f64>) -> Self {
        self.room_costs = room_costs;
        self
    }

    pub fn duration(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Strict overlap of the half-open intervals `[start, end)`.
    pub fn overlaps(&self, other: &Operation) -> bool {
        other.start < self.end && other.end > self.start
    }

    /// Mean cost across rooms, or `None` when no costs are attached.
    pub fn mean_room_cost(&self) -> Option<f64> {
        if self.room_costs.is_empty() {
            None
        } else {
            Some(self.room_costs.iter().sum::<f64>() / self.room_costs.len() as f64)
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}-{})",
            self.id,
            format_clock(self.start),
            format_clock(self.end)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Room {
    pub id: String,
}

impl Room {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// The typed input of one scheduling run.
#[derive(Debug, Clone, Default)]
pub struct SchedulingInstance {
    pub operations: Vec<Operation>,
    pub rooms: Vec<Room>,
}

impl SchedulingInstance {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self {
            operations,
            rooms: Vec::new(),
        }
    }

    pub fn with_rooms(mut self, rooms: Vec<Room>) -> Self {
        self.rooms = rooms;
        self
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Checks that ids are unique, intervals are not reversed and every
    /// cost row has one entry per room.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for op in &self.operations {
            if !seen.insert(op.id.as_str()) {
                return Err(Error::DuplicateOperation(op.id.clone()));
            }
            if op.end < op.start {
                return Err(Error::InvalidInterval {
                    id: op.id.clone(),
                    start: op.start,
                    end: op.end,
                });
            }
            if !op.room_costs.is_empty() && op.room_costs.len() != self.rooms.len() {
                return Err(Error::invalid_input(format!(
                    "operation {} has {} room costs for {} rooms",
                    op.id,
                    op.room_costs.len(),
                    self.rooms.len()
                )));
            }
            if op.room_costs.iter().any(|c| !c.is_finite()) {
                return Err(Error::invalid_input(format!(
                    "operation {} has a non-finite room cost",
                    op.id
                )));
            }
        }

        let mut room_ids = HashSet::new();
        if let Some(room) = self.rooms.iter().find(|r| !room_ids.insert(r.id.as_str())) {
            return Err(Error::invalid_input(format!(
                "room id {} appears more than once",
                room.id
            )));
        }
        Ok(())
    }

    /// Keeps only operations whose specialty is one of `specialties`,
    /// preserving input order.
    pub fn filter_specialties<S: AsRef<str>>(&self, specialties: &[S]) -> SchedulingInstance {
        let operations = self
            .operations
            .iter()
            .filter(|op| specialties.iter().any(|s| s.as_ref() == op.specialty))
            .cloned()
            .collect();
        SchedulingInstance {
            operations,
            rooms: self.rooms.clone(),
        }
    }

    /// Distinct specialties in sorted order.
    pub fn specialties(&self) -> Vec<String> {
        self.operations
            .iter()
            .map(|op| op.specialty.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.operations.iter().position(|op| op.id == id)
    }
}

/// Parses `HH:MM` (or `H:MM`) into minutes from midnight.
pub fn parse_clock(text: &str) -> Result<u32> {
    let invalid = || Error::invalid_input(format!("invalid clock time {:?}", text));
    let (hours, minutes) = text.trim().split_once(':').ok_or_else(invalid)?;
    let hours: u32 = hours.parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 24 || minutes > 59 || (hours == 24 && minutes > 0) {
        return Err(invalid());
    }
    Ok(hours * 60 + minutes)
}

pub fn format_clock(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}
