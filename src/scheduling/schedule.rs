use std::fmt;

use crate::scheduling::operation::Operation;
use crate::scheduling::pattern::PatternPool;

/// One opened room and the operations it performs, ordered by start time.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSchedule {
    pub room: usize,
    /// Index of the pool pattern this room was opened for
    pub pattern: usize,
    pub operations: Vec<Operation>,
}

impl RoomSchedule {
    /// Expands integer pattern multiplicities into rooms.
    ///
    /// A pattern with multiplicity `m` opens `m` rooms. Every operation is
    /// performed in the first opened room whose pattern contains it; later
    /// rooms drop it, and rooms left with nothing to do are not opened.
    pub fn from_selection(
        pool: &PatternPool,
        multiplicities: &[f64],
        operations: &[Operation],
    ) -> Vec<RoomSchedule> {
        let mut assigned = vec![false; operations.len()];
        let mut rooms = Vec::new();

        for (k, pattern) in pool.iter().enumerate() {
            let copies = multiplicities
                .get(k)
                .map_or(0, |&m| m.round().max(0.0) as usize);
            for _ in 0..copies {
                let mut members: Vec<usize> = pattern
                    .operations()
                    .iter()
                    .copied()
                    .filter(|&i| !assigned[i])
                    .collect();
                if members.is_empty() {
                    break;
                }
                for &i in &members {
                    assigned[i] = true;
                }
                members.sort_by_key(|&i| (operations[i].start, operations[i].end));
                rooms.push(RoomSchedule {
                    room: rooms.len(),
                    pattern: k,
                    operations: members.iter().map(|&i| operations[i].clone()).collect(),
                });
            }
        }
        rooms
    }

    pub fn busy_minutes(&self) -> u32 {
        self.operations.iter().map(Operation::duration).sum()
    }
}

impl fmt::Display for RoomSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Room {} (pattern {}):", self.room + 1, self.pattern)?;
        for (n, op) in self.operations.iter().enumerate() {
            let sep = if n == 0 { " " } else { ", " };
            write!(f, "{}{}", sep, op)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduling::pattern::Pattern;

    #[test]
    fn test_each_operation_lands_in_one_room() {
        let operations = vec![
            Operation::new("a", 600, 660),
            Operation::new("b", 540, 600),
            Operation::new("c", 560, 620),
        ];
        let pool = PatternPool::from_patterns(
            3,
            vec![
                Pattern::new(vec![0, 1]),
                Pattern::new(vec![2]),
                Pattern::new(vec![1, 2]),
            ],
        )
        .unwrap();

        let rooms = RoomSchedule::from_selection(&pool, &[1.0, 2.0, 1.0], &operations);

        assert_eq!(rooms.len(), 2);
        let ids: Vec<Vec<&str>> = rooms
            .iter()
            .map(|r| r.operations.iter().map(|op| op.id.as_str()).collect())
            .collect();
        assert_eq!(ids, vec![vec!["b", "a"], vec!["c"]]);
        assert_eq!(rooms[1].pattern, 1);
        assert_eq!(rooms[0].busy_minutes(), 120);
        assert_eq!(
            rooms[0].to_string(),
            "Room 1 (pattern 0): b [09:00-10:00), a [10:00-11:00)"
        );
    }
}
