//! Append-only ledger of completed runs.

/// One completed run. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ExecutionRecord {
    /// 1-based sequence number.
    pub run_number: usize,
    /// Expansion level the run used.
    pub level: usize,
    /// Input values as supplied.
    pub inputs: Vec<i64>,
    /// Final value of `y`.
    pub output: i64,
    /// Total cycles consumed.
    pub cycles: u64,
}

/// In-memory run history.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct StatisticsLedger {
    records: Vec<ExecutionRecord>,
}

impl StatisticsLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Appends a record and returns a copy of it.
    pub fn append(
        &mut self,
        level: usize,
        inputs: &[i64],
        output: i64,
        cycles: u64,
    ) -> ExecutionRecord {
        let record = ExecutionRecord {
            run_number: self.records.len() + 1,
            level,
            inputs: inputs.to_vec(),
            output,
            cycles,
        };
        self.records.push(record.clone());
        record
    }

    /// Looks up a record by its 1-based run number.
    #[must_use]
    pub fn get(&self, run_number: usize) -> Option<&ExecutionRecord> {
        run_number
            .checked_sub(1)
            .and_then(|index| self.records.get(index))
    }

    /// All records, oldest first.
    #[must_use]
    pub fn records(&self) -> &[ExecutionRecord] {
        &self.records
    }

    /// Most recent record.
    #[must_use]
    pub fn last(&self) -> Option<&ExecutionRecord> {
        self.records.last()
    }

    /// Number of recorded runs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of cycles over every recorded run.
    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.records
            .iter()
            .fold(0_u64, |total, record| total.saturating_add(record.cycles))
    }
}

#[cfg(test)]
mod tests {
    use super::StatisticsLedger;

    #[test]
    fn run_numbers_are_sequential_from_one() {
        let mut ledger = StatisticsLedger::new();
        assert_eq!(ledger.append(0, &[1, 2], 3, 10).run_number, 1);
        let second = ledger.append(2, &[4], 4, 30);
        assert_eq!(second.run_number, 2);
        assert_eq!(ledger.last(), Some(&second));

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.get(0), None);
        assert_eq!(ledger.get(2).map(|record| record.level), Some(2));
        assert_eq!(ledger.get(3), None);
        assert_eq!(ledger.total_cycles(), 40);
        assert_eq!(ledger.last().map(|record| record.inputs.clone()), Some(vec![4]));
    }
}
