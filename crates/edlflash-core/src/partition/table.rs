//! Ordered partition table

use super::record::PartitionRecord;
use regex::Regex;
use serde::Serialize;

/// Ordered collection of partition rows.
///
/// Rows are unique by position only; several rows may share a name
/// (e.g. one "misc" per LUN). The table is only ever replaced as a whole;
/// per-row edits are limited to the selection flag and the image path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PartitionTable {
    records: Vec<PartitionRecord>,
    /// Bumped on every replacement so snapshots can be told apart
    generation: u64,
}

impl PartitionTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entire contents of the table
    pub fn load(&mut self, records: Vec<PartitionRecord>) {
        self.records = records;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Replace the contents with nothing
    pub fn clear(&mut self) {
        self.load(Vec::new());
    }

    /// Replacement counter
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate rows in table order
    pub fn iter(&self) -> std::slice::Iter<'_, PartitionRecord> {
        self.records.iter()
    }

    /// Row at `index`
    pub fn get(&self, index: usize) -> Option<&PartitionRecord> {
        self.records.get(index)
    }

    /// Rows with `selected == true`, in table order
    pub fn selected(&self) -> impl Iterator<Item = &PartitionRecord> {
        self.records.iter().filter(|r| r.selected)
    }

    /// Number of selected rows
    pub fn selected_count(&self) -> usize {
        self.selected().count()
    }

    /// First row whose name equals `name`
    pub fn find_by_name(&self, name: &str) -> Option<&PartitionRecord> {
        self.records.iter().find(|r| r.partition_name == name)
    }

    /// Set the selection flag of one row. Returns false if the index is out of range.
    pub fn set_selected(&mut self, index: usize, selected: bool) -> bool {
        match self.records.get_mut(index) {
            Some(record) => {
                record.selected = selected;
                true
            }
            None => false,
        }
    }

    /// Assign the image to flash into one row. Returns false if the index is out of range.
    pub fn set_image_path(&mut self, index: usize, path: impl Into<String>) -> bool {
        match self.records.get_mut(index) {
            Some(record) => {
                record.image_path = path.into();
                true
            }
            None => false,
        }
    }

    /// Select-all checkbox behavior: every row takes the negation of the
    /// first row's current state.
    pub fn toggle_all(&mut self) {
        let Some(first) = self.records.first() else {
            return;
        };
        let state = !first.selected;
        for record in &mut self.records {
            record.selected = state;
        }
    }

    /// Indices of the rows whose name matches `pattern` anywhere.
    ///
    /// An empty pattern matches every row.
    pub fn filter_by_name(&self, pattern: &str) -> Result<Vec<usize>, regex::Error> {
        let re = Regex::new(pattern)?;
        Ok(self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| re.is_match(&r.partition_name))
            .map(|(i, _)| i)
            .collect())
    }
}

impl<'a> IntoIterator for &'a PartitionTable {
    type Item = &'a PartitionRecord;
    type IntoIter = std::slice::Iter<'a, PartitionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::Lun;

    fn sample() -> PartitionTable {
        let mut table = PartitionTable::new();
        table.load(vec![
            PartitionRecord::new(0u32, "ssd", "8KB", "6", "2", "false"),
            PartitionRecord::new(0u32, "misc", "1024KB", "8", "256", "false").with_selected(true),
            PartitionRecord::new(4u32, "misc", "1024KB", "40", "256", "false"),
            PartitionRecord::new(4u32, "boot_a", "98304KB", "296", "24576", "true")
                .with_selected(true),
        ]);
        table
    }

    #[test]
    fn test_load_replaces_and_bumps_generation() {
        let mut table = sample();
        assert_eq!(table.generation(), 1);
        assert_eq!(table.len(), 4);

        table.load(vec![PartitionRecord::new(1u32, "xbl_a", "3584KB", "6", "896", "false")]);
        assert_eq!(table.generation(), 2);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0).unwrap().partition_name, "xbl_a");
    }

    #[test]
    fn test_selected_preserves_order() {
        let table = sample();
        let names: Vec<_> = table.selected().map(|r| r.partition_name.as_str()).collect();
        assert_eq!(names, vec!["misc", "boot_a"]);
        assert_eq!(table.selected_count(), 2);
    }

    #[test]
    fn test_find_by_name_first_match() {
        let table = sample();
        let misc = table.find_by_name("misc").unwrap();
        assert_eq!(misc.lun, Lun::from(0u32));
        assert!(table.find_by_name("recovery").is_none());
    }

    #[test]
    fn test_toggle_all_follows_first_row() {
        let mut table = sample();
        table.toggle_all();
        assert!(table.iter().all(|r| r.selected));
        table.toggle_all();
        assert!(table.iter().all(|r| !r.selected));

        let mut empty = PartitionTable::new();
        empty.toggle_all();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_row_edits() {
        let mut table = sample();
        assert!(table.set_image_path(3, "/tmp/boot.img"));
        assert!(table.set_selected(0, true));
        assert!(!table.set_selected(9, true));
        assert_eq!(table.get(3).unwrap().image_path, "/tmp/boot.img");
        assert_eq!(table.selected_count(), 3);
        // Row edits are not replacements
        assert_eq!(table.generation(), 1);
    }

    #[test]
    fn test_filter_by_name() {
        let table = sample();
        assert_eq!(table.filter_by_name("misc").unwrap(), vec![1, 2]);
        assert_eq!(table.filter_by_name("^b").unwrap(), vec![3]);
        assert_eq!(table.filter_by_name("").unwrap().len(), 4);
        assert!(table.filter_by_name("(").is_err());
    }
}
