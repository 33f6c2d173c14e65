//! Primary-key descriptions consumed by a store.
//!
//! The serialization core guarantees its documents are ready to be keyed;
//! which fields form the key, and in what order, is declared here by the
//! integrating application and consumed by the store at schema sync time.

/// Sort direction of a clustering key column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending order.
    Ascending,
    /// Descending order.
    Descending,
}

/// Names the partition and clustering key columns of a run table.
#[derive(Debug, Clone, Copy)]
pub struct KeySpec {
    /// Partition key columns, in key order.
    pub partition: &'static [&'static str],
    /// Clustering key columns and their sort order, in key order.
    pub clustering: &'static [(&'static str, SortOrder)],
}

impl KeySpec {
    /// Iterate over every column the key names, partition first.
    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.partition
            .iter()
            .copied()
            .chain(self.clustering.iter().map(|(name, _)| *name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_lists_partition_then_clustering() {
        let spec = KeySpec {
            partition: &["id"],
            clustering: &[("timer", SortOrder::Descending)],
        };
        let columns: Vec<_> = spec.columns().collect();
        assert_eq!(columns, vec!["id", "timer"]);
    }
}
