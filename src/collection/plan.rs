use super::state::CollectionState;

/// Keys a sync would delete from the destination and copy from the source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Destination keys missing from the source, in destination view order.
    pub to_delete: Vec<String>,
    /// Source keys missing from the destination, in source view order.
    pub to_copy: Vec<String>,
}

impl SyncPlan {
    /// Hash-set difference in both directions.
    pub fn between(dest: &CollectionState, source: &CollectionState) -> Self {
        let to_delete = dest
            .keys()
            .filter(|k| !source.contains(k))
            .map(str::to_string)
            .collect();
        let to_copy = source
            .keys()
            .filter(|k| !dest.contains(k))
            .map(str::to_string)
            .collect();
        Self { to_delete, to_copy }
    }

    pub fn len(&self) -> usize {
        self.to_delete.len() + self.to_copy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
