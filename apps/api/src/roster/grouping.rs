use std::collections::HashMap;

use serde::Serialize;

/// All records sharing one recipient key, in the order they appeared in the upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group<T> {
    pub key: String,
    pub records: Vec<T>,
}

impl<T> Group<T> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Partitions records by key.
///
/// Groups come out in first-seen-key order and each group keeps its records in
/// input order. Equal keys always land in the same group no matter how far apart
/// they are in the input.
pub fn group_by_key<T>(records: Vec<T>, key_fn: impl Fn(&T) -> &str) -> Vec<Group<T>> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Group<T>> = Vec::new();

    for record in records {
        let key = key_fn(&record).to_string();
        match positions.get(&key) {
            Some(&idx) => groups[idx].records.push(record),
            None => {
                positions.insert(key.clone(), groups.len());
                groups.push(Group {
                    key,
                    records: vec![record],
                });
            }
        }
    }

    groups
}
