use indexmap::IndexMap;

use crate::domain::Record;

/// Records partitioned by a string key. Keys keep first-seen order and each
/// group keeps input order.
#[derive(Debug, Clone, Default)]
pub struct Grouping<'a> {
    groups: IndexMap<String, Vec<&'a Record>>,
}

impl<'a> Grouping<'a> {
    pub fn build<I, F>(records: I, mut key: F) -> Self
    where
        I: IntoIterator<Item = &'a Record>,
        F: FnMut(&'a Record) -> Option<&'a str>,
    {
        let mut groups: IndexMap<String, Vec<&'a Record>> = IndexMap::new();
        for record in records {
            if let Some(key) = key(record) {
                groups.entry(key.to_string()).or_default().push(record);
            }
        }
        Self { groups }
    }

    pub fn get(&self, key: &str) -> &[&'a Record] {
        self.groups.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[&'a Record])> {
        self.groups
            .iter()
            .map(|(key, records)| (key.as_str(), records.as_slice()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

pub fn group_by_generation<'a, I>(records: I) -> Grouping<'a>
where
    I: IntoIterator<Item = &'a Record>,
{
    Grouping::build(records, |record| Some(record.generation_key()))
}

pub fn group_by_body<'a, I>(records: I) -> Grouping<'a>
where
    I: IntoIterator<Item = &'a Record>,
{
    Grouping::build(records, |record| Some(record.body.as_str()))
}

/// Direct children keyed by their `parentID`. Founders are left out.
pub fn group_by_parent<'a, I>(records: I) -> Grouping<'a>
where
    I: IntoIterator<Item = &'a Record>,
{
    Grouping::build(records, Record::parent_key)
}

/// The three lookups the analyzer runs its queries against.
#[derive(Debug, Clone)]
pub struct RelationshipIndex<'a> {
    pub by_generation: Grouping<'a>,
    pub by_body: Grouping<'a>,
    pub children: Grouping<'a>,
}

impl<'a> RelationshipIndex<'a> {
    pub fn build(records: &'a [Record]) -> Self {
        Self {
            by_generation: group_by_generation(records),
            by_body: group_by_body(records),
            children: group_by_parent(records),
        }
    }

    pub fn children_of(&self, token_id: u64) -> &[&'a Record] {
        self.children.get(&token_id.to_string())
    }

    pub fn generation(&self, generation: &str) -> &[&'a Record] {
        self.by_generation.get(generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(token_id: u64, generation: &str, body: &str, parent: Option<&str>) -> Record {
        let mut record = Record::bare(token_id);
        record.generation = Some(generation.to_string());
        record.body = body.to_string();
        record.parent_id = parent.map(str::to_string);
        record
    }

    #[test]
    fn groups_keep_first_seen_and_input_order() {
        let records = vec![
            record(0, "2", "Goo", None),
            record(1, "1", "Slime", None),
            record(2, "2", "Slime", Some("0")),
            record(3, "1", "Goo", Some("0")),
        ];
        let index = RelationshipIndex::build(&records);

        assert_eq!(index.by_generation.keys().collect::<Vec<_>>(), vec!["2", "1"]);
        let gen_two: Vec<u64> = index.generation("2").iter().map(|r| r.token_id).collect();
        assert_eq!(gen_two, vec![0, 2]);
        assert_eq!(index.by_body.keys().collect::<Vec<_>>(), vec!["Goo", "Slime"]);

        let children: Vec<u64> = index.children_of(0).iter().map(|r| r.token_id).collect();
        assert_eq!(children, vec![2, 3]);
    }

    #[test]
    fn founders_have_no_parent_entry() {
        let records = vec![record(0, "1", "Goo", None), record(1, "1", "Goo", Some(""))];
        let index = RelationshipIndex::build(&records);
        assert!(index.children.is_empty());
        assert!(index.children_of(0).is_empty());
        assert!(index.generation("9").is_empty());
    }

    #[test]
    fn interleaved_keys_collect_into_one_group() {
        let records = vec![
            record(0, "3", "Goo", None),
            record(1, "1", "Goo", None),
            record(2, "3", "Goo", None),
            record(3, "2", "Goo", None),
            record(4, "1", "Goo", None),
        ];
        let grouping = group_by_generation(&records);

        assert_eq!(grouping.len(), 3);
        let shape: Vec<(&str, Vec<u64>)> = grouping
            .iter()
            .map(|(key, members)| (key, members.iter().map(|r| r.token_id).collect()))
            .collect();
        assert_eq!(
            shape,
            vec![("3", vec![0, 2]), ("1", vec![1, 4]), ("2", vec![3])]
        );
    }
}
