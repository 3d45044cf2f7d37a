use record_builder::RecordBuilder;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Default)]
struct SortedSet<T: Ord>(BTreeSet<T>);

impl<T: Ord> FromIterator<T> for SortedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        SortedSet(iter.into_iter().collect())
    }
}

impl<T: Ord> IntoIterator for SortedSet<T> {
    type Item = T;
    type IntoIter = std::collections::btree_set::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[derive(RecordBuilder, Debug)]
struct Catalog {
    #[record_builder(collection)]
    names: SortedSet<String>,
    #[record_builder(collection)]
    maybe_names: Option<SortedSet<String>>,
    lookup: HashMap<String, Option<u32>>,
}

fn main() {
    let builder = Catalog::builder()
        .add_names("b".to_string())
        .add_names("a".to_string())
        .put_lookup("k".to_string(), None);
    // The store behind an abstract set is a HashSet.
    let _: &std::collections::HashSet<String> = builder.get_names().unwrap();
    let _: Option<&std::collections::HashSet<String>> = builder.get_maybe_names();
    let catalog = builder.build().unwrap();
    assert!(catalog.maybe_names.is_none());
}
