use record_builder::RecordBuilder;
use std::collections::BTreeMap;
use std::fmt::Debug;

#[derive(RecordBuilder, Debug, Clone)]
pub struct Tagged<'a, T: Debug, const N: usize>
where
    T: Clone,
{
    label: &'a str,
    items: [T; N],
    index: BTreeMap<&'a str, Vec<T>>,
}

fn main() {
    let tagged: Tagged<'_, u8, 2> = Tagged::builder()
        .set_label("bytes")
        .set_items([1, 2])
        .put_index("ones", vec![1])
        .build()
        .unwrap();
    let _ = TaggedBuilder::from(tagged).has_label();
}
