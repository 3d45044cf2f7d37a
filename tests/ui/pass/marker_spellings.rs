use record_builder::RecordBuilder;

#[derive(RecordBuilder)]
struct Spellings {
    plain: Option<String>,
    module: std::option::Option<String>,
    rooted: ::core::option::Option<u8>,
    prelude: std::prelude::v1::Option<String>,
    nested: Vec<core::option::Option<String>>,
}

fn main() {
    let builder = Spellings::builder()
        .set_plain(None)
        .set_module(std::option::Option::Some("m".to_string()))
        .set_rooted(Some(1))
        .set_prelude(None)
        .add_nested(core::option::Option::None);

    let _: std::option::Option<&String> = builder.get_module();
    let _: ::core::option::Option<u8> = builder.get_rooted();
    let _: &Vec<Option<String>> = builder.get_nested().unwrap();
    let _ = builder.build();
}
