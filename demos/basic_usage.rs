use record_builder::RecordBuilder;

#[derive(RecordBuilder, Debug, Clone, PartialEq)]
struct Profile {
    username: String,
    email: String,
    age: u32,
    bio: Option<String>,
}

fn main() {
    println!("=== Basic Usage Example ===\n");

    // Build a profile with the required fields
    let profile = Profile::builder()
        .set_username("alice".to_string())
        .set_email("alice@example.com".to_string())
        .set_age(30)
        .build()
        .expect("Failed to build profile");

    println!("Created profile: {:?}", profile);

    // Inspect a builder before building
    let builder = Profile::builder().set_username("bob".to_string());
    println!("\nhas_username: {}", builder.has_username());
    println!("has_age: {} (age reads as {})", builder.has_age(), builder.get_age());
    match builder.get_email() {
        Ok(email) => println!("email: {}", email),
        Err(e) => println!("email: {}", e),
    }

    // Missing required fields fail at build time
    match builder.build() {
        Ok(_) => println!("\nUnexpectedly succeeded!"),
        Err(e) => println!("\nExpected error when missing fields: {}", e),
    }

    // Edit an existing value
    let edited = ProfileBuilder::from(profile.clone())
        .set_bio(Some("Rust enthusiast".to_string()))
        .clear_age()
        .build()
        .expect("Failed to rebuild profile");

    println!("\nEdited profile: {:?}", edited);
    assert_ne!(edited, profile);
}
