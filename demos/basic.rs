//! cargo run --example basic
use algex::{CompileLevel, Engine};

fn main() {
    env_logger::init();

    let mut engine = Engine::builder("[a-z]+@[a-z]+\\.[a-z]{2,3}")
        .level(CompileLevel::O2)
        .build()
        .expect("pattern should compile");

    println!("effective level: {:?}", engine.effective_level());
    for candidate in ["user@example.com", "not an email", "a@b.co"] {
        println!("{candidate:?} -> {}", engine.full_match(candidate.as_bytes()));
    }

    let mut intersected = Engine::builder("[0-9]+&.*5.*").build().unwrap();
    println!("{}", intersected.full_match(b"12345"));

    let mut complemented = Engine::builder("!abc").build().unwrap();
    println!("{}", complemented.full_match(b"abcd"));
}
