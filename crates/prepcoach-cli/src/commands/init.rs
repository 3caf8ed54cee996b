//! The `prepcoach init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("prepcoach.toml").exists() {
        println!("prepcoach.toml already exists, skipping.");
    } else {
        std::fs::write("prepcoach.toml", SAMPLE_CONFIG)?;
        println!("Created prepcoach.toml");
    }

    std::fs::create_dir_all("catalogs")?;
    let example_path = Path::new("catalogs/example.toml");
    if example_path.exists() {
        println!("catalogs/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_CATALOG)?;
        println!("Created catalogs/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: prepcoach validate --catalog catalogs/example.toml");
    println!(
        "  2. Run: prepcoach score --catalog catalogs/example.toml --question closures --answer \"...\""
    );
    println!("  3. Run: prepcoach grade --catalog catalogs/example.toml --question reverse-string --reference");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# prepcoach configuration

output_dir = "./prepcoach-results"
parallelism = 4
# vocabulary = "vocab/custom.toml"

[runtime]
# node_binary = "${HOME}/.nvm/versions/node/v20.11.0/bin/node"
timeout_secs = 30
call_timeout_ms = 2000
"#;

const EXAMPLE_CATALOG: &str = r#"[catalog]
id = "example"
name = "Example Catalog"
description = "A small catalog to get started"

[[categories]]
id = "fundamentals"
name = "JavaScript Fundamentals"
kind = "concepts"

[[categories.questions]]
id = "closures"
question = "What is a closure in JavaScript?"
answer = """
A closure is a function that retains access to variables from its lexical scope, \
even when the function is executed outside that scope. The inner function keeps \
references to the outer function's variables, which enables data privacy and \
function factories."""
keywords = ["closure", "lexical", "scope", "function"]

[[categories]]
id = "coding"
name = "Coding Exercises"
kind = "coding"

[[categories.questions]]
id = "reverse-string"
question = "Write a function reverseString(s) that returns s reversed."
answer = "Split the string into characters, reverse the array, and join it back."
code = """
function reverseString(s) {
  return s.split('').reverse().join('');
}
"""
keywords = ["split", "reverse", "join"]

[categories.questions.exercise]
function_name = "reverseString"
starter_code = """
function reverseString(s) {
  // your code here
}
"""

[[categories.questions.exercise.test_cases]]
input = "\"hello\""
expected = "olleh"

[[categories.questions.exercise.test_cases]]
input = "\"racecar\""
expected = "racecar"
"#;
