//! Example: wrapping operations with turboretry
//!
//! This example demonstrates:
//! 1. Retrying on a specific error kind
//! 2. Retrying on returned values with an exit condition
//! 3. Binding a retried method to different receivers
//!
//! Run with:
//! ```bash
//! RUST_LOG=turboretry=debug cargo run -p turboretry --example retry_example
//! ```

use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing_subscriber::EnvFilter;
use turboretry::prelude::*;

type DynError = Box<dyn Error + Send + Sync>;

#[derive(Debug)]
struct TransientError(u32);

impl fmt::Display for TransientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transient error on attempt {}", self.0)
    }
}

impl Error for TransientError {}

/// A simulated API that fails the first few times
struct UnreliableApi {
    name: &'static str,
    attempts: AtomicU32,
    fail_count: u32,
}

impl UnreliableApi {
    fn new(name: &'static str, fail_count: u32) -> Self {
        Self {
            name,
            attempts: AtomicU32::new(0),
            fail_count,
        }
    }

    fn call(&self, path: &str) -> Result<String, DynError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;

        if attempt <= self.fail_count {
            println!("  [{}] attempt {attempt}: FAILED", self.name);
            Err(Box::new(TransientError(attempt)))
        } else {
            println!("  [{}] attempt {attempt}: SUCCESS", self.name);
            Ok(format!("{} {path} -> 200", self.name))
        }
    }

    fn total_attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

/// Example 1: retry a transient error kind
fn example_error_kind() -> Result<(), DynError> {
    println!("\n=== Example 1: Retry on Error Kind ===\n");

    let api = UnreliableApi::new("inventory", 2);
    let fetch = retry()
        .budget(3)
        .retry_on(Condition::error::<TransientError>())
        .wrap(|path: &str| api.call(path))?;

    let body = fetch.call(("/items",))?;
    println!("\nResult: {body}");
    println!("Total attempts: {}", api.total_attempts());

    Ok(())
}

/// Example 2: poll until a value is ready, bail out on a sentinel
fn example_value_predicate() -> Result<(), DynError> {
    println!("\n=== Example 2: Retry on Value, Exit on Sentinel ===\n");

    let polls = AtomicU32::new(0);
    let statuses = ["pending", "pending", "cancelled", "done"];

    let status = retry::<&'static str, DynError>()
        .budget(10)
        .retry_on(Condition::value(|s: &&str| *s == "pending"))
        .exit_on(Condition::value(|s: &&str| *s == "cancelled"))
        .on_finish(|outcome| match outcome {
            Outcome::Value(s) => println!("  finished with status {s}"),
            Outcome::Error(e) => println!("  finished with error {e}"),
        })
        .wrap(|| {
            let n = polls.fetch_add(1, Ordering::SeqCst) as usize;
            Ok(statuses[n.min(statuses.len() - 1)])
        })?;

    let final_status = status.call(())?;
    println!("\nFinal status: {final_status} after {} polls", polls.load(Ordering::SeqCst));

    Ok(())
}

/// Example 3: one retried method, many receivers
fn example_method_binding() -> Result<(), DynError> {
    println!("\n=== Example 3: Method Binding ===\n");

    let call = retry()
        .budget(2)
        .retry_on(Condition::error::<TransientError>())
        .wrap_named("UnreliableApi::call", UnreliableApi::call)?;

    let billing = UnreliableApi::new("billing", 1);
    let search = UnreliableApi::new("search", 0);

    println!("{}", call.bind(&billing).call(("/invoices",))?);
    println!("{}", call.bind(&search).call(("/query",))?);

    Ok(())
}

fn main() -> Result<(), DynError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("==============================================");
    println!("   TurboRetry: Retry Controller Examples");
    println!("==============================================");

    example_error_kind()?;
    example_value_predicate()?;
    example_method_binding()?;

    println!("\n==============================================");
    println!("   All examples completed successfully!");
    println!("==============================================\n");

    Ok(())
}
