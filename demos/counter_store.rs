//! # Example: counter_store
//!
//! A shared counter observed by two independent consumers.
//!
//! Demonstrates how to:
//! - Construct one process-wide [`Store`] and hand out handles.
//! - Bind consumers with [`KeyBinding`] (ensure + subscribe + mirror + drop).
//! - Write through one binding and watch every consumer re-render.
//! - Register a hand-rolled listener next to the bindings.
//!
//! ## Flow
//! ```text
//! Store::new()
//!     ├─► KeyBinding::attach (consumer A, default 0 → creates the entry)
//!     ├─► KeyBinding::attach (consumer B, default 42 → ignored, entry exists)
//!     ├─► store.subscribe (raw listener)
//!     └─► a.set(n) ──► fan-out in registration order: A, B, raw
//!
//! drop(b) ──► unsubscribes B; further writes skip it
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example counter_store
//! ```

use statevisor::{KeyBinding, Store};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. One store per value type, constructed by the application
    let store: Store<u64> = Store::new();

    // 2. Two bound consumers; each redraw callback is that consumer's "re-render"
    let a = KeyBinding::attach(&store, "count", 0, |v| {
        println!("[consumer-a] re-render: count={v}");
    })?;

    // The entry already exists, so this default loses to the first one
    let b = KeyBinding::attach(&store, "count", 42, |v| {
        println!("[consumer-b] re-render: count={v}");
    })?;
    println!("initial: a={} b={}", a.latest(), b.latest());

    // 3. A hand-rolled listener sees the same writes, after the bindings
    let raw_id = store.subscribe("count", |v| {
        println!("[raw-listener] count={v}");
    })?;

    // 4. Write through consumer A; everyone re-renders in registration order
    for n in 1..=3 {
        println!("--- a.set({n}) ---");
        a.set(n)?;
    }
    println!("after writes: a={} b={}", a.latest(), b.latest());

    // 5. Detach consumer B; further writes skip it
    drop(b);
    println!("--- after drop(b): a.set(10) ---");
    a.set(10)?;

    store.unsubscribe("count", &raw_id);
    Ok(())
}
