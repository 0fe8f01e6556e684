//! Explore a two-process compare-and-set counter and print every
//! interleaving.
//!
//! ```bash
//! cargo run --example cas_counter
//! RUST_LOG=debug cargo run --example cas_counter
//! ```

use std::io;

use tangle_core::init_logging;
use tangle_explore::prelude::*;

fn main() -> Result<(), ExploreError> {
    init_logging();

    let mut out = io::stdout();
    let report = trace_to(&mut out, || {
        let counter = Atomic::new(0);
        for _ in 0..2 {
            let c = counter.clone();
            spawn(async move {
                loop {
                    let seen = c.get().await;
                    if c.compare_and_set(seen, seen + 1).await {
                        break;
                    }
                }
            });
        }
        let c = counter.clone();
        finally(move || check(|| c.value() == 2));
    })?;

    println!("search complete: {}", report.completed);
    Ok(())
}
