use stress_test::{stress_test_autosave_burst, stress_test_history, stress_test_scaling};

fn main() {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };
    rt.block_on(async_main());
}

async fn async_main() {
    println!("\n\n╔════════════════════════════════════════════════════════════╗");
    println!("║            HISTORY STRESS TESTS                             ║");
    println!("╚════════════════════════════════════════════════════════════╝");

    // Test 1: few stores, short sequences
    let stats = stress_test_history(4, 200).await;
    stats.print();

    // Test 2: many stores, long sequences
    let stats = stress_test_history(16, 2000).await;
    stats.print();

    // Test 3: debounce under a burst of edits
    let writes = stress_test_autosave_burst(100, 50).await;
    println!("  Expected 1 write, observed {}", writes);

    // Test 4: scaling analysis
    println!("\n\n╔════════════════════════════════════════════════════════════╗");
    println!("║          SCALING ANALYSIS (Undo)                           ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    stress_test_scaling(500, 100).await;

    println!("\n✓ All stress tests completed!");
}
