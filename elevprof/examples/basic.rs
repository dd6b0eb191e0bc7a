//! Basic example demonstrating elevprof library usage.
//!
//! Run with: cargo run --example basic -- /path/to/tiles [zoom]

use elevprof::{ElevationError, GeoPoint, ProfileService};
use std::env;

fn main() -> Result<(), ElevationError> {
    let mut args = env::args().skip(1);
    let tile_root = args.next().unwrap_or_else(|| {
        eprintln!("Usage: cargo run --example basic -- /path/to/tiles [zoom]");
        std::process::exit(1);
    });
    let zoom = args.next().and_then(|z| z.parse().ok()).unwrap_or(14);

    // Create service with up to 64 cached tiles
    let service = ProfileService::new(&tile_root, zoom, 64);
    service.check_tile_root()?;

    // Tokyo Tower to Tokyo Skytree
    let start = GeoPoint::new(139.7454, 35.6586);
    let end = GeoPoint::new(139.8107, 35.7101);
    let profile = service.build_profile(start, end, 20)?;

    println!(
        "Profile: {:.0} m, {} samples",
        profile.total_distance_m,
        profile.len()
    );
    println!("{:-<40}", "");
    for sample in profile.samples() {
        match sample.elevation_m {
            Some(e) => println!("{:>8.1} m  {:>7.1} m", sample.distance_m, e),
            None => println!("{:>8.1} m  no data", sample.distance_m),
        }
    }

    if let Some((lo, hi)) = profile.elevation_range() {
        println!("\nElevation range: {:.1} m to {:.1} m", lo, hi);
    }

    // Show cache statistics
    let stats = service.cache_stats();
    println!("\nCache statistics:");
    println!("  Cached tiles: {}", stats.entry_count);
    println!("  Hits: {}", stats.hit_count);
    println!("  Misses: {}", stats.miss_count);
    println!("  Hit rate: {:.1}%", stats.hit_rate() * 100.0);

    service.shutdown();
    Ok(())
}
