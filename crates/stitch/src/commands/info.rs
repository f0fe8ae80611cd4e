//! Tool information command.

/// Print name, version and license.
pub fn run() {
    println!(
        "{} {} ({} license)",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_LICENSE")
    );
}
