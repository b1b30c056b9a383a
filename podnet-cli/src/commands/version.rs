pub fn execute() {
    println!("podnet {}", env!("CARGO_PKG_VERSION"));
    println!("Edition: Rust 2024");
    println!();
    println!("Attachment options:");
    println!("  • Pod labels and annotations");
    println!("  • Port mappings");
    println!("  • Bandwidth limits");
    println!("  • DNS");
}
