use colored::Colorize;

pub fn run() {
    println!(
        "{} {}",
        env!("CARGO_PKG_NAME").bold(),
        env!("CARGO_PKG_VERSION").green()
    );
    println!("{}", env!("CARGO_PKG_DESCRIPTION").dimmed());
    println!("{}", env!("CARGO_PKG_REPOSITORY").cyan());
}
