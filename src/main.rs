fn main() {
    if let Err(err) = tablemap::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
