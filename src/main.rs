fn main() {
    if let Err(err) = thermalprep::run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
