fn main() {
    if let Err(err) = vizprep::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
