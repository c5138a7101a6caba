fn main() {
    if let Err(e) = ocimcp::run_cli() {
        eprintln!("{e:?}");
        std::process::exit(1);
    }
}
