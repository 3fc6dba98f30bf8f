fn main() {
    if let Err(e) = mediasync::runtime::run() {
        eprintln!("mediasync: {e}");
        std::process::exit(1);
    }
}
