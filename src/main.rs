fn main() {
    if let Err(e) = recovery_tracker_lib::run() {
        eprintln!("recovery-tracker: {e}");
        std::process::exit(1);
    }
}
